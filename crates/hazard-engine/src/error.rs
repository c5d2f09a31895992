//! Error types for the hazard engine.
//!
//! Every variant here is fatal for the whole run: a hazard grid built
//! from a short or unreadable ensemble is invalid output, not a partial
//! result. Per-cell degeneracy is not an error and never reaches this
//! type; it is recorded as the missing-data sentinel and computation
//! continues.

use thiserror::Error;

use windfield_store::StoreError;

/// Fatal errors raised during setup or the tile loop.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The input directory holds no realization stores at all.
    #[error("no realization sources found in {0}")]
    NoSources(String),

    /// Fewer valid realization sources than the configured ensemble size.
    #[error("ensemble under-count: {found} valid realization sources, need {required}")]
    EnsembleUnderCount { found: usize, required: usize },

    /// The configured grid limit shares no grid points with the
    /// realization grid.
    #[error("configured grid limit does not overlap the realization grid")]
    NoOverlap,

    /// A realization's grid does not match the first realization's.
    #[error("realization {path} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        path: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// A windowed read from a realization failed mid-run.
    #[error("failed to read realization {path}: {source}")]
    SourceRead {
        path: String,
        #[source]
        source: StoreError,
    },

    /// The hazard output store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid configuration detected before any tile was processed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
