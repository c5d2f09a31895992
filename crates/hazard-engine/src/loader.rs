//! Ensemble loading: windowed reads across all realizations for one tile.

use std::path::Path;

use tracing::{debug, warn};

use hazard_common::{GridWindow, Tile};
use windfield_store::{discover_sources, WindfieldSource};

use crate::error::{EngineError, EngineResult};

/// The ensemble for one tile: `nsim` stacked sub-windows of shape
/// `(height, width)`.
///
/// Holds `nsim * height * width` values regardless of the full domain
/// size; the tile dimensions alone bound the working set.
pub struct EnsembleBlock {
    nsim: usize,
    height: usize,
    width: usize,
    /// Row-major `[nsim, height, width]`.
    data: Vec<f32>,
}

impl EnsembleBlock {
    pub(crate) fn new(nsim: usize, height: usize, width: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), nsim * height * width);
        Self {
            nsim,
            height,
            width,
            data,
        }
    }

    /// Number of realizations stacked in this block.
    pub fn nsim(&self) -> usize {
        self.nsim
    }

    /// Tile height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Tile width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Total number of stored values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the block holds no values.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// One cell's ensemble sample, in realization order.
    pub fn cell_sample(&self, row: usize, col: usize) -> Vec<f32> {
        let stride = self.height * self.width;
        let offset = row * self.width + col;
        (0..self.nsim)
            .map(|n| self.data[n * stride + offset])
            .collect()
    }

    /// Maximum value of one cell's ensemble sample.
    pub fn cell_max(&self, row: usize, col: usize) -> f32 {
        let stride = self.height * self.width;
        let offset = row * self.width + col;
        (0..self.nsim)
            .map(|n| self.data[n * stride + offset])
            .fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Loads per-tile ensembles from an ordered set of realization sources.
#[derive(Debug)]
pub struct EnsembleLoader {
    sources: Vec<WindfieldSource>,
    window: GridWindow,
}

impl EnsembleLoader {
    /// Discover and open `nsim` realization sources under `input_dir`.
    ///
    /// Sources that fail to open are logged and skipped; if fewer than
    /// `nsim` remain the whole run is aborted, since a hazard grid
    /// computed from a short ensemble is invalid output rather than a
    /// degraded one. A source whose grid shape differs from the first
    /// source's is a hard error in its own right.
    ///
    /// `window` is the domain's index window into the source grids;
    /// every tile read is offset by it.
    pub fn discover(input_dir: &Path, nsim: usize, window: GridWindow) -> EngineResult<Self> {
        let paths = discover_sources(input_dir)?;
        if paths.is_empty() {
            return Err(EngineError::NoSources(input_dir.display().to_string()));
        }

        let mut sources: Vec<WindfieldSource> = Vec::with_capacity(nsim);
        let mut expected_shape = None;
        for path in &paths {
            if sources.len() == nsim {
                break;
            }
            let source = match WindfieldSource::open(path) {
                Ok(s) => s,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable realization");
                    continue;
                }
            };
            let expected = *expected_shape.get_or_insert_with(|| source.shape());
            if source.shape() != expected {
                return Err(EngineError::ShapeMismatch {
                    path: path.display().to_string(),
                    expected,
                    found: source.shape(),
                });
            }
            sources.push(source);
        }

        if sources.len() < nsim {
            warn!(
                found = sources.len(),
                required = nsim,
                "not enough valid realization sources, aborting"
            );
            return Err(EngineError::EnsembleUnderCount {
                found: sources.len(),
                required: nsim,
            });
        }

        debug!(nsim, dir = %input_dir.display(), "opened realization ensemble");
        Ok(Self { sources, window })
    }

    /// Number of realizations in the ensemble.
    pub fn nsim(&self) -> usize {
        self.sources.len()
    }

    /// Load the ensemble for one tile.
    ///
    /// Reads only the tile's sub-window from each realization; any read
    /// failure is fatal for the run.
    pub fn load_tile(&self, tile: &Tile) -> EngineResult<EnsembleBlock> {
        let height = tile.height();
        let width = tile.width();
        let row0 = self.window.jmin + tile.y1;
        let col0 = self.window.imin + tile.x1;

        let mut data = Vec::with_capacity(self.sources.len() * height * width);
        for source in &self.sources {
            let window =
                source
                    .read_window(row0, col0, height, width)
                    .map_err(|e| EngineError::SourceRead {
                        path: source.path().display().to_string(),
                        source: e,
                    })?;
            data.extend_from_slice(&window);
        }

        Ok(EnsembleBlock::new(self.sources.len(), height, width, data))
    }
}
