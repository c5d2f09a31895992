//! Zarr-backed storage for the wind-hazard workspace.
//!
//! Two concerns live here: windowed reads from windfield realization
//! stores (the input ensemble) and incremental windowed writes of the
//! hazard output store. Both sides use Zarr V3 on the local filesystem,
//! so per-tile access touches only the chunks that intersect the tile.

pub mod error;
pub mod source;
pub mod testdata;
pub mod writer;

pub use error::{StoreError, StoreResult};
pub use source::{discover_sources, WindfieldSource};
pub use writer::{FieldRanges, HazardStore};
