//! Helpers for generating synthetic windfield stores.
//!
//! Used by the test suites across the workspace to stand up realization
//! ensembles without running a windfield model.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use hazard_common::BoundingBox;

use crate::error::{StoreError, StoreResult};

/// Write a windfield realization store with the given data.
///
/// `data` is row-major with shape `(height, width)`; row 0 is the
/// southernmost row.
pub fn write_windfield(
    path: &Path,
    data: &[f32],
    width: usize,
    height: usize,
    bbox: &BoundingBox,
) -> StoreResult<()> {
    std::fs::create_dir_all(path)?;
    let store = Arc::new(
        FilesystemStore::new(path)
            .map_err(|e| StoreError::open_failed(format!("{}: {}", path.display(), e)))?,
    );

    let mut attrs = serde_json::Map::new();
    attrs.insert("parameter".to_string(), json!("vmax"));
    attrs.insert("units".to_string(), json!("m/s"));
    attrs.insert(
        "bbox".to_string(),
        json!([bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y]),
    );

    let chunk_grid: zarrs::array::ChunkGrid = vec![height as u64, width as u64]
        .try_into()
        .map_err(|e| StoreError::invalid_metadata(format!("{:?}", e)))?;

    let mut binding = ArrayBuilder::new(
        vec![height as u64, width as u64],
        DataType::Float32,
        chunk_grid,
        FillValue::from(f32::NAN),
    );
    let builder = binding.attributes(attrs);
    let array = builder
        .build(store, "/")
        .map_err(|e| StoreError::storage_error(e.to_string()))?;

    array
        .store_metadata()
        .map_err(|e| StoreError::storage_error(e.to_string()))?;

    let subset = ArraySubset::new_with_start_shape(
        vec![0, 0],
        vec![height as u64, width as u64],
    )
    .map_err(|e| StoreError::storage_error(e.to_string()))?;
    array
        .store_array_subset_elements(&subset, data)
        .map_err(|e| StoreError::storage_error(e.to_string()))?;

    Ok(())
}

/// Write an ensemble of constant-valued realizations named
/// `wf.NNNN.zarr`, one value per realization.
pub fn write_constant_ensemble(
    dir: &Path,
    values: &[f32],
    width: usize,
    height: usize,
    bbox: &BoundingBox,
) -> StoreResult<()> {
    for (n, &v) in values.iter().enumerate() {
        let data = vec![v; width * height];
        let path = dir.join(format!("wf.{:04}.zarr", n));
        write_windfield(&path, &data, width, height, bbox)?;
    }
    Ok(())
}
