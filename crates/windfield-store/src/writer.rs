//! Incremental writer for the hazard output store.
//!
//! The store is a single Zarr hierarchy holding the return-period wind
//! speed field, its optional confidence-bound fields, and the three GEV
//! parameter fields. Results arrive tile by tile; each tile write lands
//! in a disjoint sub-region of the output arrays, so no cell is written
//! twice and writes need no coordination.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tracing::debug;
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use hazard_common::BoundingBox;

use crate::error::{StoreError, StoreResult};

/// Final `[min, max]` ranges over valid (non-sentinel) cells, one per
/// output field. `None` means the field never received a valid value
/// and gets no `actual_range` attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldRanges {
    pub wspd: Option<[f32; 2]>,
    pub wspd_upper: Option<[f32; 2]>,
    pub wspd_lower: Option<[f32; 2]>,
    pub loc: Option<[f32; 2]>,
    pub scale: Option<[f32; 2]>,
    pub shp: Option<[f32; 2]>,
}

/// The persistent hazard output store.
pub struct HazardStore {
    wspd: Array<FilesystemStore>,
    wspd_upper: Option<Array<FilesystemStore>>,
    wspd_lower: Option<Array<FilesystemStore>>,
    loc: Array<FilesystemStore>,
    scale: Array<FilesystemStore>,
    shp: Array<FilesystemStore>,
    num_periods: usize,
}

impl HazardStore {
    /// Create a hazard store at `root`, with every cell initialized to
    /// the `nodata` fill value.
    ///
    /// # Arguments
    /// * `root` - directory for the Zarr hierarchy (created if absent)
    /// * `bbox` - geographic extent of the output grid
    /// * `ny`, `nx` - output grid dimensions
    /// * `return_periods` - recurrence intervals, in years, for the 3-D fields
    /// * `nodata` - missing-data sentinel, also the fill value
    /// * `with_bounds` - create the confidence-bound fields
    /// * `chunk_rows`, `chunk_cols` - chunk layout; matching the tile
    ///   step keeps tile writes aligned with whole chunks
    pub fn create(
        root: &Path,
        bbox: &BoundingBox,
        ny: usize,
        nx: usize,
        return_periods: &[f64],
        nodata: f32,
        with_bounds: bool,
        chunk_rows: usize,
        chunk_cols: usize,
    ) -> StoreResult<Self> {
        std::fs::create_dir_all(root)?;
        let store = Arc::new(
            FilesystemStore::new(root)
                .map_err(|e| StoreError::open_failed(format!("{}: {}", root.display(), e)))?,
        );

        let num_periods = return_periods.len();
        let shape_3d = vec![num_periods as u64, ny as u64, nx as u64];
        let shape_2d = vec![ny as u64, nx as u64];
        let chunks_3d = vec![num_periods as u64, chunk_rows as u64, chunk_cols as u64];
        let chunks_2d = vec![chunk_rows as u64, chunk_cols as u64];

        let speed_attrs = |long_name: &str| {
            let mut attrs = base_attrs(long_name, "m/s", nodata, bbox);
            attrs.insert("return_periods".to_string(), json!(return_periods));
            attrs
        };

        let wspd = build_field(
            &store,
            "/wspd",
            shape_3d.clone(),
            chunks_3d.clone(),
            nodata,
            speed_attrs("Return period wind speed"),
        )?;

        let (wspd_upper, wspd_lower) = if with_bounds {
            (
                Some(build_field(
                    &store,
                    "/wspd_upper",
                    shape_3d.clone(),
                    chunks_3d.clone(),
                    nodata,
                    speed_attrs("95th percentile return period wind speed"),
                )?),
                Some(build_field(
                    &store,
                    "/wspd_lower",
                    shape_3d,
                    chunks_3d,
                    nodata,
                    speed_attrs("5th percentile return period wind speed"),
                )?),
            )
        } else {
            (None, None)
        };

        let loc = build_field(
            &store,
            "/loc",
            shape_2d.clone(),
            chunks_2d.clone(),
            nodata,
            base_attrs("Location parameter for GEV distribution", "m/s", nodata, bbox),
        )?;
        let scale = build_field(
            &store,
            "/scale",
            shape_2d.clone(),
            chunks_2d.clone(),
            nodata,
            base_attrs("Scale parameter for GEV distribution", "", nodata, bbox),
        )?;
        let shp = build_field(
            &store,
            "/shp",
            shape_2d,
            chunks_2d,
            nodata,
            base_attrs("Shape parameter for GEV distribution", "", nodata, bbox),
        )?;

        debug!(root = %root.display(), ny, nx, with_bounds, "created hazard store");
        Ok(Self {
            wspd,
            wspd_upper,
            wspd_lower,
            loc,
            scale,
            shp,
            num_periods,
        })
    }

    /// Whether the store carries confidence-bound fields.
    pub fn has_bounds(&self) -> bool {
        self.wspd_upper.is_some()
    }

    /// Write one tile of return-period wind speeds.
    ///
    /// `data` has shape `(num_periods, height, width)` in row-major order.
    pub fn write_speeds(
        &self,
        row0: usize,
        col0: usize,
        height: usize,
        width: usize,
        data: &[f32],
    ) -> StoreResult<()> {
        let subset = subset_3d(self.num_periods, row0, col0, height, width)?;
        store_elements(&self.wspd, &subset, data)
    }

    /// Write one tile of upper/lower confidence bounds.
    ///
    /// Both slices have shape `(num_periods, height, width)`.
    pub fn write_bounds(
        &self,
        row0: usize,
        col0: usize,
        height: usize,
        width: usize,
        upper: &[f32],
        lower: &[f32],
    ) -> StoreResult<()> {
        let (Some(upper_arr), Some(lower_arr)) = (&self.wspd_upper, &self.wspd_lower) else {
            return Err(StoreError::write_failed(
                "store was created without confidence bound fields",
            ));
        };
        let subset = subset_3d(self.num_periods, row0, col0, height, width)?;
        store_elements(upper_arr, &subset, upper)?;
        store_elements(lower_arr, &subset, lower)
    }

    /// Write one tile of the three GEV parameter fields.
    ///
    /// Each slice has shape `(height, width)`.
    pub fn write_params(
        &self,
        row0: usize,
        col0: usize,
        height: usize,
        width: usize,
        loc: &[f32],
        scale: &[f32],
        shp: &[f32],
    ) -> StoreResult<()> {
        let subset = subset_2d(row0, col0, height, width)?;
        store_elements(&self.loc, &subset, loc)?;
        store_elements(&self.scale, &subset, scale)?;
        store_elements(&self.shp, &subset, shp)
    }

    /// Record the `actual_range` attribute on every field that received
    /// valid data and flush metadata. Call exactly once, after the last
    /// tile has been written.
    pub fn finalize(&mut self, ranges: &FieldRanges) -> StoreResult<()> {
        set_actual_range(&mut self.wspd, ranges.wspd)?;
        if let Some(arr) = self.wspd_upper.as_mut() {
            set_actual_range(arr, ranges.wspd_upper)?;
        }
        if let Some(arr) = self.wspd_lower.as_mut() {
            set_actual_range(arr, ranges.wspd_lower)?;
        }
        set_actual_range(&mut self.loc, ranges.loc)?;
        set_actual_range(&mut self.scale, ranges.scale)?;
        set_actual_range(&mut self.shp, ranges.shp)
    }
}

fn base_attrs(
    long_name: &str,
    units: &str,
    nodata: f32,
    bbox: &BoundingBox,
) -> serde_json::Map<String, serde_json::Value> {
    let mut attrs = serde_json::Map::new();
    attrs.insert("long_name".to_string(), json!(long_name));
    attrs.insert("units".to_string(), json!(units));
    attrs.insert("nodata".to_string(), json!(nodata));
    attrs.insert(
        "bbox".to_string(),
        json!([bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y]),
    );
    attrs
}

fn build_field(
    store: &Arc<FilesystemStore>,
    path: &str,
    shape: Vec<u64>,
    chunks: Vec<u64>,
    nodata: f32,
    attrs: serde_json::Map<String, serde_json::Value>,
) -> StoreResult<Array<FilesystemStore>> {
    let chunk_grid: zarrs::array::ChunkGrid = chunks
        .try_into()
        .map_err(|e| StoreError::invalid_metadata(format!("{:?}", e)))?;

    let mut binding = ArrayBuilder::new(
        shape,
        DataType::Float32,
        chunk_grid,
        FillValue::from(nodata),
    );
    let builder = binding.attributes(attrs);
    let array = builder
        .build(store.clone(), path)
        .map_err(|e| StoreError::storage_error(e.to_string()))?;

    array
        .store_metadata()
        .map_err(|e| StoreError::storage_error(e.to_string()))?;
    Ok(array)
}

fn subset_3d(
    num_periods: usize,
    row0: usize,
    col0: usize,
    height: usize,
    width: usize,
) -> StoreResult<ArraySubset> {
    ArraySubset::new_with_start_shape(
        vec![0, row0 as u64, col0 as u64],
        vec![num_periods as u64, height as u64, width as u64],
    )
    .map_err(|e| StoreError::write_failed(e.to_string()))
}

fn subset_2d(row0: usize, col0: usize, height: usize, width: usize) -> StoreResult<ArraySubset> {
    ArraySubset::new_with_start_shape(
        vec![row0 as u64, col0 as u64],
        vec![height as u64, width as u64],
    )
    .map_err(|e| StoreError::write_failed(e.to_string()))
}

fn store_elements(
    array: &Array<FilesystemStore>,
    subset: &ArraySubset,
    data: &[f32],
) -> StoreResult<()> {
    array
        .store_array_subset_elements(subset, data)
        .map_err(|e| StoreError::write_failed(e.to_string()))
}

fn set_actual_range(
    array: &mut Array<FilesystemStore>,
    range: Option<[f32; 2]>,
) -> StoreResult<()> {
    let Some(range) = range else {
        return Ok(());
    };
    array
        .attributes_mut()
        .insert("actual_range".to_string(), json!(range));
    array
        .store_metadata()
        .map_err(|e| StoreError::storage_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODATA: f32 = -9999.0;

    fn open_field(root: &Path, name: &str) -> Array<FilesystemStore> {
        let store = Arc::new(FilesystemStore::new(root).expect("Failed to open store"));
        Array::open(store, name).expect("Failed to open array")
    }

    fn read_all(array: &Array<FilesystemStore>) -> Vec<f32> {
        let shape = array.shape().to_vec();
        let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape)
            .expect("Failed to build subset");
        array
            .retrieve_array_subset_elements(&subset)
            .expect("Failed to read array")
    }

    #[test]
    fn test_create_write_finalize_roundtrip() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path().join("hazard.zarr");
        let bbox = BoundingBox::new(150.0, -25.0, 153.0, -22.0);

        let mut store = HazardStore::create(
            &root,
            &bbox,
            4,
            4,
            &[50.0, 100.0],
            NODATA,
            false,
            2,
            2,
        )
        .expect("Failed to create store");
        assert!(!store.has_bounds());

        // Write a 2x2 tile at (row 2, col 0).
        let speeds = vec![40.0, 41.0, 42.0, 43.0, 50.0, 51.0, 52.0, 53.0];
        store
            .write_speeds(2, 0, 2, 2, &speeds)
            .expect("Failed to write speeds");
        store
            .write_params(2, 0, 2, 2, &[30.0; 4], &[5.0; 4], &[0.1; 4])
            .expect("Failed to write params");

        let ranges = FieldRanges {
            wspd: Some([40.0, 53.0]),
            loc: Some([30.0, 30.0]),
            scale: Some([5.0, 5.0]),
            shp: Some([0.1, 0.1]),
            ..Default::default()
        };
        store.finalize(&ranges).expect("Failed to finalize");

        let wspd = open_field(&root, "/wspd");
        let data = read_all(&wspd);
        assert_eq!(data.len(), 2 * 4 * 4);
        // Written cells carry the tile values; everything else is fill.
        assert_eq!(data[2 * 4], 40.0); // period 0, row 2, col 0
        assert_eq!(data[0], NODATA); // period 0, row 0, col 0
        assert_eq!(data[16 + 3 * 4 + 1], 53.0); // period 1, row 3, col 1

        let attrs = wspd.attributes();
        assert_eq!(attrs.get("units").and_then(|v| v.as_str()), Some("m/s"));
        let range: Vec<f64> = attrs
            .get("actual_range")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_f64()).collect())
            .expect("missing actual_range");
        assert_eq!(range, vec![40.0, 53.0]);
    }

    #[test]
    fn test_bounds_require_ci_store() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path().join("hazard.zarr");
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);

        let store = HazardStore::create(&root, &bbox, 2, 2, &[100.0], NODATA, false, 2, 2)
            .expect("Failed to create store");

        let err = store
            .write_bounds(0, 0, 2, 2, &[0.0; 4], &[0.0; 4])
            .unwrap_err();
        assert!(matches!(err, StoreError::WriteFailed(_)));
    }

    #[test]
    fn test_bounds_written_when_enabled() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path().join("hazard.zarr");
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);

        let store = HazardStore::create(&root, &bbox, 2, 2, &[100.0], NODATA, true, 2, 2)
            .expect("Failed to create store");
        assert!(store.has_bounds());

        store
            .write_bounds(0, 0, 2, 2, &[60.0; 4], &[45.0; 4])
            .expect("Failed to write bounds");

        let upper = read_all(&open_field(&root, "/wspd_upper"));
        let lower = read_all(&open_field(&root, "/wspd_lower"));
        assert!(upper.iter().all(|&v| v == 60.0));
        assert!(lower.iter().all(|&v| v == 45.0));
    }
}
