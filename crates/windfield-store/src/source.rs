//! Windowed reads from windfield realization stores.
//!
//! Each realization is a 2-D Zarr array of maximum wind speeds with a
//! `bbox` attribute describing its geographic extent. Row 0 is the
//! southernmost row; latitudes and longitudes ascend with index.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use zarrs::array::Array;
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use hazard_common::{BoundingBox, DomainGrid};

use crate::error::{StoreError, StoreResult};

/// One windfield realization opened for windowed reads.
#[derive(Debug)]
pub struct WindfieldSource {
    array: Array<FilesystemStore>,
    path: PathBuf,
    bbox: BoundingBox,
    /// Grid dimensions as (rows, cols).
    shape: (usize, usize),
}

impl WindfieldSource {
    /// Open a realization store from a `.zarr` directory.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let store = FilesystemStore::new(path)
            .map_err(|e| StoreError::open_failed(format!("{}: {}", path.display(), e)))?;
        let array = Array::open(Arc::new(store), "/")
            .map_err(|e| StoreError::open_failed(format!("{}: {}", path.display(), e)))?;

        let shape = array.shape();
        if shape.len() != 2 {
            return Err(StoreError::invalid_metadata(format!(
                "{}: expected a 2-D windfield, found {} dimensions",
                path.display(),
                shape.len()
            )));
        }
        let shape = (shape[0] as usize, shape[1] as usize);

        let bbox = parse_bbox_attr(&array).ok_or_else(|| {
            StoreError::invalid_metadata(format!("{}: missing bbox attribute", path.display()))
        })?;

        debug!(path = %path.display(), rows = shape.0, cols = shape.1, "opened windfield source");
        Ok(Self {
            array,
            path: path.to_path_buf(),
            bbox,
            shape,
        })
    }

    /// Path of the underlying store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Grid dimensions as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Geographic extent of the realization grid.
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// The lat/lon coordinate arrays implied by the bbox and shape.
    pub fn domain_grid(&self) -> DomainGrid {
        DomainGrid::from_bbox(&self.bbox, self.shape.1, self.shape.0)
    }

    /// Read a rectangular sub-window, row-major.
    ///
    /// Only the requested window is fetched from storage; the working
    /// set never depends on the full grid dimensions.
    pub fn read_window(
        &self,
        row_start: usize,
        col_start: usize,
        height: usize,
        width: usize,
    ) -> StoreResult<Vec<f32>> {
        let subset = ArraySubset::new_with_start_shape(
            vec![row_start as u64, col_start as u64],
            vec![height as u64, width as u64],
        )
        .map_err(|e| StoreError::read_failed(e.to_string()))?;

        self.array
            .retrieve_array_subset_elements(&subset)
            .map_err(|e| StoreError::read_failed(format!("{}: {}", self.path.display(), e)))
    }
}

fn parse_bbox_attr(array: &Array<FilesystemStore>) -> Option<BoundingBox> {
    let arr = array.attributes().get("bbox")?.as_array()?;
    if arr.len() != 4 {
        return None;
    }
    Some(BoundingBox::new(
        arr[0].as_f64()?,
        arr[1].as_f64()?,
        arr[2].as_f64()?,
        arr[3].as_f64()?,
    ))
}

/// Enumerate the realization stores under `dir`, ordered by name.
///
/// Only `.zarr` directories count; anything else in the directory is
/// ignored.
pub fn discover_sources(dir: &Path) -> StoreResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() && path.extension().is_some_and(|ext| ext == "zarr") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::write_windfield;

    #[test]
    fn test_open_and_read_window() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("wf.0000.zarr");

        // 4x5 grid with value row*10 + col.
        let data: Vec<f32> = (0..4)
            .flat_map(|r| (0..5).map(move |c| (r * 10 + c) as f32))
            .collect();
        let bbox = BoundingBox::new(150.0, -25.0, 154.0, -22.0);
        write_windfield(&path, &data, 5, 4, &bbox).expect("Failed to write windfield");

        let source = WindfieldSource::open(&path).expect("Failed to open");
        assert_eq!(source.shape(), (4, 5));
        assert_eq!(source.bbox(), &bbox);

        let window = source.read_window(1, 2, 2, 3).expect("Failed to read");
        assert_eq!(window, vec![12.0, 13.0, 14.0, 22.0, 23.0, 24.0]);
    }

    #[test]
    fn test_domain_grid_from_attrs() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("wf.0000.zarr");

        let data = vec![0.0f32; 12];
        let bbox = BoundingBox::new(150.0, -25.0, 153.0, -23.0);
        write_windfield(&path, &data, 4, 3, &bbox).expect("Failed to write windfield");

        let source = WindfieldSource::open(&path).expect("Failed to open");
        let grid = source.domain_grid();
        assert_eq!(grid.lons(), &[150.0, 151.0, 152.0, 153.0]);
        assert_eq!(grid.lats(), &[-25.0, -24.0, -23.0]);
    }

    #[test]
    fn test_discover_sources_sorted() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let data = vec![0.0f32; 4];
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);

        for name in ["wf.0002.zarr", "wf.0000.zarr", "wf.0001.zarr"] {
            write_windfield(&temp_dir.path().join(name), &data, 2, 2, &bbox)
                .expect("Failed to write windfield");
        }
        // A stray file must not be picked up.
        std::fs::write(temp_dir.path().join("notes.txt"), b"x").unwrap();

        let paths = discover_sources(temp_dir.path()).expect("Failed to discover");
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["wf.0000.zarr", "wf.0001.zarr", "wf.0002.zarr"]);
    }
}
