//! Domain grid description: coordinate arrays and bounding-box clipping.

use crate::BoundingBox;

/// An inclusive index window into a larger grid.
///
/// `i` indexes longitude (columns), `j` indexes latitude (rows),
/// matching the `(lat, lon)` storage order of the windfield rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridWindow {
    pub imin: usize,
    pub imax: usize,
    pub jmin: usize,
    pub jmax: usize,
}

impl GridWindow {
    /// Number of columns covered by the window.
    pub fn width(&self) -> usize {
        self.imax - self.imin + 1
    }

    /// Number of rows covered by the window.
    pub fn height(&self) -> usize {
        self.jmax - self.jmin + 1
    }
}

/// Immutable description of a regular lat/lon computation domain.
///
/// Row 0 is the southernmost row; latitudes and longitudes are ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainGrid {
    lons: Vec<f64>,
    lats: Vec<f64>,
}

impl DomainGrid {
    /// Create a domain grid from explicit coordinate arrays.
    pub fn new(lons: Vec<f64>, lats: Vec<f64>) -> Self {
        Self { lons, lats }
    }

    /// Derive a regular grid from a bounding box and dimensions.
    ///
    /// Grid points are placed at the box edges and spaced evenly between
    /// them; a single-point axis collapses onto the minimum edge.
    pub fn from_bbox(bbox: &BoundingBox, nx: usize, ny: usize) -> Self {
        Self {
            lons: axis_coords(bbox.min_x, bbox.max_x, nx),
            lats: axis_coords(bbox.min_y, bbox.max_y, ny),
        }
    }

    /// Number of points in the longitude (x) direction.
    pub fn nx(&self) -> usize {
        self.lons.len()
    }

    /// Number of points in the latitude (y) direction.
    pub fn ny(&self) -> usize {
        self.lats.len()
    }

    /// Longitude coordinates, ascending.
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Latitude coordinates, ascending.
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Bounding box spanned by the coordinate arrays.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.lons.first().copied().unwrap_or(0.0),
            self.lats.first().copied().unwrap_or(0.0),
            self.lons.last().copied().unwrap_or(0.0),
            self.lats.last().copied().unwrap_or(0.0),
        )
    }

    /// Find the inclusive index window of grid points falling inside `bbox`.
    ///
    /// Returns `None` when the box does not overlap any grid point, which
    /// callers treat as a fatal configuration error.
    pub fn clip(&self, bbox: &BoundingBox) -> Option<GridWindow> {
        let (imin, imax) = axis_window(&self.lons, bbox.min_x, bbox.max_x)?;
        let (jmin, jmax) = axis_window(&self.lats, bbox.min_y, bbox.max_y)?;
        Some(GridWindow {
            imin,
            imax,
            jmin,
            jmax,
        })
    }

    /// Extract the sub-grid covered by `window`.
    pub fn subgrid(&self, window: &GridWindow) -> DomainGrid {
        DomainGrid {
            lons: self.lons[window.imin..=window.imax].to_vec(),
            lats: self.lats[window.jmin..=window.jmax].to_vec(),
        }
    }
}

fn axis_coords(min: f64, max: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![min; n];
    }
    let step = (max - min) / (n - 1) as f64;
    (0..n).map(|i| min + i as f64 * step).collect()
}

fn axis_window(coords: &[f64], min: f64, max: f64) -> Option<(usize, usize)> {
    let mut first = None;
    let mut last = None;
    for (idx, &c) in coords.iter().enumerate() {
        if c >= min && c <= max {
            if first.is_none() {
                first = Some(idx);
            }
            last = Some(idx);
        }
    }
    Some((first?, last?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bbox_regular_spacing() {
        let bbox = BoundingBox::new(150.0, -25.0, 154.0, -21.0);
        let grid = DomainGrid::from_bbox(&bbox, 5, 5);

        assert_eq!(grid.nx(), 5);
        assert_eq!(grid.lons(), &[150.0, 151.0, 152.0, 153.0, 154.0]);
        assert_eq!(grid.lats(), &[-25.0, -24.0, -23.0, -22.0, -21.0]);
    }

    #[test]
    fn test_from_bbox_single_point_axis() {
        let bbox = BoundingBox::new(150.0, -25.0, 150.0, -25.0);
        let grid = DomainGrid::from_bbox(&bbox, 1, 1);

        assert_eq!(grid.lons(), &[150.0]);
        assert_eq!(grid.lats(), &[-25.0]);
        assert_eq!(grid.bbox(), bbox);
    }

    #[test]
    fn test_clip_interior_window() {
        let bbox = BoundingBox::new(150.0, -25.0, 159.0, -16.0);
        let grid = DomainGrid::from_bbox(&bbox, 10, 10);

        let window = grid
            .clip(&BoundingBox::new(152.0, -23.0, 155.0, -20.0))
            .unwrap();
        assert_eq!(window.imin, 2);
        assert_eq!(window.imax, 5);
        assert_eq!(window.jmin, 2);
        assert_eq!(window.jmax, 5);
        assert_eq!(window.width(), 4);
        assert_eq!(window.height(), 4);
    }

    #[test]
    fn test_clip_no_overlap() {
        let bbox = BoundingBox::new(150.0, -25.0, 159.0, -16.0);
        let grid = DomainGrid::from_bbox(&bbox, 10, 10);

        assert!(grid.clip(&BoundingBox::new(0.0, 0.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn test_subgrid_coordinates() {
        let bbox = BoundingBox::new(150.0, -25.0, 159.0, -16.0);
        let grid = DomainGrid::from_bbox(&bbox, 10, 10);
        let window = GridWindow {
            imin: 1,
            imax: 3,
            jmin: 0,
            jmax: 1,
        };

        let sub = grid.subgrid(&window);
        assert_eq!(sub.lons(), &[151.0, 152.0, 153.0]);
        assert_eq!(sub.lats(), &[-25.0, -24.0]);
    }
}
