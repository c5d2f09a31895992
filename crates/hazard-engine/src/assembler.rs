//! Accumulates tile results into the persistent hazard store.

use hazard_common::Tile;
use windfield_store::{FieldRanges, HazardStore};

use crate::bootstrap::TileBounds;
use crate::error::EngineResult;
use crate::fit::TileFit;

/// Running min/max over valid cells of one output field.
#[derive(Debug, Clone, Copy)]
struct RangeTracker {
    min: f32,
    max: f32,
    seen: bool,
}

impl RangeTracker {
    fn new() -> Self {
        Self {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            seen: false,
        }
    }

    fn update(&mut self, values: &[f32], nodata: f32) {
        for &v in values {
            if v == nodata {
                continue;
            }
            self.min = self.min.min(v);
            self.max = self.max.max(v);
            self.seen = true;
        }
    }

    fn range(&self) -> Option<[f32; 2]> {
        self.seen.then_some([self.min, self.max])
    }
}

/// Writes completed tiles into the output store and tracks per-field
/// value ranges for the final metadata.
///
/// Tiles are disjoint by construction, so every write lands in its own
/// sub-region and the assembler needs no locking; `finalize` is the
/// single synchronization point after the last tile.
pub struct HazardGridAssembler {
    store: HazardStore,
    nodata: f32,
    wspd: RangeTracker,
    wspd_upper: RangeTracker,
    wspd_lower: RangeTracker,
    loc: RangeTracker,
    scale: RangeTracker,
    shp: RangeTracker,
}

impl HazardGridAssembler {
    pub fn new(store: HazardStore, nodata: f32) -> Self {
        Self {
            store,
            nodata,
            wspd: RangeTracker::new(),
            wspd_upper: RangeTracker::new(),
            wspd_lower: RangeTracker::new(),
            loc: RangeTracker::new(),
            scale: RangeTracker::new(),
            shp: RangeTracker::new(),
        }
    }

    /// Write one tile's results into the store.
    pub fn write_tile(
        &mut self,
        tile: &Tile,
        fit: &TileFit,
        bounds: Option<&TileBounds>,
    ) -> EngineResult<()> {
        let height = tile.height();
        let width = tile.width();

        self.store
            .write_speeds(tile.y1, tile.x1, height, width, &fit.speeds)?;
        self.store.write_params(
            tile.y1,
            tile.x1,
            height,
            width,
            &fit.location,
            &fit.scale,
            &fit.shape,
        )?;
        self.wspd.update(&fit.speeds, self.nodata);
        self.loc.update(&fit.location, self.nodata);
        self.scale.update(&fit.scale, self.nodata);
        self.shp.update(&fit.shape, self.nodata);

        if let Some(bounds) = bounds {
            self.store.write_bounds(
                tile.y1,
                tile.x1,
                height,
                width,
                &bounds.upper,
                &bounds.lower,
            )?;
            self.wspd_upper.update(&bounds.upper, self.nodata);
            self.wspd_lower.update(&bounds.lower, self.nodata);
        }
        Ok(())
    }

    /// Record the per-field value ranges and flush store metadata.
    ///
    /// Consumes the assembler: nothing can be written after this.
    pub fn finalize(mut self) -> EngineResult<()> {
        let ranges = FieldRanges {
            wspd: self.wspd.range(),
            wspd_upper: self.wspd_upper.range(),
            wspd_lower: self.wspd_lower.range(),
            loc: self.loc.range(),
            scale: self.scale.range(),
            shp: self.shp.range(),
        };
        self.store.finalize(&ranges)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_tracker_skips_sentinel() {
        let mut tracker = RangeTracker::new();
        tracker.update(&[-9999.0, 12.0, 45.0, -9999.0], -9999.0);
        assert_eq!(tracker.range(), Some([12.0, 45.0]));
    }

    #[test]
    fn test_range_tracker_all_sentinel() {
        let mut tracker = RangeTracker::new();
        tracker.update(&[-9999.0; 8], -9999.0);
        assert_eq!(tracker.range(), None);
    }
}
