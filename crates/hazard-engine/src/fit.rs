//! Per-cell GEV fitting across one tile.

use rayon::prelude::*;

use gev_fit::{fit_gev, GevFit};

use crate::config::HazardConfig;
use crate::loader::EnsembleBlock;

/// Tile-local result arrays, pre-filled with the sentinel and populated
/// only for cells whose fit succeeded.
pub struct TileFit {
    pub num_periods: usize,
    pub height: usize,
    pub width: usize,
    /// Row-major `[num_periods, height, width]`.
    pub speeds: Vec<f32>,
    /// Row-major `[height, width]`.
    pub location: Vec<f32>,
    pub scale: Vec<f32>,
    pub shape: Vec<f32>,
}

/// Fit every cell of a tile.
///
/// Cells are independent: each one sees only its own ensemble sample and
/// writes only its own output slots, so the map runs on the rayon pool.
/// A cell whose ensemble maximum is not positive was never touched by a
/// storm and is skipped outright, keeping the sentinel.
pub fn fit_tile(block: &EnsembleBlock, config: &HazardConfig) -> TileFit {
    let height = block.height();
    let width = block.width();
    let num_periods = config.return_periods.len();

    let cells: Vec<Option<GevFit>> = (0..height * width)
        .into_par_iter()
        .map(|idx| fit_cell(block, idx / width, idx % width, config))
        .collect();

    let cell_count = height * width;
    let mut fit = TileFit {
        num_periods,
        height,
        width,
        speeds: vec![config.nodata; num_periods * cell_count],
        location: vec![config.nodata; cell_count],
        scale: vec![config.nodata; cell_count],
        shape: vec![config.nodata; cell_count],
    };

    for (idx, cell) in cells.into_iter().enumerate() {
        let Some(cell) = cell else {
            continue;
        };
        for (p, &speed) in cell.speeds.iter().enumerate() {
            fit.speeds[p * cell_count + idx] = speed as f32;
        }
        fit.location[idx] = cell.params.location as f32;
        fit.scale[idx] = cell.params.scale as f32;
        fit.shape[idx] = cell.params.shape as f32;
    }
    fit
}

/// Fit one cell, or `None` for a degenerate (never-affected) cell.
fn fit_cell(
    block: &EnsembleBlock,
    row: usize,
    col: usize,
    config: &HazardConfig,
) -> Option<GevFit> {
    if block.cell_max(row, col) <= 0.0 {
        return None;
    }
    let mut sample: Vec<f64> = block
        .cell_sample(row, col)
        .into_iter()
        .map(f64::from)
        .collect();
    sample.sort_unstable_by(f64::total_cmp);
    Some(fit_gev(
        &sample,
        &config.return_periods,
        f64::from(config.nodata),
        config.min_records,
        config.years_per_simulation,
    ))
}
