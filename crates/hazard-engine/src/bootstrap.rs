//! Bootstrap confidence bounds for return-period wind speeds.
//!
//! Repeated resampling-with-replacement of each cell's ensemble, one
//! refit per resample, quantifies the sampling uncertainty the finite
//! ensemble leaves in the primary fit. This multiplies the per-cell fit
//! cost by the resample count and dominates the runtime of the whole
//! engine, which is why it sits behind a configuration flag.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use gev_fit::fit_gev;

use crate::config::HazardConfig;
use crate::loader::EnsembleBlock;

const LOWER_PERCENTILE: f64 = 5.0;
const UPPER_PERCENTILE: f64 = 95.0;

/// Empirical confidence bounds for one tile, pre-filled with the
/// sentinel for degenerate cells.
pub struct TileBounds {
    pub num_periods: usize,
    pub height: usize,
    pub width: usize,
    /// Row-major `[num_periods, height, width]`.
    pub upper: Vec<f32>,
    pub lower: Vec<f32>,
}

/// Estimate per-cell confidence bounds for a tile.
///
/// Each cell owns a deterministic RNG derived from `seed` and its index,
/// so the parallel map shares no mutable state and a fixed seed makes
/// runs reproducible.
pub fn bootstrap_tile(block: &EnsembleBlock, config: &HazardConfig, seed: u64) -> TileBounds {
    let height = block.height();
    let width = block.width();
    let num_periods = config.return_periods.len();

    let cells: Vec<Option<(Vec<f64>, Vec<f64>)>> = (0..height * width)
        .into_par_iter()
        .map(|idx| {
            bootstrap_cell(block, idx / width, idx % width, config, cell_seed(seed, idx))
        })
        .collect();

    let cell_count = height * width;
    let mut bounds = TileBounds {
        num_periods,
        height,
        width,
        upper: vec![config.nodata; num_periods * cell_count],
        lower: vec![config.nodata; num_periods * cell_count],
    };

    for (idx, cell) in cells.into_iter().enumerate() {
        let Some((upper, lower)) = cell else {
            continue;
        };
        for p in 0..num_periods {
            bounds.upper[p * cell_count + idx] = upper[p] as f32;
            bounds.lower[p * cell_count + idx] = lower[p] as f32;
        }
    }
    bounds
}

/// Bootstrap one cell, returning `(upper, lower)` bounds per return
/// period, or `None` for a degenerate cell.
fn bootstrap_cell(
    block: &EnsembleBlock,
    row: usize,
    col: usize,
    config: &HazardConfig,
    seed: u64,
) -> Option<(Vec<f64>, Vec<f64>)> {
    if block.cell_max(row, col) <= 0.0 {
        return None;
    }

    let sample: Vec<f64> = block
        .cell_sample(row, col)
        .into_iter()
        .map(f64::from)
        .collect();
    let nsim = sample.len();
    let num_periods = config.return_periods.len();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut estimates = vec![Vec::with_capacity(config.bootstrap_resamples); num_periods];
    for _ in 0..config.bootstrap_resamples {
        // A fresh buffer per resample keeps the per-cell closure free of
        // shared scratch state.
        let mut resample: Vec<f64> = (0..nsim)
            .map(|_| sample[rng.gen_range(0..nsim)])
            .collect();
        resample.sort_unstable_by(f64::total_cmp);

        let fit = fit_gev(
            &resample,
            &config.return_periods,
            f64::from(config.nodata),
            config.min_records,
            config.years_per_simulation,
        );
        for (p, &speed) in fit.speeds.iter().enumerate() {
            estimates[p].push(speed);
        }
    }

    // Percentiles are extracted only after every resample for the cell
    // has been collected.
    let mut upper = Vec::with_capacity(num_periods);
    let mut lower = Vec::with_capacity(num_periods);
    for row_estimates in &mut estimates {
        row_estimates.sort_unstable_by(f64::total_cmp);
        lower.push(percentile(row_estimates, LOWER_PERCENTILE));
        upper.push(percentile(row_estimates, UPPER_PERCENTILE));
    }
    Some((upper, lower))
}

fn cell_seed(seed: u64, idx: usize) -> u64 {
    seed.wrapping_add((idx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Empirical percentile of an ascending-sorted slice, with linear
/// interpolation between order statistics.
fn percentile(sorted: &[f64], per: f64) -> f64 {
    let pos = per / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const NODATA: f32 = -9999.0;

    fn test_config() -> HazardConfig {
        HazardConfig {
            grid_limit: hazard_common::BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            num_simulations: 80,
            return_periods: vec![50.0, 100.0],
            min_records: 50,
            years_per_simulation: 1.0,
            calculate_ci: true,
            bootstrap_resamples: 100,
            x_step: 20,
            y_step: 20,
            nodata: NODATA,
            input_path: PathBuf::new(),
            output_path: PathBuf::new(),
            random_seed: Some(1),
        }
    }

    /// A 1x2 tile: cell 0 carries a varied positive sample, cell 1 is
    /// all zeros.
    fn test_block(nsim: usize) -> EnsembleBlock {
        let mut data = Vec::with_capacity(nsim * 2);
        for i in 0..nsim {
            data.push(25.0 + (i as f32).sqrt() * 6.0);
            data.push(0.0);
        }
        EnsembleBlock::new(nsim, 1, 2, data)
    }

    #[test]
    fn test_bound_ordering() {
        let config = test_config();
        let block = test_block(80);
        let bounds = bootstrap_tile(&block, &config, 99);

        for p in 0..2 {
            let lower = bounds.lower[p * 2];
            let upper = bounds.upper[p * 2];
            assert!(lower != NODATA && upper != NODATA);
            assert!(lower <= upper, "lower {} > upper {}", lower, upper);
        }
    }

    #[test]
    fn test_degenerate_cell_keeps_sentinel() {
        let config = test_config();
        let block = test_block(80);
        let bounds = bootstrap_tile(&block, &config, 99);

        for p in 0..2 {
            assert_eq!(bounds.upper[p * 2 + 1], NODATA);
            assert_eq!(bounds.lower[p * 2 + 1], NODATA);
        }
    }

    #[test]
    fn test_seed_determinism() {
        let config = test_config();
        let block = test_block(80);

        let a = bootstrap_tile(&block, &config, 7);
        let b = bootstrap_tile(&block, &config, 7);
        assert_eq!(a.upper, b.upper);
        assert_eq!(a.lower, b.lower);

        let c = bootstrap_tile(&block, &config, 8);
        assert_ne!(a.upper, c.upper);
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(percentile(&sorted, 0.0), 10.0);
        assert_eq!(percentile(&sorted, 50.0), 30.0);
        assert_eq!(percentile(&sorted, 100.0), 50.0);
        assert_eq!(percentile(&sorted, 25.0), 20.0);
        // Between order statistics.
        assert_eq!(percentile(&sorted, 30.0), 22.0);
    }
}
