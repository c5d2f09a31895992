//! Generalized extreme value (GEV) distribution fitting via the method
//! of L-moments.
//!
//! Fits the three-parameter GEV to an ascending-sorted sample of block
//! maxima (per-cell simulated wind-speed maxima) and evaluates the wind
//! speeds associated with a set of return periods. The estimators are
//! Hosking's: sample L-moments from probability-weighted moments, then
//! the rational approximation for the shape parameter.
//!
//! The fitter never fails with an error: samples with too few valid
//! observations, or whose L-moments are numerically degenerate, produce
//! the caller-supplied missing-data sentinel in every output field.

mod gamma;
mod lmoments;

pub use lmoments::sample_lmoments;

use gamma::gamma;
use std::f64::consts::LN_2;
use tracing::debug;

const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

/// Shape values this close to zero are handled with the Gumbel limit
/// forms to avoid catastrophic cancellation in `(1 - y^k) / k`.
const GUMBEL_SHAPE_EPS: f64 = 1e-6;

/// Fitted GEV parameters, in the Hosking sign convention: positive
/// shape gives a distribution bounded above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GevParams {
    pub location: f64,
    pub scale: f64,
    pub shape: f64,
}

/// Result of fitting one cell's ensemble sample.
#[derive(Debug, Clone, PartialEq)]
pub struct GevFit {
    /// Wind speed per requested return period, in input order.
    pub speeds: Vec<f64>,
    /// Fitted distribution parameters.
    pub params: GevParams,
}

impl GevFit {
    fn sentinel(num_periods: usize, nodata: f64) -> Self {
        Self {
            speeds: vec![nodata; num_periods],
            params: GevParams {
                location: nodata,
                scale: nodata,
                shape: nodata,
            },
        }
    }
}

/// Fit a GEV distribution to one cell's ensemble sample and evaluate the
/// requested return periods.
///
/// # Arguments
/// * `sorted_sample` - the cell's ensemble values, ascending-sorted;
///   zeros (cells untouched by any storm in a realization) are genuine
///   observations and participate in the fit
/// * `return_periods` - target recurrence intervals, in years
/// * `nodata` - missing-data sentinel used for every undefined output
/// * `min_records` - minimum count of values `> 0` required to attempt
///   a fit at all
/// * `years_per_sim` - years of record represented by each realization;
///   converts a return period into a block exceedance probability
///
/// A sample with fewer than `min_records` positive values, or whose
/// L-moments are degenerate, yields the sentinel in every field. A
/// return period that is not longer than `years_per_sim` cannot be
/// resolved from block maxima and yields the sentinel for that entry
/// only.
pub fn fit_gev(
    sorted_sample: &[f64],
    return_periods: &[f64],
    nodata: f64,
    min_records: usize,
    years_per_sim: f64,
) -> GevFit {
    let valid = sorted_sample.iter().filter(|&&v| v > 0.0).count();
    if valid < min_records {
        return GevFit::sentinel(return_periods.len(), nodata);
    }

    let Some((l1, l2, t3)) = sample_lmoments(sorted_sample) else {
        debug!(n = sorted_sample.len(), "sample too small for L-moments");
        return GevFit::sentinel(return_periods.len(), nodata);
    };
    if l2 <= 0.0 || t3.abs() >= 1.0 {
        debug!(l2, t3, "degenerate L-moments, no fit attempted");
        return GevFit::sentinel(return_periods.len(), nodata);
    }

    // Hosking's rational approximation for the shape parameter.
    let z = 2.0 / (3.0 + t3) - LN_2 / 3f64.ln();
    let shape = 7.8590 * z + 2.9554 * z * z;

    let (location, scale) = if shape.abs() < GUMBEL_SHAPE_EPS {
        // Gumbel limit of the L-moment estimators.
        let scale = l2 / LN_2;
        (l1 - scale * EULER_MASCHERONI, scale)
    } else {
        let g = gamma(1.0 + shape);
        let scale = l2 * shape / (g * (1.0 - 2f64.powf(-shape)));
        (l1 - scale * (1.0 - g) / shape, scale)
    };

    if !location.is_finite() || !scale.is_finite() || scale <= 0.0 {
        debug!(location, scale, shape, "non-finite parameter estimate");
        return GevFit::sentinel(return_periods.len(), nodata);
    }

    let params = GevParams {
        location,
        scale,
        shape,
    };
    let speeds = return_periods
        .iter()
        .map(|&t| {
            let p = years_per_sim / t;
            if p > 0.0 && p < 1.0 {
                gev_quantile(&params, p)
            } else {
                nodata
            }
        })
        .collect();

    GevFit { speeds, params }
}

/// GEV quantile at a given exceedance probability.
///
/// For exceedance `p`, returns `x` such that `P(X > x) = p` per block.
pub fn gev_quantile(params: &GevParams, exceedance: f64) -> f64 {
    let y = -(1.0 - exceedance).ln();
    if params.shape.abs() < GUMBEL_SHAPE_EPS {
        params.location - params.scale * y.ln()
    } else {
        params.location + params.scale / params.shape * (1.0 - y.powf(params.shape))
    }
}
