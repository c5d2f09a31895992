//! Sample L-moments from order statistics.

/// First three sample L-moments `(l1, l2, t3)` of an ascending-sorted
/// sample, where `t3 = l3 / l2` is the L-skewness.
///
/// Computed from unbiased probability-weighted moments. Returns `None`
/// for samples too small to carry three L-moments (`n < 3`) or with zero
/// L-scale (all values identical), which callers treat as a degenerate
/// fit.
pub fn sample_lmoments(sorted: &[f64]) -> Option<(f64, f64, f64)> {
    let n = sorted.len();
    if n < 3 {
        return None;
    }

    let nf = n as f64;
    let mut b0 = 0.0;
    let mut b1 = 0.0;
    let mut b2 = 0.0;
    for (j, &x) in sorted.iter().enumerate() {
        let jf = j as f64;
        b0 += x;
        b1 += x * jf / (nf - 1.0);
        b2 += x * jf * (jf - 1.0) / ((nf - 1.0) * (nf - 2.0));
    }
    b0 /= nf;
    b1 /= nf;
    b2 /= nf;

    let l1 = b0;
    let l2 = 2.0 * b1 - b0;
    let l3 = 6.0 * b2 - 6.0 * b1 + b0;
    if l2 == 0.0 {
        return None;
    }
    Some((l1, l2, l3 / l2))
}
