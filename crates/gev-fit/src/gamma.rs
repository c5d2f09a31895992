//! Gamma function via the Lanczos approximation.

use std::f64::consts::PI;

const G: f64 = 7.0;

const COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Gamma function for real arguments.
///
/// Accurate to ~15 significant digits over the range exercised by GEV
/// fitting (arguments near 1 +/- shape, with |shape| < 1).
pub(crate) fn gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection formula for the left half-plane.
        PI / ((PI * x).sin() * gamma(1.0 - x))
    } else {
        let x = x - 1.0;
        let mut acc = COEFFICIENTS[0];
        for (i, &c) in COEFFICIENTS.iter().enumerate().skip(1) {
            acc += c / (x + i as f64);
        }
        let t = x + G + 0.5;
        (2.0 * PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_integer_arguments() {
        assert_relative_eq!(gamma(1.0), 1.0, max_relative = 1e-12);
        assert_relative_eq!(gamma(2.0), 1.0, max_relative = 1e-12);
        assert_relative_eq!(gamma(5.0), 24.0, max_relative = 1e-12);
    }

    #[test]
    fn test_half_argument() {
        assert_relative_eq!(gamma(0.5), PI.sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn test_reflection() {
        // gamma(-0.5) = -2 * sqrt(pi)
        assert_relative_eq!(gamma(-0.5), -2.0 * PI.sqrt(), max_relative = 1e-10);
    }
}
