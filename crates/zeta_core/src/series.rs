//! The mod-3 signed Dirichlet series and its Euler-style correction factor.
//!
//! With χ(n) = 1, 1, -2 for n ≡ 1, 2, 0 (mod 3),
//! `Σ χ(n) n^(-s) = (1 - 3^(1-s)) ζ(s)`, and the left side converges for
//! Re(s) > 0, so `ζ(s) = z3(s) · Σ χ(n) n^(-s)` on the direct branch.

use core::f64::consts::TAU;

use crate::complex::Complex;
use crate::error::{Result, ZetaError};
use crate::Scalar;

const LN_3: Scalar = 1.098_612_288_668_109_8;

pub fn coefficient(n: u32) -> Scalar {
    if n % 3 == 0 {
        -2.0
    } else {
        1.0
    }
}

/// `χ(n) · n^(-s)` for `n >= 1`.
pub fn term(s: Complex, n: u32) -> Complex {
    let ln_n = (n as Scalar).ln();
    let magnitude = coefficient(n) * (-s.re * ln_n).exp();
    let phase = -s.im * ln_n;
    Complex::new(magnitude * phase.cos(), magnitude * phase.sin())
}

/// `1 - 3^(1-s)`, the denominator of [`z3`].
pub fn euler_denominator(s: Complex) -> Complex {
    Complex::ONE - Complex::real(3.0).pow(Complex::ONE - s)
}

/// True when `(1 - s) ln 3` lies within rounding of `2πik`, where `3^(1-s) = 1`.
///
/// The computed denominator there is a few ulps rather than zero, so the test
/// runs on the exponent instead of the modulus.
pub fn euler_factor_vanishes(s: Complex) -> bool {
    let w = (Complex::ONE - s) * LN_3;
    let turns = (w.im / TAU).round();
    let tolerance = 16.0 * Scalar::EPSILON * w.abs().max(1.0);
    w.re.abs() <= tolerance && (w.im - turns * TAU).abs() <= tolerance
}

/// `z3(s) = 1 / (1 - 3^(1-s))`.
pub fn z3(s: Complex) -> Result<Complex> {
    if euler_factor_vanishes(s) {
        return Err(ZetaError::EulerFactorVanishes(s));
    }
    Complex::ONE
        .checked_div(euler_denominator(s))
        .map_err(|_| ZetaError::EulerFactorVanishes(s))
}

/// Sequential reference sum over `1..=term_count`.
pub fn partial_sum_sequential(s: Complex, term_count: u32) -> Complex {
    (1..=term_count).map(|n| term(s, n)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficients_cancel_over_each_period() {
        for start in [1u32, 4, 301] {
            let period: Scalar = (start..start + 3).map(coefficient).sum();
            assert_eq!(period, 0.0);
        }
    }

    #[test]
    fn term_matches_power_definition() {
        let s = Complex::new(0.75, 3.0);
        for n in [1u32, 2, 3, 10, 99] {
            let expected = Complex::real(n as Scalar).pow(-s) * coefficient(n);
            assert!(term(s, n).approx_eq(expected, 1e-12));
        }
    }

    #[test]
    fn z3_is_singular_only_at_its_zeros() {
        assert!(matches!(
            z3(Complex::ONE),
            Err(ZetaError::EulerFactorVanishes(_))
        ));
        for s in [
            Complex::real(2.0),
            Complex::real(0.5),
            Complex::new(0.5, 14.134725141734693),
            Complex::new(2.5, -1.0),
        ] {
            assert!(euler_denominator(s).abs() > 1e-3, "denominator vanished at {s}");
            assert!(z3(s).is_ok());
        }
    }

    #[test]
    fn z3_rejects_every_period_of_the_euler_factor() {
        for k in [-2.0, -1.0, 1.0, 2.0] {
            let s = Complex::new(1.0, TAU * k / LN_3);
            assert!(
                matches!(z3(s), Err(ZetaError::EulerFactorVanishes(_))),
                "z3 accepted the singular point {s}"
            );

            let nearby = Complex::new(1.0, s.im + 1e-3);
            assert!(!euler_factor_vanishes(nearby));
            assert!(z3(nearby).unwrap().is_finite());
        }
    }

    #[test]
    fn z3_at_two() {
        // 1 / (1 - 1/3) = 1.5
        assert!(z3(Complex::real(2.0)).unwrap().approx_eq(Complex::real(1.5), 1e-14));
    }
}
