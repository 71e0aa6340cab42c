//! Complex value type used by the gamma approximation and the zeta evaluator.

use core::fmt;
use core::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Scalar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ComplexError {
    #[error("division by a complex value with zero modulus")]
    DivisionByZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Complex {
    pub re: Scalar,
    pub im: Scalar,
}

impl Complex {
    pub const ZERO: Self = Self::new(0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 0.0);
    pub const I: Self = Self::new(0.0, 1.0);

    pub const fn new(re: Scalar, im: Scalar) -> Self {
        Self { re, im }
    }

    pub const fn real(re: Scalar) -> Self {
        Self { re, im: 0.0 }
    }

    pub fn from_f32_pair(pair: [f32; 2]) -> Self {
        Self::new(pair[0] as Scalar, pair[1] as Scalar)
    }

    /// Narrows to the `vec2<f32>` layout consumed by the WGSL kernels.
    pub fn to_f32_pair(self) -> [f32; 2] {
        [self.re as f32, self.im as f32]
    }

    pub fn conj(self) -> Self {
        Self::new(self.re, -self.im)
    }

    pub fn norm_sqr(self) -> Scalar {
        self.re * self.re + self.im * self.im
    }

    /// Modulus `|z|`.
    pub fn abs(self) -> Scalar {
        self.norm_sqr().sqrt()
    }

    /// Natural log of the modulus, `ln |z|`.
    pub fn ln_abs(self) -> Scalar {
        self.abs().ln()
    }

    /// Principal argument in `(-π, π]`.
    pub fn arg(self) -> Scalar {
        self.im.atan2(self.re)
    }

    pub fn is_finite(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }

    pub fn exp(self) -> Self {
        let r = self.re.exp();
        Self::new(r * self.im.cos(), r * self.im.sin())
    }

    pub fn sin(self) -> Self {
        Self::new(
            self.re.sin() * self.im.cosh(),
            self.re.cos() * self.im.sinh(),
        )
    }

    /// `self^exponent` through the polar form with `θ = atan(im / re)`.
    ///
    /// The phase drops quadrant information, so bases with a negative real part are
    /// mirrored into the right half-plane. All bases the evaluator raises have a
    /// positive real part; [`Complex::pow_principal`] is the atan2 variant.
    pub fn pow(self, exponent: Self) -> Self {
        let theta = (self.im / self.re).atan();
        (exponent * Self::new(self.ln_abs(), theta)).exp()
    }

    /// Principal-branch power using `atan2` for the phase.
    pub fn pow_principal(self, exponent: Self) -> Self {
        (exponent * Self::new(self.ln_abs(), self.arg())).exp()
    }

    pub fn checked_div(self, rhs: Self) -> Result<Self, ComplexError> {
        let m = rhs.norm_sqr();
        if m == 0.0 {
            return Err(ComplexError::DivisionByZero);
        }
        Ok(Self::new(self.re / m, self.im / m) * rhs.conj())
    }

    pub fn approx_eq(self, other: Self, tolerance: Scalar) -> bool {
        (self - other).abs() <= tolerance
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im.is_sign_negative() {
            write!(f, "{} - {}i", self.re, -self.im)
        } else {
            write!(f, "{} + {}i", self.re, self.im)
        }
    }
}

impl From<Scalar> for Complex {
    fn from(re: Scalar) -> Self {
        Self::real(re)
    }
}

impl From<(Scalar, Scalar)> for Complex {
    fn from((re, im): (Scalar, Scalar)) -> Self {
        Self::new(re, im)
    }
}

impl Add for Complex {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl Mul<Scalar> for Complex {
    type Output = Self;

    fn mul(self, rhs: Scalar) -> Self {
        Self::new(self.re * rhs, self.im * rhs)
    }
}

/// Conjugate-multiply division. A zero divisor yields IEEE inf/NaN components;
/// use [`Complex::checked_div`] where the divisor can vanish.
impl Div for Complex {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        let m = rhs.norm_sqr();
        Self::new(self.re / m, self.im / m) * rhs.conj()
    }
}

impl Neg for Complex {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.re, -self.im)
    }
}

impl core::iter::Sum for Complex {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_complex<R: Rng + ?Sized>(rng: &mut R) -> Complex {
        Complex::new(rng.gen_range(-10.0..=10.0), rng.gen_range(-10.0..=10.0))
    }

    #[test]
    fn division_inverts_multiplication() {
        let mut rng = ChaCha8Rng::seed_from_u64(0xC0FFEE);
        for _ in 0..512 {
            let a = random_complex(&mut rng);
            let b = random_complex(&mut rng);
            if b.abs() < 1e-6 {
                continue;
            }
            let restored = (a / b) * b;
            assert!(
                restored.approx_eq(a, 1e-9 * a.abs().max(1.0)),
                "(a/b)*b mismatch: a={a}, b={b}, got {restored}"
            );
            assert_eq!(a.checked_div(b).unwrap(), a / b);
        }
    }

    #[test]
    fn checked_div_rejects_zero_modulus() {
        let a = Complex::new(1.5, -2.0);
        assert_eq!(
            a.checked_div(Complex::ZERO),
            Err(ComplexError::DivisionByZero)
        );
        assert!(!(a / Complex::ZERO).is_finite());
    }

    #[test]
    fn exp_of_polar_log_round_trips() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
        for _ in 0..512 {
            let z = random_complex(&mut rng);
            if z.abs() < 1e-9 {
                continue;
            }
            let restored = Complex::new(z.ln_abs(), z.arg()).exp();
            assert!(
                restored.approx_eq(z, 1e-10 * z.abs().max(1.0)),
                "exp(log|z| + i arg z) mismatch for {z}: {restored}"
            );
        }
    }

    #[test]
    fn pow_agrees_with_principal_branch_in_right_half_plane() {
        let mut rng = ChaCha8Rng::seed_from_u64(0xA7A2);
        for _ in 0..256 {
            let base = Complex::new(rng.gen_range(0.01..=10.0), rng.gen_range(-10.0..=10.0));
            let exponent = random_complex(&mut rng) * 0.2;
            let literal = base.pow(exponent);
            let principal = base.pow_principal(exponent);
            assert!(
                literal.approx_eq(principal, 1e-9 * principal.abs().max(1.0)),
                "pow diverged for base={base}, exponent={exponent}"
            );
        }
    }

    #[test]
    fn pow_loses_quadrant_in_left_half_plane() {
        // (-1)^(1/2): the principal branch gives i, the atan phase gives 1.
        let base = Complex::real(-1.0);
        let half = Complex::real(0.5);
        let literal = base.pow(half);
        let principal = base.pow_principal(half);
        assert!(literal.approx_eq(Complex::ONE, 1e-12));
        assert!(principal.approx_eq(Complex::I, 1e-12));
        assert!(!literal.approx_eq(principal, 1e-3));
    }

    #[test]
    fn sin_matches_real_and_imaginary_axes() {
        for x in [-3.0, -0.5, 0.0, 0.25, 1.0, 2.5] {
            let z = Complex::real(x).sin();
            assert!((z.re - f64::sin(x)).abs() < 1e-15);
            assert_eq!(z.im, 0.0);

            let w = Complex::new(0.0, x).sin();
            assert!(w.re.abs() < 1e-15);
            assert!((w.im - f64::sinh(x)).abs() < 1e-12);
        }
    }

    #[test]
    fn exp_matches_euler_formula() {
        let z = Complex::new(0.0, core::f64::consts::PI).exp();
        assert!(z.approx_eq(Complex::real(-1.0), 1e-15));
        let w = Complex::new(1.0, 0.0).exp();
        assert!((w.re - core::f64::consts::E).abs() < 1e-15);
    }

    #[test]
    fn f32_pair_conversion_narrows() {
        let z = Complex::new(1.25, -0.5);
        assert_eq!(z.to_f32_pair(), [1.25, -0.5]);
        assert_eq!(Complex::from_f32_pair([1.25, -0.5]), z);
    }
}
