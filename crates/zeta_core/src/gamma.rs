//! Closed-form gamma approximation with a fixed g = 9 coefficient table.
//!
//! The table uses Spouge's closed-form coefficients, so no precomputed constants
//! are shipped: `p[0] = sqrt(2π)` and
//! `p[k] = e^(g-k) (g-k)^(k-1/2) / ((-1)^(k-1) (k-1)!)` for `k = 1..g-1`.

use std::sync::OnceLock;

use crate::complex::Complex;
use crate::error::ZetaError;
use crate::Scalar;

pub const LANCZOS_G: usize = 9;

static COEFFICIENTS: OnceLock<[Scalar; LANCZOS_G]> = OnceLock::new();

/// Process-wide coefficient table, built on first use.
pub fn coefficients() -> &'static [Scalar; LANCZOS_G] {
    COEFFICIENTS.get_or_init(|| build_coefficients(LANCZOS_G))
}

fn build_coefficients(size: usize) -> [Scalar; LANCZOS_G] {
    let n = size as Scalar;
    let mut table = [0.0; LANCZOS_G];
    table[0] = (2.0 * core::f64::consts::PI).sqrt();

    let mut signed_factorial = 1.0;
    for (i, slot) in table.iter_mut().enumerate().skip(1) {
        let k = i as Scalar;
        let d = n - k;
        *slot = d.exp() * d.powf(k - 0.5) / signed_factorial;
        signed_factorial *= -k;
    }
    table
}

/// Returns true when `z` sits on a pole of Γ (0, -1, -2, ...).
pub fn is_pole(z: Complex) -> bool {
    z.im == 0.0 && z.re <= 0.0 && z.re.fract() == 0.0
}

/// `z + g` must lie in the right half-plane for `t.pow(..)` to keep its phase.
pub fn in_domain(z: Complex) -> bool {
    z.re + LANCZOS_G as Scalar > 0.0
}

pub fn gamma(z: Complex) -> Result<Complex, ZetaError> {
    if !z.is_finite() {
        return Err(ZetaError::NonFiniteInput(z));
    }
    if is_pole(z) {
        return Err(ZetaError::GammaPole(z));
    }
    if !in_domain(z) {
        return Err(ZetaError::GammaDomain(z));
    }

    let p = coefficients();
    let mut accum = Complex::real(p[0]);
    for (k, coefficient) in p.iter().enumerate().skip(1) {
        accum = accum + Complex::real(*coefficient).checked_div(z + Complex::real(k as Scalar))?;
    }

    let t = z + Complex::real(LANCZOS_G as Scalar);
    accum = accum * (-t).exp() * t.pow(z + Complex::real(0.5));
    Ok(accum.checked_div(z)?)
}
