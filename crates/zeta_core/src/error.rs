//! Typed errors for the numeric kernel and its backends.

use thiserror::Error;

use crate::complex::{Complex, ComplexError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZetaError {
    #[error("argument {0} is not finite")]
    NonFiniteInput(Complex),

    #[error("gamma has a pole at {0}")]
    GammaPole(Complex),

    /// Re(z + g) <= 0, where the g = 9 approximation loses the phase of `z + g`.
    #[error("gamma approximation is not valid at {0} (needs Re(z) > -9)")]
    GammaDomain(Complex),

    /// `1 - 3^(1-s)` vanished, which happens at the pole s = 1 and at
    /// s = 1 + 2πik / ln 3.
    #[error("Euler correction factor is singular at s = {0}")]
    EulerFactorVanishes(Complex),

    #[error("functional equation did not reach Re(s) >= 0.5 after {depth} reflection(s) (s = {s})")]
    ReflectionLimit { s: Complex, depth: u32 },

    #[error("invalid evaluator settings: {0}")]
    Settings(String),

    #[error("partial-sum backend failed: {0}")]
    Backend(String),

    #[error(transparent)]
    Complex(#[from] ComplexError),
}

pub type Result<T> = std::result::Result<T, ZetaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_gamma_pole() {
        let err = ZetaError::GammaPole(Complex::real(-2.0));
        assert_eq!(err.to_string(), "gamma has a pole at -2 + 0i");
    }

    #[test]
    fn complex_errors_convert() {
        let err: ZetaError = ComplexError::DivisionByZero.into();
        assert_eq!(
            err.to_string(),
            "division by a complex value with zero modulus"
        );
    }
}
