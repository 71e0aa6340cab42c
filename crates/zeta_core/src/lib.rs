//! Numeric core of the zeta evaluator, independent of any GPU backend.
//!
//! This crate hosts:
//! - the complex value type and the g = 9 gamma approximation
//! - the mod-3 Dirichlet series, its z3 correction and the reduction plan
//! - branch selection (functional equation vs. direct sum) over a pluggable
//!   partial-sum backend, with an f64 CPU backend
//! - settings, GPU payload layouts and the critical-strip sampler

pub mod complex;
pub mod config;
pub mod error;
pub mod gamma;
pub mod gpu;
pub mod reduction;
pub mod series;
pub mod strip;
pub mod zeta;

/// Scalar type used for host-side arithmetic.
pub type Scalar = f64;

pub use complex::{Complex, ComplexError};
pub use config::{BackendKind, EvaluatorSettings, StripSettings};
pub use error::ZetaError;
pub use reduction::ReductionPlan;
pub use zeta::{AsyncPartialSumBackend, CpuPartialSum, PartialSumBackend, ZetaEvaluator};
