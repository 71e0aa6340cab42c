//! wgpu compute backend for the zeta evaluator.
//!
//! [`ComputeContext`] owns the device and both compiled kernels and is built once
//! per program; [`GpuPartialSum`] borrows it and allocates fresh reduction
//! buffers on every call.

pub mod context;
pub mod error;
pub mod partial_sum;

pub use context::ComputeContext;
pub use error::GpuError;
pub use partial_sum::GpuPartialSum;
