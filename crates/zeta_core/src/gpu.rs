//! GPU-facing data structures shared between host code and WGSL shaders.

use crate::complex::Complex;
use crate::reduction::ReductionPlan;

/// Uniform payload for the term kernel (`ZetaParams` in `zeta_term.wgsl`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ZetaTermParams {
    pub s: [f32; 2],
    pub term_count: u32,
    pub _pad: u32,
}

const _: () = assert!(core::mem::size_of::<ZetaTermParams>() == 16);

impl ZetaTermParams {
    pub fn new(s: Complex, plan: &ReductionPlan) -> Self {
        Self {
            s: s.to_f32_pair(),
            term_count: plan.term_count,
            _pad: 0,
        }
    }
}

/// One `vec2<f32>` element of a reduction level buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PartialSumGpu {
    pub value: [f32; 2],
}

const _: () = assert!(core::mem::size_of::<PartialSumGpu>() == 8);

impl PartialSumGpu {
    pub const STRIDE: u64 = core::mem::size_of::<Self>() as u64;

    pub fn to_complex(self) -> Complex {
        Complex::from_f32_pair(self.value)
    }
}
