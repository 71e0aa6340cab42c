//! Sizing of the multi-level tree reduction shared by the GPU and CPU backends.

use tracing::debug;

use crate::complex::Complex;
use crate::config::EvaluatorSettings;
use crate::error::{Result, ZetaError};

/// Term count and per-level buffer lengths for one evaluation.
///
/// The term pass writes one partial sum per workgroup into `levels[0]`; each sum
/// pass reduces `levels[i]` into `levels[i + 1]`, and the last level (at most one
/// batch long) is reduced into the single result slot. Every level is sized
/// `previous / batch_size + 1` so a partial last group always has a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReductionPlan {
    pub term_count: u32,
    pub batch_size: u32,
    pub levels: Vec<u32>,
}

impl ReductionPlan {
    pub fn new(batch_size: u32, oversampling: u32) -> Result<Self> {
        if batch_size < 2 {
            return Err(ZetaError::Settings(format!(
                "batch size must be at least 2 (got {batch_size})"
            )));
        }
        if oversampling == 0 {
            return Err(ZetaError::Settings("oversampling must be at least 1".into()));
        }
        let term_count = batch_size.checked_mul(oversampling).ok_or_else(|| {
            ZetaError::Settings(format!(
                "term count {batch_size} x {oversampling} overflows u32"
            ))
        })?;

        let mut levels = vec![term_count / batch_size + 1];
        while let Some(&last) = levels.last() {
            if last <= batch_size {
                break;
            }
            levels.push(last / batch_size + 1);
        }

        let plan = Self {
            term_count,
            batch_size,
            levels,
        };
        debug!(
            term_count = plan.term_count,
            batch_size = plan.batch_size,
            levels = ?plan.levels,
            "built reduction plan"
        );
        Ok(plan)
    }

    pub fn from_settings(settings: &EvaluatorSettings, batch_size: u32) -> Result<Self> {
        Self::new(batch_size, settings.oversampling)
    }

    /// Term pass plus one sum pass per level.
    pub fn dispatch_count(&self) -> usize {
        1 + self.levels.len()
    }

    /// Workgroups needed to cover `len` elements.
    pub fn workgroups_for(&self, len: u32) -> u32 {
        div_ceil(len, self.batch_size)
    }

    pub fn term_workgroups(&self) -> u32 {
        self.workgroups_for(self.term_count)
    }

    /// Largest workgroup count any pass dispatches along x.
    pub fn max_workgroups(&self) -> u32 {
        self.levels
            .iter()
            .map(|&len| self.workgroups_for(len))
            .chain(std::iter::once(self.term_workgroups()))
            .max()
            .unwrap_or(0)
    }

    /// Reduces `level0` (one entry per term workgroup, zero padded to
    /// `levels[0]`) through the remaining levels in batch-sized chunks.
    pub fn reduce_levels(&self, level0: Vec<Complex>) -> Complex {
        let batch = self.batch_size as usize;
        let mut current = level0;
        for &next_len in self.levels.iter().skip(1) {
            let mut next = vec![Complex::ZERO; next_len as usize];
            for (slot, chunk) in next.iter_mut().zip(current.chunks(batch)) {
                *slot = chunk.iter().copied().sum();
            }
            current = next;
        }
        current.into_iter().sum()
    }
}

pub const fn div_ceil(value: u32, divisor: u32) -> u32 {
    if divisor == 0 || value == 0 {
        0
    } else {
        ((value - 1) / divisor) + 1
    }
}
