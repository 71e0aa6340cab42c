use anyhow::{Context, Result};
use tracing::debug;
use zeta_core::ZetaEvaluator;
use zeta_gpu::{ComputeContext, GpuPartialSum};

use crate::cpu::{ZetaCase, ZetaOutcome};

/// Evaluates every case through the GPU backend, one submission per case.
///
/// Per-case evaluation errors are returned as outcomes; only failures to set up
/// the backend abort the run.
pub async fn run_gpu_cases_async(
    context: &ComputeContext,
    cases: &[ZetaCase],
) -> Result<Vec<ZetaOutcome>> {
    if cases.is_empty() {
        return Ok(Vec::new());
    }

    let backend = GpuPartialSum::new(context).context("failed to build GPU partial-sum backend")?;
    let evaluator = ZetaEvaluator::new(backend);

    let mut outcomes = Vec::with_capacity(cases.len());
    for case in cases {
        outcomes.push(evaluator.zeta_async(case.s()).await);
    }
    debug!(
        cases = cases.len(),
        failures = outcomes.iter().filter(|o| o.is_err()).count(),
        "GPU cases evaluated"
    );
    Ok(outcomes)
}

pub fn run_gpu_cases(context: &ComputeContext, cases: &[ZetaCase]) -> Result<Vec<ZetaOutcome>> {
    pollster::block_on(run_gpu_cases_async(context, cases))
}
