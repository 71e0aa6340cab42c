//! f64 host references and case generation for the zeta parity runs.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use zeta_core::{Complex, CpuPartialSum, ReductionPlan, ZetaError, ZetaEvaluator};

/// One evaluation point, stored flat so other runners can read the JSON directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZetaCase {
    pub re: f64,
    pub im: f64,
}

impl ZetaCase {
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn s(&self) -> Complex {
        Complex::new(self.re, self.im)
    }
}

/// Result of evaluating one case on either side of the comparison.
pub type ZetaOutcome = Result<Complex, ZetaError>;

/// Host evaluator whose truncation and grouping match `plan`.
pub fn reference_evaluator(plan: ReductionPlan) -> ZetaEvaluator<CpuPartialSum> {
    ZetaEvaluator::new(CpuPartialSum::new(plan))
}

pub fn run_cpu_cases(plan: ReductionPlan, cases: &[ZetaCase]) -> Vec<ZetaOutcome> {
    let evaluator = reference_evaluator(plan);
    cases.iter().map(|case| evaluator.zeta(case.s())).collect()
}

/// Deterministic generator over `-8 <= Re(s) <= 4`, `|Im(s)| <= 40`.
///
/// Points within 0.1 of the pole at s = 1 are redrawn.
pub fn generate_zeta_cases(count: usize, seed: u64) -> Vec<ZetaCase> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut cases = Vec::with_capacity(count);
    while cases.len() < count {
        let case = ZetaCase::new(rng.gen_range(-8.0..=4.0), rng.gen_range(-40.0..=40.0));
        if (case.s() - Complex::ONE).abs() < 0.1 {
            continue;
        }
        cases.push(case);
    }
    cases
}

/// Points that exercise each branch: nontrivial zeros, the Re(s) = 0.5 boundary,
/// closed forms, the neighbourhood of the pole and a larger imaginary part.
pub fn zeta_stress_cases() -> Vec<ZetaCase> {
    vec![
        ZetaCase::new(0.5, 14.134_725_141_734_693),
        ZetaCase::new(0.5, 21.022_039_638_771_555),
        ZetaCase::new(0.5, 25.010_857_580_145_688),
        ZetaCase::new(0.5, 0.0),
        ZetaCase::new(0.499_999, 0.0),
        ZetaCase::new(0.0, 0.0),
        ZetaCase::new(-1.0, 0.0),
        ZetaCase::new(-2.0, 0.0),
        ZetaCase::new(-7.0, 0.0),
        ZetaCase::new(2.0, 0.0),
        ZetaCase::new(1.05, 0.0),
        ZetaCase::new(0.95, 0.5),
        ZetaCase::new(-3.5, 12.0),
        ZetaCase::new(0.5, 50.0),
        ZetaCase::new(1.0, 0.0),
    ]
}

/// `|gpu - cpu| / max(1, |cpu|)`: absolute near zeros, relative for large values.
pub fn scaled_residual(cpu: Complex, gpu: Complex) -> f64 {
    (gpu - cpu).abs() / cpu.abs().max(1.0)
}
