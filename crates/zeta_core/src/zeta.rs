//! Branch selection for ζ(s): functional equation below the critical line,
//! backend partial sum plus the z3 correction on and above it.

use std::future::Future;

use rayon::prelude::*;
use tracing::trace;

use crate::complex::Complex;
use crate::config::EvaluatorSettings;
use crate::error::{Result, ZetaError};
use crate::gamma::gamma;
use crate::reduction::ReductionPlan;
use crate::series::{term, z3};
use crate::Scalar;

/// Real part below which the functional equation is applied.
pub const CRITICAL_LINE: Scalar = 0.5;

/// Reflections allowed per evaluation. One suffices: `1 - Re(s) >= 0.5` for every
/// finite `Re(s) < 0.5`.
pub const MAX_REFLECTIONS: u32 = 1;

/// Computes `Σ_{n=1..N} χ(n) n^(-s)` for the direct branch.
pub trait PartialSumBackend {
    fn plan(&self) -> &ReductionPlan;

    fn partial_sum(&self, s: Complex) -> Result<Complex>;
}

/// Future-returning counterpart of [`PartialSumBackend`].
///
/// Dropping the future before its first poll submits nothing; once the device
/// work is submitted it always runs to completion.
///
/// Implementations may block inside `poll` while the device drains (the wgpu
/// backend waits on the staging-buffer map there), so the future suits
/// `pollster::block_on` or a blocking-capable worker rather than a shared
/// async reactor thread.
pub trait AsyncPartialSumBackend {
    fn partial_sum_async(&self, s: Complex) -> impl Future<Output = Result<Complex>> + '_;
}

impl<B: PartialSumBackend + ?Sized> PartialSumBackend for &B {
    fn plan(&self) -> &ReductionPlan {
        (**self).plan()
    }

    fn partial_sum(&self, s: Complex) -> Result<Complex> {
        (**self).partial_sum(s)
    }
}

impl<B: PartialSumBackend + ?Sized> PartialSumBackend for Box<B> {
    fn plan(&self) -> &ReductionPlan {
        (**self).plan()
    }

    fn partial_sum(&self, s: Complex) -> Result<Complex> {
        (**self).partial_sum(s)
    }
}

/// f64 partial sums following the same batch/level layout as the GPU kernels.
#[derive(Debug, Clone)]
pub struct CpuPartialSum {
    plan: ReductionPlan,
}

impl CpuPartialSum {
    pub fn new(plan: ReductionPlan) -> Self {
        Self { plan }
    }

    pub fn from_settings(settings: &EvaluatorSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new(ReductionPlan::from_settings(
            settings,
            settings.max_batch_size,
        )?))
    }
}

impl PartialSumBackend for CpuPartialSum {
    fn plan(&self) -> &ReductionPlan {
        &self.plan
    }

    fn partial_sum(&self, s: Complex) -> Result<Complex> {
        let plan = &self.plan;
        let batch = plan.batch_size;
        let term_count = plan.term_count;

        let mut level0: Vec<Complex> = (0..plan.term_workgroups())
            .into_par_iter()
            .map(|group| {
                let first = group * batch + 1;
                let last = (first + batch - 1).min(term_count);
                (first..=last).map(|n| term(s, n)).sum()
            })
            .collect();
        level0.resize(plan.levels[0] as usize, Complex::ZERO);

        Ok(plan.reduce_levels(level0))
    }
}

/// What remains after branch selection: either a closed-form answer or a
/// backend evaluation at `target` scaled by `factor`.
enum Step {
    Done(Complex),
    Direct { target: Complex, factor: Complex },
}

pub struct ZetaEvaluator<B> {
    backend: B,
}

impl<B> ZetaEvaluator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}

impl<B: PartialSumBackend> ZetaEvaluator<B> {
    pub fn zeta(&self, s: Complex) -> Result<Complex> {
        match select_branch(s)? {
            Step::Done(value) => Ok(value),
            Step::Direct { target, factor } => Ok(factor * self.direct(target)?),
        }
    }

    /// Direct branch without the critical-line test. Converges for Re(s) > 0.
    pub fn direct(&self, s: Complex) -> Result<Complex> {
        let correction = z3(s)?;
        Ok(correction * self.backend.partial_sum(s)?)
    }
}

impl<B: AsyncPartialSumBackend> ZetaEvaluator<B> {
    pub async fn zeta_async(&self, s: Complex) -> Result<Complex> {
        match select_branch(s)? {
            Step::Done(value) => Ok(value),
            Step::Direct { target, factor } => {
                let correction = z3(target)?;
                let sum = self.backend.partial_sum_async(target).await?;
                Ok(factor * (correction * sum))
            }
        }
    }
}

fn select_branch(s: Complex) -> Result<Step> {
    if !s.is_finite() {
        return Err(ZetaError::NonFiniteInput(s));
    }

    let mut target = s;
    let mut factor = Complex::ONE;
    let mut depth = 0;
    while target.re < CRITICAL_LINE {
        if let Some(value) = closed_form(target) {
            return Ok(Step::Done(factor * value));
        }
        if depth == MAX_REFLECTIONS {
            return Err(ZetaError::ReflectionLimit { s, depth });
        }
        trace!(%target, "applying functional equation");
        factor = factor * reflection_factor(target)?;
        target = Complex::ONE - target;
        depth += 1;
    }
    Ok(Step::Direct { target, factor })
}

/// `Γ(½ - ½s) / Γ(½s) · π^(s - ½)`, so that `ζ(s) = factor · ζ(1 - s)`.
///
/// `Γ(½s)` needs `Re(s) > -18`; further left this fails with
/// [`ZetaError::GammaDomain`].
pub fn reflection_factor(s: Complex) -> Result<Complex> {
    let half = Complex::real(0.5);
    let pi = Complex::real(core::f64::consts::PI);
    let numerator = gamma(half - half * s)?;
    let denominator = gamma(half * s)?;
    Ok(numerator.checked_div(denominator)? * pi.pow(s - half))
}

/// Values where the reflection factors degenerate to 0·∞: the trivial zeros
/// s = -2, -4, ... and ζ(0) = -½.
fn closed_form(s: Complex) -> Option<Complex> {
    if s.im != 0.0 || s.re > 0.0 || (s.re * 0.5).fract() != 0.0 {
        return None;
    }
    if s.re == 0.0 {
        Some(Complex::real(-0.5))
    } else {
        Some(Complex::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZETA_2: Scalar = 1.644_934_066_848_226_4;
    const ZETA_4: Scalar = 1.082_323_233_711_138_2;
    const ZETA_HALF: Scalar = -1.460_354_508_809_586_8;
    const FIRST_ZERO: Scalar = 14.134_725_141_734_693;

    fn evaluator() -> ZetaEvaluator<CpuPartialSum> {
        // 2^16 terms: the mod-3 partial sum ends on n ≡ 1 (mod 3), where the
        // truncation error is O(|s| N^(-σ-1)).
        ZetaEvaluator::new(CpuPartialSum::new(ReductionPlan::new(64, 1024).unwrap()))
    }

    #[test]
    fn matches_reference_values_on_real_axis() {
        let eval = evaluator();
        let z2 = eval.zeta(Complex::real(2.0)).unwrap();
        let z4 = eval.zeta(Complex::real(4.0)).unwrap();
        assert!((z2.re - ZETA_2).abs() < 1e-6, "zeta(2) = {z2}");
        assert!((z4.re - ZETA_4).abs() < 1e-6, "zeta(4) = {z4}");
        assert!(z2.im.abs() < 1e-12);
        assert!(z4.im.abs() < 1e-12);
    }

    #[test]
    fn real_arguments_have_vanishing_imaginary_part() {
        let eval = evaluator();
        for x in [0.6, 1.5, 3.0, 7.25, 12.0] {
            let value = eval.zeta(Complex::real(x)).unwrap();
            assert!(value.im.abs() < 1e-12, "zeta({x}) = {value}");
        }
    }

    #[test]
    fn critical_line_values() {
        let eval = evaluator();
        let half = eval.zeta(Complex::real(0.5)).unwrap();
        assert!((half.re - ZETA_HALF).abs() < 1e-5, "zeta(1/2) = {half}");

        let zero = eval.zeta(Complex::new(0.5, FIRST_ZERO)).unwrap();
        assert!(zero.abs() < 1e-4, "first nontrivial zero gave {zero}");
    }

    #[test]
    fn negative_arguments_use_the_functional_equation() {
        let eval = evaluator();
        let minus_one = eval.zeta(Complex::real(-1.0)).unwrap();
        assert!(minus_one.approx_eq(Complex::real(-1.0 / 12.0), 1e-6), "{minus_one}");

        let minus_three = eval.zeta(Complex::real(-3.0)).unwrap();
        assert!(minus_three.approx_eq(Complex::real(1.0 / 120.0), 1e-6), "{minus_three}");
    }

    #[test]
    fn functional_equation_matches_its_definition() {
        let eval = evaluator();
        let s = Complex::new(-1.5, 2.0);
        let via_branch = eval.zeta(s).unwrap();
        let half = Complex::real(0.5);
        let pi = Complex::real(core::f64::consts::PI);
        let manual = gamma(half - half * s).unwrap() / gamma(half * s).unwrap()
            * eval.zeta(Complex::ONE - s).unwrap()
            * pi.pow(s - half);
        assert!(via_branch.approx_eq(manual, 1e-9), "{via_branch} vs {manual}");
    }

    #[test]
    fn reflection_agrees_with_direct_sum_inside_the_strip() {
        let eval = ZetaEvaluator::new(CpuPartialSum::new(ReductionPlan::new(256, 1024).unwrap()));
        for s in [Complex::new(0.3, 5.0), Complex::new(0.45, -2.0), Complex::new(0.2, 10.0)] {
            let reflected = eval.zeta(s).unwrap();
            let direct = eval.direct(s).unwrap();
            assert!(
                reflected.approx_eq(direct, 1e-5),
                "s = {s}: reflected {reflected}, direct {direct}"
            );
        }
    }

    #[test]
    fn trivial_zeros_and_zeta_zero() {
        let eval = evaluator();
        assert_eq!(eval.zeta(Complex::real(-2.0)).unwrap(), Complex::ZERO);
        assert_eq!(eval.zeta(Complex::real(-10.0)).unwrap(), Complex::ZERO);
        assert_eq!(eval.zeta(Complex::ZERO).unwrap(), Complex::real(-0.5));
    }

    #[test]
    fn pole_and_non_finite_input_are_errors() {
        let eval = evaluator();
        assert!(matches!(
            eval.zeta(Complex::ONE),
            Err(ZetaError::EulerFactorVanishes(_))
        ));
        assert!(matches!(
            eval.zeta(Complex::new(f64::NAN, 0.0)),
            Err(ZetaError::NonFiniteInput(_))
        ));
    }

    #[test]
    fn euler_factor_zeros_off_the_real_axis_are_errors() {
        let eval = evaluator();
        for k in [-1.0, 1.0, 2.0] {
            let s = Complex::new(1.0, core::f64::consts::TAU * k / 3.0f64.ln());
            assert!(
                matches!(eval.zeta(s), Err(ZetaError::EulerFactorVanishes(_))),
                "zeta({s}) should be rejected"
            );
        }
    }

    #[test]
    fn reflection_below_gamma_domain_is_an_error() {
        let eval = evaluator();
        for s in [Complex::real(-20.5), Complex::new(-20.5, 3.0), Complex::new(-18.0, 1.0)] {
            assert!(
                matches!(eval.zeta(s), Err(ZetaError::GammaDomain(_))),
                "zeta({s}) should be rejected"
            );
        }
        // Trivial zeros stay closed-form however far left they are.
        assert_eq!(eval.zeta(Complex::real(-40.0)).unwrap(), Complex::ZERO);

        let inside = eval.zeta(Complex::new(-12.5, 3.0)).unwrap();
        assert!(
            inside.approx_eq(Complex::new(2.24134, 0.33467), 1e-3),
            "zeta(-12.5 + 3i) = {inside}"
        );
    }

    #[test]
    fn critical_line_boundary_terminates() {
        let eval = evaluator();
        let on_line = eval.zeta(Complex::real(0.5)).unwrap();
        let just_below = f64::from_bits(0.5f64.to_bits() - 1);
        let below = eval.zeta(Complex::real(just_below)).unwrap();
        assert!(on_line.approx_eq(below, 1e-5), "{on_line} vs {below}");
        assert!(eval.zeta(Complex::new(just_below, 14.0)).is_ok());
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let eval = evaluator();
        let s = Complex::new(0.75, 21.5);
        let first = eval.zeta(s).unwrap();
        for _ in 0..4 {
            assert_eq!(eval.zeta(s).unwrap(), first);
        }
    }

    #[test]
    fn tree_layout_matches_sequential_sum() {
        let backend = CpuPartialSum::new(ReductionPlan::new(16, 37).unwrap());
        let s = Complex::new(1.25, -4.0);
        let tree = backend.partial_sum(s).unwrap();
        let sequential = crate::series::partial_sum_sequential(s, backend.plan().term_count);
        assert!(tree.approx_eq(sequential, 1e-12));
    }

    #[test]
    fn async_path_matches_blocking_path() {
        struct Immediate(CpuPartialSum);

        impl AsyncPartialSumBackend for Immediate {
            fn partial_sum_async(
                &self,
                s: Complex,
            ) -> impl Future<Output = Result<Complex>> + '_ {
                std::future::ready(self.0.partial_sum(s))
            }
        }

        let cpu = CpuPartialSum::new(ReductionPlan::new(64, 256).unwrap());
        let blocking = ZetaEvaluator::new(cpu.clone());
        let asynchronous = ZetaEvaluator::new(Immediate(cpu));
        for s in [Complex::new(2.0, 1.0), Complex::new(-0.5, 3.0)] {
            let expected = blocking.zeta(s).unwrap();
            let got = pollster::block_on(asynchronous.zeta_async(s)).unwrap();
            assert_eq!(got, expected);
        }
    }
}
