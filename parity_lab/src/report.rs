use std::mem::discriminant;

use crate::cpu::{scaled_residual, ZetaCase, ZetaOutcome};

/// Worst-case agreement between the host reference and the GPU for one case set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParityReport {
    pub compared: usize,
    pub max_residual: f64,
    /// Index and argument of the case with `max_residual`.
    pub worst: Option<(usize, ZetaCase)>,
    /// Cases where both sides failed with the same kind of error.
    pub agreed_errors: usize,
    /// Cases where only one side failed, or the error kinds differ.
    pub mismatches: Vec<usize>,
}

impl ParityReport {
    pub fn within(&self, tolerance: f64) -> bool {
        self.mismatches.is_empty() && self.max_residual <= tolerance
    }
}

pub fn compare_outcomes(
    cases: &[ZetaCase],
    cpu: &[ZetaOutcome],
    gpu: &[ZetaOutcome],
) -> ParityReport {
    let mut report = ParityReport::default();
    for (idx, ((case, cpu), gpu)) in cases.iter().zip(cpu).zip(gpu).enumerate() {
        match (cpu, gpu) {
            (Ok(expected), Ok(actual)) => {
                report.compared += 1;
                let residual = scaled_residual(*expected, *actual);
                // NaN residuals must still register as the worst case.
                if residual.is_nan() || residual > report.max_residual {
                    report.max_residual = if residual.is_nan() {
                        f64::INFINITY
                    } else {
                        residual
                    };
                    report.worst = Some((idx, *case));
                }
            }
            (Err(lhs), Err(rhs)) if discriminant(lhs) == discriminant(rhs) => {
                report.agreed_errors += 1;
            }
            _ => report.mismatches.push(idx),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeta_core::{Complex, ZetaError};

    #[test]
    fn worst_case_is_tracked() {
        let cases = [ZetaCase::new(2.0, 0.0), ZetaCase::new(0.5, 3.0)];
        let cpu = vec![Ok(Complex::real(1.0)), Ok(Complex::new(10.0, 0.0))];
        let gpu = vec![Ok(Complex::real(1.001)), Ok(Complex::new(10.0, 0.5))];

        let report = compare_outcomes(&cases, &cpu, &gpu);
        assert_eq!(report.compared, 2);
        assert!((report.max_residual - 0.05).abs() < 1e-12);
        assert_eq!(report.worst, Some((1, cases[1])));
        assert!(report.within(0.1));
        assert!(!report.within(0.01));
    }

    #[test]
    fn error_kinds_must_agree() {
        let s = Complex::ONE;
        let cases = [ZetaCase::new(1.0, 0.0); 3];
        let cpu = vec![
            Err(ZetaError::EulerFactorVanishes(s)),
            Err(ZetaError::EulerFactorVanishes(s)),
            Ok(Complex::ONE),
        ];
        let gpu = vec![
            Err(ZetaError::EulerFactorVanishes(s)),
            Err(ZetaError::Backend("map failed".into())),
            Err(ZetaError::Backend("map failed".into())),
        ];

        let report = compare_outcomes(&cases, &cpu, &gpu);
        assert_eq!(report.agreed_errors, 1);
        assert_eq!(report.mismatches, vec![1, 2]);
        assert!(!report.within(f64::INFINITY));
    }

    #[test]
    fn nan_results_fail_any_tolerance() {
        let cases = [ZetaCase::new(0.5, 1.0)];
        let cpu = vec![Ok(Complex::ONE)];
        let gpu = vec![Ok(Complex::new(f64::NAN, 0.0))];
        let report = compare_outcomes(&cases, &cpu, &gpu);
        assert!(!report.within(1.0));
    }
}
