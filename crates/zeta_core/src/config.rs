//! Evaluator settings shared by the CLI, the GPU backend and the parity lab.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZetaError};
use crate::Scalar;

/// Which partial-sum backend evaluates the direct branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Gpu,
    Cpu,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorSettings {
    /// Workgroups dispatched by the term pass; the term count is
    /// `batch_size * oversampling`.
    pub oversampling: u32,
    /// Upper bound for the batch (workgroup) size; the device limits may lower it.
    pub max_batch_size: u32,
    pub backend: BackendKind,
    pub strip: StripSettings,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            oversampling: 1024,
            max_batch_size: 256,
            backend: BackendKind::Gpu,
            strip: StripSettings::default(),
        }
    }
}

/// Sampling parameters for the growing strip over the critical strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripSettings {
    pub x_resolution: u32,
    pub y_start: Scalar,
    pub y_step: Scalar,
    pub y_limit: Scalar,
    pub vertex_limit: usize,
    pub alpha: f32,
}

impl Default for StripSettings {
    fn default() -> Self {
        Self {
            x_resolution: 10,
            y_start: 0.0,
            y_step: 0.01,
            y_limit: 35.0,
            vertex_limit: 1024 * 1024,
            alpha: 0.5,
        }
    }
}

impl EvaluatorSettings {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(text)
            .map_err(|err| ZetaError::Settings(format!("malformed settings JSON: {err}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path).map_err(|err| {
            ZetaError::Settings(format!(
                "failed to read settings {}: {err}",
                path.as_ref().display()
            ))
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.oversampling == 0 {
            return Err(ZetaError::Settings("oversampling must be at least 1".into()));
        }
        if self.max_batch_size < 2 || !self.max_batch_size.is_power_of_two() {
            return Err(ZetaError::Settings(format!(
                "max_batch_size must be a power of two >= 2 (got {})",
                self.max_batch_size
            )));
        }
        if (self.max_batch_size as u64) * (self.oversampling as u64) > u32::MAX as u64 {
            return Err(ZetaError::Settings(
                "max_batch_size * oversampling overflows the u32 term index".into(),
            ));
        }
        self.strip.validate()
    }

    /// Largest power of two that fits both the configured cap and the device limits.
    pub fn resolve_batch_size(&self, max_invocations: u32, max_workgroup_x: u32) -> u32 {
        let cap = self.max_batch_size.min(max_invocations).min(max_workgroup_x);
        floor_power_of_two(cap).max(2)
    }
}

impl StripSettings {
    pub fn validate(&self) -> Result<()> {
        if self.x_resolution < 2 {
            return Err(ZetaError::Settings("strip.x_resolution must be >= 2".into()));
        }
        if !(self.y_step.is_finite() && self.y_step > 0.0) {
            return Err(ZetaError::Settings("strip.y_step must be positive".into()));
        }
        if !(self.y_start.is_finite() && self.y_limit.is_finite()) {
            return Err(ZetaError::Settings("strip bounds must be finite".into()));
        }
        if self.vertex_limit == 0 {
            return Err(ZetaError::Settings("strip.vertex_limit must be > 0".into()));
        }
        Ok(())
    }

    /// Vertices per sampled row: `x_resolution - 1` left of the critical line plus
    /// `x_resolution` from it to Re(s) = 1.
    pub fn row_width(&self) -> u32 {
        (self.x_resolution * 2).saturating_sub(1)
    }
}

fn floor_power_of_two(value: u32) -> u32 {
    if value == 0 {
        0
    } else {
        1 << (31 - value.leading_zeros())
    }
}
