//! Headless sampling of ζ over the critical strip as a growing triangle strip.
//!
//! Each row fixes `y = Im(s)` and walks `Re(s)` from just above 0 up to 1; a
//! sample lands at `(Im ζ, y, Re ζ)` so stacked rows trace the image of the strip.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::complex::Complex;
use crate::config::StripSettings;
use crate::error::Result;
use crate::zeta::{PartialSumBackend, ZetaEvaluator};
use crate::Scalar;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StripVertex {
    pub position: Vec3,
    pub color: Vec4,
}

pub struct StripSampler<'a, B> {
    evaluator: &'a ZetaEvaluator<B>,
    x_resolution: u32,
    row_width: u32,
    alpha: f32,
}

impl<'a, B: PartialSumBackend> StripSampler<'a, B> {
    pub fn new(evaluator: &'a ZetaEvaluator<B>, settings: &StripSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            evaluator,
            x_resolution: settings.x_resolution,
            row_width: settings.row_width(),
            alpha: settings.alpha,
        })
    }

    /// Samples `x = 0.5 k` for `k` in `(0, 1)` (left half, red→green) and then
    /// `x = 0.5 (1 + k)` for `k` in `[0, 1)` (right half, red→blue).
    pub fn sample_row(&self, y: Scalar) -> Result<Vec<StripVertex>> {
        let resolution = self.x_resolution as Scalar;
        let mut vertices = Vec::with_capacity(self.row_width as usize);

        for i in 1..self.x_resolution {
            let k = i as Scalar / resolution;
            let z = self.evaluator.zeta(Complex::new(k * 0.5, y))?;
            let red = k as f32;
            vertices.push(StripVertex {
                position: sample_position(z, y),
                color: Vec4::new(red, 1.0 - red, 0.0, self.alpha),
            });
        }

        for i in 0..self.x_resolution {
            let k = i as Scalar / resolution;
            let z = self.evaluator.zeta(Complex::new(0.5 * (1.0 + k), y))?;
            let blue = k as f32;
            vertices.push(StripVertex {
                position: sample_position(z, y),
                color: Vec4::new(1.0 - blue, 0.0, blue, self.alpha),
            });
        }

        Ok(vertices)
    }
}

fn sample_position(z: Complex, y: Scalar) -> Vec3 {
    Vec3::new(z.im as f32, y as f32, z.re as f32)
}

/// Vertex rows plus the triangle indices stitching each row to the previous one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StripMesh {
    pub row_width: u32,
    pub vertex_limit: usize,
    pub vertices: Vec<StripVertex>,
    pub indices: Vec<u32>,
}

impl StripMesh {
    pub fn new(settings: &StripSettings) -> Self {
        Self {
            row_width: settings.row_width(),
            vertex_limit: settings.vertex_limit,
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn rows(&self) -> usize {
        if self.row_width == 0 {
            0
        } else {
            self.vertices.len() / self.row_width as usize
        }
    }

    /// Appends a row; returns `false` without modifying the mesh once the
    /// vertex limit would be reached.
    pub fn push_row(&mut self, row: &[StripVertex]) -> bool {
        if self.vertices.len() + row.len() >= self.vertex_limit {
            return false;
        }
        self.vertices.extend_from_slice(row);

        let width = self.row_width;
        let count = self.vertices.len() as u32;
        if count > width {
            let start = count - width;
            let end = count - 1;
            for a in start..end {
                let b = a + 1;
                let c = b - width;
                let d = a - width;
                self.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
        true
    }
}

/// Grows a mesh from `y_start` in `y_step` increments until `y_limit`, the
/// vertex limit, or `max_rows` stops it.
pub fn grow_strip<B: PartialSumBackend>(
    evaluator: &ZetaEvaluator<B>,
    settings: &StripSettings,
    max_rows: Option<usize>,
) -> Result<StripMesh> {
    let sampler = StripSampler::new(evaluator, settings)?;
    let mut mesh = StripMesh::new(settings);
    let mut y = settings.y_start;

    while y < settings.y_limit && max_rows.map_or(true, |limit| mesh.rows() < limit) {
        let row = sampler.sample_row(y)?;
        if !mesh.push_row(&row) {
            debug!(y, vertices = mesh.vertices.len(), "strip vertex limit reached");
            break;
        }
        y += settings.y_step;
    }

    info!(
        rows = mesh.rows(),
        vertices = mesh.vertices.len(),
        triangles = mesh.indices.len() / 3,
        "strip sampled"
    );
    Ok(mesh)
}
