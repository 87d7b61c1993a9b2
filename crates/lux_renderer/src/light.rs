//! Lights for the direct-lighting integrator.
//!
//! The path tracer does not use these; it finds light through emissive
//! materials instead.

use crate::sampling::gen_f32;
use crate::{Color, Quad};
use lux_core::Texture;
use lux_math::Vec3;
use rand::RngCore;

/// Rectangular light whose intensity may vary across its surface.
#[derive(Debug, Clone)]
pub struct AreaLight {
    quad: Quad,
    /// Looked up at the quad's planar coordinates
    intensity: Texture,
}

impl AreaLight {
    pub fn new(quad: Quad, intensity: impl Into<Texture>) -> Self {
        Self {
            quad,
            intensity: intensity.into(),
        }
    }

    pub fn quad(&self) -> &Quad {
        &self.quad
    }

    /// Intensity at a point on the light.
    pub fn intensity_at(&self, point: Vec3) -> Color {
        self.intensity.value(self.quad.planar_uv(point), point)
    }
}

/// A light source.
#[derive(Debug, Clone)]
pub enum Light {
    Point {
        position: Vec3,
        diffuse: Color,
        specular: Color,
    },
    Area(AreaLight),
}

impl Light {
    /// Point light with the same diffuse and specular intensity.
    pub fn point(position: Vec3, intensity: Color) -> Self {
        Light::Point {
            position,
            diffuse: intensity,
            specular: intensity,
        }
    }

    pub fn area(quad: Quad, intensity: impl Into<Texture>) -> Self {
        Light::Area(AreaLight::new(quad, intensity))
    }

    /// Number of shadow samples to take: one for a point light,
    /// `area_samples` (at least one) for an area light.
    pub fn sample_count(&self, area_samples: u32) -> u32 {
        match self {
            Light::Point { .. } => 1,
            Light::Area(_) => area_samples.max(1),
        }
    }

    /// Sample `index` of `count` on the light.
    ///
    /// Area lights are stratified into exactly `count` cells: rows of
    /// `⌊√count⌋` cells, with the cells of a short last row widened to span
    /// the light. Each sample is jittered inside its cell.
    pub fn sample_point(&self, index: u32, count: u32, rng: &mut dyn RngCore) -> Vec3 {
        match self {
            Light::Point { position, .. } => *position,
            Light::Area(area) => {
                let count = count.max(1);
                let cols = ((count as f32).sqrt().floor() as u32).max(1);
                let rows = count.div_ceil(cols);
                let cell = index % count;
                let row = cell / cols;
                let row_cells = if row + 1 == rows {
                    count - cols * (rows - 1)
                } else {
                    cols
                };
                let col = cell % cols;
                let alpha = (col as f32 + gen_f32(rng)) / row_cells as f32;
                let beta = (row as f32 + gen_f32(rng)) / rows as f32;
                area.quad.point_at(alpha, beta)
            }
        }
    }

    pub fn diffuse_intensity(&self, point: Vec3) -> Color {
        match self {
            Light::Point { diffuse, .. } => *diffuse,
            Light::Area(area) => area.intensity_at(point),
        }
    }

    pub fn specular_intensity(&self, point: Vec3) -> Color {
        match self {
            Light::Point { specular, .. } => *specular,
            Light::Area(area) => area.intensity_at(point),
        }
    }
}
