//! Light transport.
//!
//! A [`Tracer`] computes the radiance carried back along one camera ray.
//! The algorithm is picked by [`IntegratorMode`]; each lives in its own
//! submodule as a set of methods on the tracer.

mod direct;
mod path;

use crate::config::{IntegratorMode, RenderConfig};
use crate::sampling::direction_to_uv;
use crate::{Color, Scene, ScatterSettings};
use lux_core::Texture;
use lux_math::{Ray, Vec3};
use rand::RngCore;

/// Per-render view of everything the integrators read.
#[derive(Clone, Copy)]
pub struct Tracer<'a> {
    scene: &'a Scene,
    background: &'a Texture,
    /// Camera position, for specular highlights
    eye: Vec3,
    config: &'a RenderConfig,
    settings: ScatterSettings,
}

impl<'a> Tracer<'a> {
    pub fn new(
        scene: &'a Scene,
        background: &'a Texture,
        eye: Vec3,
        config: &'a RenderConfig,
    ) -> Self {
        Self {
            scene,
            background,
            eye,
            config,
            settings: ScatterSettings {
                importance_sampling: config.importance_sampling,
            },
        }
    }

    /// Radiance arriving along `ray`.
    pub fn trace(&self, ray: &Ray, rng: &mut dyn RngCore) -> Color {
        match self.config.mode {
            IntegratorMode::Direct => self.trace_direct(ray, self.config.max_depth, rng),
            IntegratorMode::PathTraced => self.trace_path(ray, rng),
            IntegratorMode::Normals => self.trace_normals(ray),
        }
    }

    /// Environment seen along `direction`.
    fn background(&self, direction: Vec3) -> Color {
        let uv = direction_to_uv(direction);
        self.background.value(uv, direction.normalize_or_zero())
    }

    /// Hit normal mapped from [-1, 1] to [0, 1]; black on a miss.
    fn trace_normals(&self, ray: &Ray) -> Color {
        match self.scene.hit(ray) {
            Some(hit) => (hit.normal + Vec3::ONE) / 2.0,
            None => Color::ZERO,
        }
    }
}
