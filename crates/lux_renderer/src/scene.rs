//! Scene: surfaces, lights and the top-level ray queries.
//!
//! A scene is built up front and read-only while rendering, so worker
//! threads share it by reference.

use crate::config::IntegratorMode;
use crate::hit::{HitRecord, SurfaceId};
use crate::sampling::gen_f32;
use crate::shape::Shape;
use crate::{Light, Material};
use lux_math::{Interval, Ray, Vec3};
use rand::RngCore;
use std::sync::Arc;
use thiserror::Error;

/// Closest hit distance accepted by scene queries.
pub const T_MIN: f32 = 0.001;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// A surface was paired with a material it cannot support.
    #[error("surface {surface}: {capability}")]
    MissingCapability {
        surface: usize,
        capability: &'static str,
    },
}

/// A shape with its material.
#[derive(Clone)]
pub struct Surface {
    pub shape: Shape,
    pub material: Arc<dyn Material>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("shape", &self.shape.kind())
            .field("properties", &self.material.properties())
            .finish()
    }
}

/// Everything a render needs besides the camera.
#[derive(Debug, Default, Clone)]
pub struct Scene {
    surfaces: Vec<Surface>,
    lights: Vec<Light>,
    /// Surfaces whose material emits, for light sampling
    emissive: Vec<SurfaceId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a surface.
    ///
    /// Emissive materials need a shape that can be sampled by area, so an
    /// emissive infinite plane is rejected.
    pub fn add_surface(
        &mut self,
        shape: impl Into<Shape>,
        material: Arc<dyn Material>,
    ) -> Result<SurfaceId, SceneError> {
        let shape = shape.into();
        let id = SurfaceId(self.surfaces.len());

        if material.properties().is_emissive {
            if shape.area().is_none() {
                return Err(SceneError::MissingCapability {
                    surface: id.index(),
                    capability: "emissive surfaces need a finite area",
                });
            }
            self.emissive.push(id);
        }

        log::debug!("Added {} surface {}", shape.kind(), id);
        self.surfaces.push(Surface { shape, material });
        Ok(id)
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn surface(&self, id: SurfaceId) -> &Surface {
        &self.surfaces[id.0]
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn emissive(&self) -> &[SurfaceId] {
        &self.emissive
    }

    /// Closest hit along `ray` beyond [`T_MIN`].
    pub fn hit(&self, ray: &Ray) -> Option<HitRecord<'_>> {
        let mut closest_so_far = f32::INFINITY;
        let mut closest = None;

        for (index, surface) in self.surfaces.iter().enumerate() {
            if let Some(hit) = surface.shape.hit(ray, Interval::new(T_MIN, closest_so_far)) {
                closest_so_far = hit.t;
                closest = Some((index, hit));
            }
        }

        closest.map(|(index, hit)| {
            HitRecord::new(
                ray,
                &hit,
                self.surfaces[index].material.as_ref(),
                SurfaceId(index),
            )
        })
    }

    /// Whether the segment from `from` to `to` is unobstructed.
    ///
    /// A blocker within [`T_MIN`] of `to` does not count, so a point sampled
    /// on a surface is visible from that surface's side.
    pub fn has_path(&self, from: Vec3, to: Vec3) -> bool {
        let offset = to - from;
        let distance = offset.length();
        if distance <= T_MIN {
            return true;
        }
        let ray = Ray::new_simple(from, offset / distance);
        match self.hit(&ray) {
            Some(hit) => hit.t > distance - T_MIN,
            None => true,
        }
    }

    /// A uniformly chosen emissive surface.
    pub fn random_emissive(&self, rng: &mut dyn RngCore) -> Option<SurfaceId> {
        if self.emissive.is_empty() {
            return None;
        }
        let i = ((gen_f32(rng) * self.emissive.len() as f32) as usize).min(self.emissive.len() - 1);
        Some(self.emissive[i])
    }

    /// Check the scene can be rendered with `mode`.
    pub fn validate(&self, mode: IntegratorMode) -> Result<(), SceneError> {
        if mode == IntegratorMode::PathTraced {
            if let Some(index) = self
                .surfaces
                .iter()
                .position(|s| !s.material.properties().can_scatter)
            {
                return Err(SceneError::MissingCapability {
                    surface: index,
                    capability: "path tracing needs a material with a sampling BRDF",
                });
            }
        }
        Ok(())
    }
}
