//! Infinite plane.

use crate::shape::ShapeHit;
use lux_math::{Interval, Ray, Vec2, Vec3};

/// An infinite plane through `point` with unit `normal`.
///
/// Planes have no area and cannot be sampled, so they cannot carry an
/// emissive material.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    point: Vec3,
    normal: Vec3,
    tangent: Vec3,
    bitangent: Vec3,
}

impl Plane {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.try_normalize().unwrap_or(Vec3::Y);
        let tangent = normal.any_orthonormal_vector();
        Self {
            point,
            normal,
            tangent,
            bitangent: normal.cross(tangent),
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<ShapeHit> {
        let denom = ray.direction().dot(self.normal);
        if denom == 0.0 {
            return None;
        }

        let t = (self.point - ray.origin()).dot(self.normal) / denom;
        if !ray_t.surrounds(t) {
            return None;
        }

        let point = ray.at(t);
        let offset = point - self.point;

        Some(ShapeHit {
            t,
            point,
            outward_normal: self.normal,
            uv: Vec2::new(offset.dot(self.tangent), offset.dot(self.bitangent)),
            tangent: self.tangent,
        })
    }
}
