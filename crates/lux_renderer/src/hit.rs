//! Ray-surface intersection records.

use crate::shape::ShapeHit;
use crate::Material;
use lux_math::{Ray, Vec2, Vec3};
use std::fmt;

/// Index of a surface inside its [`Scene`](crate::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub(crate) usize);

impl SurfaceId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Record of a ray-surface intersection.
#[derive(Clone, Copy)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub point: Vec3,
    /// Unit surface normal, always pointing against the incoming ray
    pub normal: Vec3,
    /// Whether the ray hit the outward-facing side of the surface
    pub front_face: bool,
    /// Ray parameter of the intersection
    pub t: f32,
    /// Surface parametric coordinates
    pub uv: Vec2,
    /// Surface tangent (unit, may be approximate)
    pub tangent: Vec3,
    /// Material of the surface that was hit
    pub material: &'a dyn Material,
    /// Which surface was hit
    pub surface: SurfaceId,
}

impl<'a> HitRecord<'a> {
    /// Build a record from a geometric hit, orienting the normal against
    /// the ray.
    pub fn new(ray: &Ray, hit: &ShapeHit, material: &'a dyn Material, surface: SurfaceId) -> Self {
        let mut record = Self {
            point: hit.point,
            normal: hit.outward_normal,
            front_face: true,
            t: hit.t,
            uv: hit.uv,
            tangent: hit.tangent,
            material,
            surface,
        };
        record.set_face_normal(ray, hit.outward_normal);
        record
    }

    /// Set the face normal based on ray direction and outward normal.
    ///
    /// `outward_normal` must be unit length.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        // If the ray and normal point in the same direction, we're inside
        self.front_face = ray.direction().dot(outward_normal) < 0.0;

        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

impl fmt::Debug for HitRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HitRecord")
            .field("point", &self.point)
            .field("normal", &self.normal)
            .field("front_face", &self.front_face)
            .field("t", &self.t)
            .field("uv", &self.uv)
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}
