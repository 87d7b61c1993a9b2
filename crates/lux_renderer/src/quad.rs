//! Parallelogram primitive, also the shape of area lights.

use crate::sampling::gen_f32;
use crate::shape::{ShapeHit, SurfaceSample};
use lux_math::{Aabb, Interval, Ray, Vec2, Vec3};
use rand::RngCore;

/// A parallelogram spanned by edges `u` and `v` from corner `q`.
///
/// The outward normal is `u × v`. Quads are two-sided.
#[derive(Debug, Clone, PartialEq)]
pub struct Quad {
    q: Vec3,
    u: Vec3,
    v: Vec3,
    normal: Vec3,
    /// `n / (n · n)` with `n = u × v`, for planar coordinates
    w: Vec3,
    area: f32,
    bbox: Aabb,
}

impl Quad {
    pub fn new(q: Vec3, u: Vec3, v: Vec3) -> Self {
        let n = u.cross(v);
        let area = n.length();
        let w = if area > 0.0 { n / n.dot(n) } else { Vec3::ZERO };

        let box_diagonal1 = Aabb::from_points(q, q + u + v);
        let box_diagonal2 = Aabb::from_points(q + u, q + v);

        Self {
            q,
            u,
            v,
            normal: n.normalize_or_zero(),
            w,
            area,
            bbox: Aabb::surrounding(&box_diagonal1, &box_diagonal2),
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Point at planar coordinates `(alpha, beta)`; [0, 1]² covers the quad.
    #[inline]
    pub fn point_at(&self, alpha: f32, beta: f32) -> Vec3 {
        self.q + alpha * self.u + beta * self.v
    }

    /// Planar coordinates of a point in the quad's plane.
    pub fn planar_uv(&self, point: Vec3) -> Vec2 {
        let planar = point - self.q;
        Vec2::new(
            self.w.dot(planar.cross(self.v)),
            self.w.dot(self.u.cross(planar)),
        )
    }

    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<ShapeHit> {
        let denom = self.normal.dot(ray.direction());

        // No hit if the ray is parallel to the plane
        if denom.abs() < 1e-8 {
            return None;
        }

        let t = self.normal.dot(self.q - ray.origin()) / denom;
        if !ray_t.surrounds(t) {
            return None;
        }

        let point = ray.at(t);
        let uv = self.planar_uv(point);
        let unit = Interval::new(0.0, 1.0);
        if !unit.contains(uv.x) || !unit.contains(uv.y) {
            return None;
        }

        Some(ShapeHit {
            t,
            point,
            outward_normal: self.normal,
            uv,
            tangent: self.u.normalize_or_zero(),
        })
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    pub fn sample(&self, rng: &mut dyn RngCore) -> SurfaceSample {
        SurfaceSample {
            point: self.point_at(gen_f32(rng), gen_f32(rng)),
            normal: self.normal,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
