//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::sampling::gen_f32;
use crate::shape::{ShapeHit, SurfaceSample};
use lux_core::MeshTriangle;
use lux_math::{Aabb, Interval, Ray, Vec2, Vec3};
use rand::RngCore;

/// A triangle primitive.
///
/// Vertices are wound counter-clockwise around the outward normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Pre-computed face normal (unit length, zero if degenerate)
    normal: Vec3,
    /// Per-vertex normals for smooth shading
    vertex_normals: Option<[Vec3; 3]>,
    /// Per-vertex texture coordinates
    vertex_uvs: Option<[Vec2; 3]>,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self {
            v0,
            v1,
            v2,
            normal,
            vertex_normals: None,
            vertex_uvs: None,
        }
    }

    /// Attach per-vertex normals (interpolated across the face).
    pub fn with_vertex_normals(mut self, normals: [Vec3; 3]) -> Self {
        self.vertex_normals = Some(normals);
        self
    }

    /// Attach per-vertex texture coordinates.
    pub fn with_vertex_uvs(mut self, uvs: [Vec2; 3]) -> Self {
        self.vertex_uvs = Some(uvs);
        self
    }

    #[inline]
    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Extent of the triangle along one axis.
    #[inline]
    pub fn axis_extent(&self, axis: usize) -> Interval {
        let a = self.v0[axis];
        let b = self.v1[axis];
        let c = self.v2[axis];
        Interval::new(a.min(b).min(c), a.max(b).max(c))
    }

    /// Möller-Trumbore ray-triangle intersection algorithm.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<ShapeHit> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction().cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);

        // Check if intersection is outside triangle (u parameter)
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);

        // Check if intersection is outside triangle (v parameter)
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray_t.surrounds(t) {
            return None;
        }

        let w = 1.0 - u - v;
        let outward_normal = match self.vertex_normals {
            Some([n0, n1, n2]) => (w * n0 + u * n1 + v * n2)
                .try_normalize()
                .unwrap_or(self.normal),
            None => self.normal,
        };
        let uv = match self.vertex_uvs {
            Some([t0, t1, t2]) => w * t0 + u * t1 + v * t2,
            None => Vec2::new(u, v),
        };

        Some(ShapeHit {
            t,
            point: ray.at(t),
            outward_normal,
            uv,
            tangent: edge1.normalize_or_zero(),
        })
    }

    pub fn area(&self) -> f32 {
        0.5 * (self.v1 - self.v0).cross(self.v2 - self.v0).length()
    }

    /// Uniform point on the triangle.
    pub fn sample(&self, rng: &mut dyn RngCore) -> SurfaceSample {
        let mut a = gen_f32(rng);
        let mut b = gen_f32(rng);
        // Fold the far half of the parallelogram back onto the triangle
        if a + b > 1.0 {
            a = 1.0 - a;
            b = 1.0 - b;
        }
        SurfaceSample {
            point: self.v0 + a * (self.v1 - self.v0) + b * (self.v2 - self.v0),
            normal: self.normal,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(self.v0.min(self.v1).min(self.v2), self.v0.max(self.v1).max(self.v2))
    }
}

impl From<MeshTriangle> for Triangle {
    fn from(tri: MeshTriangle) -> Self {
        let [v0, v1, v2] = tri.positions;
        let mut triangle = Triangle::new(v0, v1, v2);
        triangle.vertex_normals = tri.normals;
        triangle.vertex_uvs = tri.uvs;
        triangle
    }
}
