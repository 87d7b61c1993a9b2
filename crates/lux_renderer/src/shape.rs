//! Geometric surfaces.
//!
//! Shapes are a closed set dispatched through an enum: intersection is the
//! hottest loop in the renderer and the variants are all known up front.

use crate::{Mesh, Plane, Quad, Sphere, Triangle};
use lux_math::{Aabb, Interval, Ray, Vec2, Vec3};
use rand::RngCore;

/// Geometric result of a ray-shape intersection, before a material is
/// attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeHit {
    pub t: f32,
    pub point: Vec3,
    /// Unit normal on the shape's outward side
    pub outward_normal: Vec3,
    pub uv: Vec2,
    pub tangent: Vec3,
}

/// A point drawn from a shape's surface with its outward normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    pub point: Vec3,
    pub normal: Vec3,
}

/// Any renderable surface.
#[derive(Debug, Clone)]
pub enum Shape {
    Sphere(Sphere),
    Plane(Plane),
    Quad(Quad),
    Triangle(Triangle),
    Mesh(Mesh),
}

impl Shape {
    /// Closest intersection with a parameter strictly inside `ray_t`.
    #[inline]
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<ShapeHit> {
        match self {
            Shape::Sphere(s) => s.hit(ray, ray_t),
            Shape::Plane(p) => p.hit(ray, ray_t),
            Shape::Quad(q) => q.hit(ray, ray_t),
            Shape::Triangle(t) => t.hit(ray, ray_t),
            Shape::Mesh(m) => m.hit(ray, ray_t),
        }
    }

    /// Surface area, or `None` for unbounded shapes.
    pub fn area(&self) -> Option<f32> {
        match self {
            Shape::Sphere(s) => Some(s.area()),
            Shape::Plane(_) => None,
            Shape::Quad(q) => Some(q.area()),
            Shape::Triangle(t) => Some(t.area()),
            Shape::Mesh(m) => Some(m.area()),
        }
    }

    /// Uniformly sample a point on the surface. `None` for shapes that
    /// cannot be sampled (infinite planes, empty meshes).
    pub fn sample(&self, rng: &mut dyn RngCore) -> Option<SurfaceSample> {
        match self {
            Shape::Sphere(s) => Some(s.sample(rng)),
            Shape::Plane(_) => None,
            Shape::Quad(q) => Some(q.sample(rng)),
            Shape::Triangle(t) => Some(t.sample(rng)),
            Shape::Mesh(m) => m.sample(rng),
        }
    }

    /// Bounding box, or `None` for unbounded shapes.
    pub fn bounding_box(&self) -> Option<Aabb> {
        match self {
            Shape::Sphere(s) => Some(s.bounding_box()),
            Shape::Plane(_) => None,
            Shape::Quad(q) => Some(q.bounding_box()),
            Shape::Triangle(t) => Some(t.bounding_box()),
            Shape::Mesh(m) => Some(m.bounding_box()),
        }
    }

    /// Short name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Sphere(_) => "sphere",
            Shape::Plane(_) => "plane",
            Shape::Quad(_) => "quad",
            Shape::Triangle(_) => "triangle",
            Shape::Mesh(_) => "mesh",
        }
    }
}

impl From<Sphere> for Shape {
    fn from(s: Sphere) -> Self {
        Shape::Sphere(s)
    }
}

impl From<Plane> for Shape {
    fn from(p: Plane) -> Self {
        Shape::Plane(p)
    }
}

impl From<Quad> for Shape {
    fn from(q: Quad) -> Self {
        Shape::Quad(q)
    }
}

impl From<Triangle> for Shape {
    fn from(t: Triangle) -> Self {
        Shape::Triangle(t)
    }
}

impl From<Mesh> for Shape {
    fn from(m: Mesh) -> Self {
        Shape::Mesh(m)
    }
}
