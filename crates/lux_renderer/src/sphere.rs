//! Sphere primitive, optionally moving for motion blur.

use crate::sampling::random_unit_vector;
use crate::shape::{ShapeHit, SurfaceSample};
use lux_math::{Aabb, Interval, Ray, Vec2, Vec3};
use rand::RngCore;
use std::f32::consts::PI;

/// A sphere primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    /// Center at time 0
    center: Vec3,
    /// Displacement of the center between time 0 and time 1
    motion: Vec3,
    radius: f32,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new stationary sphere.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self::moving(center, center, radius)
    }

    /// Create a sphere whose center moves linearly from `center0` at time 0
    /// to `center1` at time 1.
    pub fn moving(center0: Vec3, center1: Vec3, radius: f32) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let box0 = Aabb::from_points(center0 - rvec, center0 + rvec);
        let box1 = Aabb::from_points(center1 - rvec, center1 + rvec);

        Self {
            center: center0,
            motion: center1 - center0,
            radius,
            bbox: Aabb::surrounding(&box0, &box1),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Center at the given ray time.
    #[inline]
    pub fn center(&self, time: f32) -> Vec3 {
        self.center + time * self.motion
    }

    /// Get the UV coordinates for a point on the unit sphere.
    ///
    /// `u` is the azimuth from +x towards -z, `v` the polar angle from +y.
    fn sphere_uv(p: Vec3) -> Vec2 {
        let mut theta = (-p.z).atan2(p.x);
        if theta < 0.0 {
            theta += 2.0 * PI;
        }
        let phi = p.y.clamp(-1.0, 1.0).acos();
        Vec2::new(theta / (2.0 * PI), phi / PI)
    }

    /// Horizontal tangent following increasing `u`. Zero at the poles.
    fn sphere_tangent(p: Vec3) -> Vec3 {
        Vec3::new(p.z, 0.0, -p.x).normalize_or_zero()
    }

    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<ShapeHit> {
        let center = self.center(ray.time());
        let oc = center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 || a == 0.0 || self.radius <= 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let point = ray.at(root);
        let outward_normal = (point - center) / self.radius;

        Some(ShapeHit {
            t: root,
            point,
            outward_normal,
            uv: Self::sphere_uv(outward_normal),
            tangent: Self::sphere_tangent(outward_normal),
        })
    }

    pub fn area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }

    /// Uniform point on the sphere at time 0.
    pub fn sample(&self, rng: &mut dyn RngCore) -> SurfaceSample {
        let normal = random_unit_vector(rng);
        SurfaceSample {
            point: self.center + self.radius * normal,
            normal,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
