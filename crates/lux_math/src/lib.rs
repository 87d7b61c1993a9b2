//! Lux math - vector primitives, rays, intervals and bounding boxes.
//!
//! Vector and matrix types come straight from `glam`; this crate adds the
//! handful of geometric types the renderer needs on top of them.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;

/// Reflect `v` about the unit normal `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract the unit vector `uv` through a surface with unit normal `n`.
///
/// `eta` is the ratio of refractive indices (incident over transmitted).
/// The caller must check [`can_refract`] first; past the critical angle the
/// result is meaningless.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, eta: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = eta * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Whether Snell's law has a real solution for a ray travelling along
/// `direction` into a surface with unit normal `n` and index ratio `eta`.
#[inline]
pub fn can_refract(direction: Vec3, n: Vec3, eta: f32) -> bool {
    let cos_theta = (-direction.normalize()).dot(n).min(1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    eta * sin_theta <= 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_flips_normal_component() {
        let v = Vec3::new(1.0, -1.0, 0.0);
        let r = reflect(v, Vec3::Y);
        assert_eq!(r, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_refract_straight_through() {
        // Head-on rays are not bent regardless of the index ratio
        let r = refract(-Vec3::Y, Vec3::Y, 1.0 / 1.5);
        assert!((r - (-Vec3::Y)).length() < 1e-5);
    }

    #[test]
    fn test_refract_obeys_snell() {
        let eta = 1.0 / 1.5;
        let incoming = Vec3::new(1.0, -1.0, 0.0).normalize();
        let out = refract(incoming, Vec3::Y, eta);

        let sin_in = incoming.x.abs();
        let sin_out = out.x.abs() / out.length();
        assert!((sin_out - eta * sin_in).abs() < 1e-5);
    }

    #[test]
    fn test_total_internal_reflection() {
        // Leaving glass at a grazing angle cannot refract
        let grazing = Vec3::new(1.0, -0.1, 0.0);
        assert!(!can_refract(grazing, Vec3::Y, 1.5));
        assert!(can_refract(-Vec3::Y, Vec3::Y, 1.5));
    }
}
