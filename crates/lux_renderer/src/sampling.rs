//! Random sampling helpers and the local shading frame.
//!
//! Every helper takes its generator explicitly; the renderer hands each
//! scanline its own seeded stream.

use lux_math::{Vec2, Vec3};
use rand::{Rng, RngCore};
use std::f32::consts::PI;

/// Uniform float in [0, 1).
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Random point in the square [-0.5, 0.5]², used to jitter pixel samples.
pub fn sample_square(rng: &mut dyn RngCore) -> Vec2 {
    Vec2::new(gen_f32(rng) - 0.5, gen_f32(rng) - 0.5)
}

/// Random point inside the unit disk (z = 0).
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec2 {
    loop {
        let p = Vec2::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Random direction uniformly distributed on the unit sphere.
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    // Rejection sampling inside the unit ball, then project
    loop {
        let v = Vec3::new(
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

/// Unit vector for azimuth `theta` (around +y) and polar angle `phi`
/// (measured from +y).
#[inline]
pub fn spherical_direction(theta: f32, phi: f32) -> Vec3 {
    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();
    Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta)
}

/// Texture coordinates of a direction on the environment sphere.
///
/// `u` is the azimuth measured from +x towards -z over [0, 2π), `v` the
/// polar angle from +y over [0, π]; both are normalized to [0, 1].
pub fn direction_to_uv(direction: Vec3) -> Vec2 {
    let len = direction.length();
    if len == 0.0 {
        return Vec2::ZERO;
    }
    let mut theta = (-direction.z).atan2(direction.x);
    if theta < 0.0 {
        theta += 2.0 * PI;
    }
    let phi = (direction.y / len).clamp(-1.0, 1.0).acos();
    Vec2::new(theta / (2.0 * PI), phi / PI)
}

/// Tangent / normal / bitangent basis at a surface point.
///
/// Local coordinates put the normal on +y, matching
/// [`spherical_direction`], so hemisphere samples can be generated with the
/// polar angle measured from the surface normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub tangent: Vec3,
    pub normal: Vec3,
    pub bitangent: Vec3,
}

impl Frame {
    /// Build an orthonormal frame from a unit normal and an approximate
    /// tangent. A tangent parallel to the normal (or zero) is replaced by an
    /// arbitrary perpendicular.
    pub fn new(tangent: Vec3, normal: Vec3) -> Self {
        let tangent = (tangent - normal * tangent.dot(normal))
            .try_normalize()
            .unwrap_or_else(|| normal.any_orthonormal_vector());
        let bitangent = normal.cross(tangent);
        Self {
            tangent,
            normal,
            bitangent,
        }
    }

    /// Transform a direction from local (tangent, normal, bitangent)
    /// coordinates to world space.
    #[inline]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.tangent * local.x + self.normal * local.y + self.bitangent * local.z
    }
}

/// Seed for the random stream of one scanline.
///
/// SplitMix64 finalizer over the render seed and row index, so neighbouring
/// rows get unrelated streams.
pub fn row_seed(seed: u64, row: u32) -> u64 {
    let mut z = seed ^ (row as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_unit_vector_is_unit() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_unit_disk_and_square_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            assert!(random_in_unit_disk(&mut rng).length() < 1.0);
            let s = sample_square(&mut rng);
            assert!(s.x >= -0.5 && s.x < 0.5 && s.y >= -0.5 && s.y < 0.5);
        }
    }

    #[test]
    fn test_frame_is_orthonormal() {
        let normal = Vec3::new(1.0, 2.0, 3.0).normalize();
        let frame = Frame::new(Vec3::X, normal);

        assert!(frame.tangent.dot(frame.normal).abs() < 1e-5);
        assert!(frame.bitangent.dot(frame.normal).abs() < 1e-5);
        assert!((frame.tangent.length() - 1.0).abs() < 1e-5);
        assert!((frame.to_world(Vec3::Y) - normal).length() < 1e-5);
    }

    #[test]
    fn test_frame_with_parallel_tangent() {
        let frame = Frame::new(Vec3::Y, Vec3::Y);
        assert!(frame.tangent.dot(Vec3::Y).abs() < 1e-5);
        assert!((frame.bitangent.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_direction_to_uv() {
        let up = direction_to_uv(Vec3::Y);
        assert!(up.y.abs() < 1e-6);

        let down = direction_to_uv(-Vec3::Y * 4.0);
        assert!((down.y - 1.0).abs() < 1e-6);

        let side = direction_to_uv(-Vec3::Z);
        assert!((side.x - 0.25).abs() < 1e-6);
        assert!((side.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_row_seed_differs_per_row() {
        assert_ne!(row_seed(0, 0), row_seed(0, 1));
        assert_ne!(row_seed(1, 0), row_seed(2, 0));
        assert_eq!(row_seed(42, 17), row_seed(42, 17));
    }
}
