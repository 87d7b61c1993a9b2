use crate::Vec3;

/// Distance a ray origin is pushed along its direction to leave a surface.
const NUDGE_DISTANCE: f32 = 1e-2;

/// A ray in 3D space with origin, direction, and time.
///
/// The direction is not required to be unit length; consumers normalize as
/// needed. `time` lies in [0, 1] and drives motion blur.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub time: f32,
}

impl Ray {
    /// Create a new ray.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3, time: f32) -> Self {
        Self {
            origin,
            direction,
            time,
        }
    }

    /// Create a ray at time 0.
    #[inline]
    pub fn new_simple(origin: Vec3, direction: Vec3) -> Self {
        Self::new(origin, direction, 0.0)
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Move the origin a short distance along the ray so that a ray spawned
    /// on a surface does not immediately hit that same surface again.
    pub fn nudge_forward(mut self) -> Self {
        self.origin += NUDGE_DISTANCE * self.direction.normalize_or_zero();
        self
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 0.0);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_nudge_uses_unit_direction() {
        // A long direction vector must not push the origin further
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, 50.0)).nudge_forward();
        assert!((ray.origin.z - NUDGE_DISTANCE).abs() < 1e-7);
        assert_eq!(ray.direction, Vec3::new(0.0, 0.0, 50.0));
    }

    #[test]
    fn test_nudge_zero_direction_is_noop() {
        let ray = Ray::new_simple(Vec3::ONE, Vec3::ZERO).nudge_forward();
        assert_eq!(ray.origin, Vec3::ONE);
    }
}
