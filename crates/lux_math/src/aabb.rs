use crate::{Interval, Ray, Vec3};

/// Minimum extent given to each axis by the padding constructors.
const MIN_EXTENT: f32 = 0.0001;

/// Axis-aligned bounding box used by the acceleration structures.
///
/// An AABB is three intervals, one per axis. `min <= max` on every axis for
/// any non-empty box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// A box containing nothing; the identity for [`Aabb::surrounding`].
    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    /// Create a new AABB from three intervals, padding flat axes.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create an AABB from two corner points, padding flat axes.
    ///
    /// Shapes use this so that axis-aligned quads and triangles still get a
    /// box with volume.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let mut aabb = Self::from_corners(a.min(b), a.max(b));
        aabb.pad_to_minimums();
        aabb
    }

    /// Create an AABB from exact `min`/`max` corners, without padding.
    pub fn from_corners(min: Vec3, max: Vec3) -> Self {
        Self {
            x: Interval::new(min.x, max.x),
            y: Interval::new(min.y, max.y),
            z: Interval::new(min.z, max.z),
        }
    }

    /// The tight bounding box of a set of points. Empty input gives
    /// [`Aabb::EMPTY`].
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self::from_corners(min, max)
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    #[inline]
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    #[inline]
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    #[inline]
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    fn axis_interval_mut(&mut self, n: usize) -> &mut Interval {
        match n {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => &mut self.z,
        }
    }

    /// Split the box with the plane `axis = value`.
    ///
    /// Returns `(left, right)` where `left` keeps the part below the plane.
    /// The union of the two children is the original box.
    pub fn split(&self, axis: usize, value: f32) -> (Aabb, Aabb) {
        let mut left = *self;
        let mut right = *self;
        left.axis_interval_mut(axis).max = value;
        right.axis_interval_mut(axis).min = value;
        (left, right)
    }

    /// Slab test returning the parametric entry/exit interval of the ray,
    /// clipped to `ray_t`. `None` if the ray misses the box inside `ray_t`.
    pub fn hit_interval(&self, r: &Ray, ray_t: Interval) -> Option<Interval> {
        let mut t = ray_t;

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let origin = r.origin[axis];
            let dir = r.direction[axis];

            if dir == 0.0 {
                // Parallel to the slab: either always inside it or never
                if !slab.contains(origin) {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (slab.min - origin) * inv;
            let mut t1 = (slab.max - origin) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t.min = t.min.max(t0);
            t.max = t.max.min(t1);
            if t.max < t.min {
                return None;
            }
        }

        Some(t)
    }

    /// Test if a ray intersects this AABB within the given interval.
    #[inline]
    pub fn hit(&self, r: &Ray, ray_t: Interval) -> bool {
        self.hit_interval(r, ray_t).is_some()
    }

    /// True if the point lies inside or on the boundary of the box.
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.x.contains(p.x) && self.y.contains(p.y) && self.z.contains(p.z)
    }

    /// True if the closed boxes share at least one point.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x.overlaps(&other.x) && self.y.overlaps(&other.y) && self.z.overlaps(&other.z)
    }

    /// True if the box has no extent at all along its longest axis, i.e.
    /// every point it was built from coincides. Such a box cannot be split.
    pub fn is_degenerate(&self) -> bool {
        !(self.axis_interval(self.longest_axis()).size() > 0.0)
    }

    /// Grow every axis by `delta` on each side.
    pub fn padded(&self, delta: f32) -> Aabb {
        Self {
            x: self.x.expand(2.0 * delta),
            y: self.y.expand(2.0 * delta),
            z: self.z.expand(2.0 * delta),
        }
    }

    /// Pad intervals to avoid zero-width AABBs (degenerate cases).
    fn pad_to_minimums(&mut self) {
        for axis in 0..3 {
            let interval = self.axis_interval_mut(axis);
            if interval.size() < MIN_EXTENT {
                *interval = interval.expand(MIN_EXTENT);
            }
        }
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let x_size = self.x.size();
        let y_size = self.y.size();
        let z_size = self.z.size();

        if x_size > y_size && x_size > z_size {
            0
        } else if y_size > z_size {
            1
        } else {
            2
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}
