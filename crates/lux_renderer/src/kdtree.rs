//! kd-tree spatial indices.
//!
//! [`TriangleTree`] accelerates ray queries against a mesh: nodes split the
//! box at the median vertex coordinate along its longest axis and triangles
//! straddling the split plane are referenced from both children.
//!
//! [`PointTree`] is a classic k-d tree over points (axis = depth % 3) for
//! nearest-neighbour and box enumeration queries on mesh vertices.
//!
//! Both trees keep their nodes in a flat arena addressed by `u32` index.

use crate::shape::ShapeHit;
use crate::Triangle;
use lux_math::{Aabb, Interval, Ray, Vec3};

/// Maximum triangles per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// Padding applied to the root box so that axis-aligned faces on the
/// boundary are still inside it.
const ROOT_PADDING: f32 = 1e-4;

/// Hard limit on tree depth.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone)]
enum Node {
    /// Triangles referenced by `indices[start..start + len]`.
    Leaf { bbox: Aabb, start: u32, len: u32 },
    /// Split by the plane `axis = split`; `left` holds the lower half.
    Interior {
        bbox: Aabb,
        axis: u8,
        split: f32,
        left: u32,
        right: u32,
    },
}

impl Node {
    fn bbox(&self) -> &Aabb {
        match self {
            Node::Leaf { bbox, .. } | Node::Interior { bbox, .. } => bbox,
        }
    }
}

/// Shape statistics for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub depth: usize,
    /// Triangle references across all leaves (>= triangle count)
    pub references: usize,
}

/// Ray-intersection index over a fixed set of triangles.
#[derive(Debug, Clone)]
pub struct TriangleTree {
    triangles: Vec<Triangle>,
    nodes: Vec<Node>,
    indices: Vec<u32>,
}

impl TriangleTree {
    /// Build the tree over `triangles`.
    pub fn new(triangles: Vec<Triangle>) -> Self {
        let mut tree = Self {
            triangles,
            nodes: Vec::new(),
            indices: Vec::new(),
        };

        if tree.triangles.is_empty() {
            return tree;
        }

        let bounds = tree
            .triangles
            .iter()
            .fold(Aabb::EMPTY, |acc, t| {
                Aabb::surrounding(&acc, &Aabb::enclosing(&t.vertices()))
            })
            .padded(ROOT_PADDING);
        let all: Vec<u32> = (0..tree.triangles.len() as u32).collect();
        tree.build(bounds, all, 0);

        let stats = tree.stats();
        log::debug!(
            "kd-tree: {} triangles, {} nodes, {} leaves, depth {}, {} references",
            tree.triangles.len(),
            stats.nodes,
            stats.leaves,
            stats.depth,
            stats.references
        );

        tree
    }

    /// Recursively build the subtree for `tris` inside `bbox`, returning the
    /// index of its root node.
    fn build(&mut self, bbox: Aabb, tris: Vec<u32>, depth: usize) -> u32 {
        if tris.len() <= LEAF_MAX_SIZE || depth >= MAX_DEPTH || bbox.is_degenerate() {
            return self.push_leaf(bbox, &tris);
        }

        let axis = bbox.longest_axis();
        let slab = bbox.axis_interval(axis);
        let split = self.median_coordinate(&tris, axis, slab);
        let (left_box, right_box) = bbox.split(axis, split);

        let mut left = Vec::new();
        let mut right = Vec::new();
        for &idx in &tris {
            let extent = self.triangles[idx as usize].axis_extent(axis);
            if extent.max <= split {
                left.push(idx);
            } else if extent.min >= split {
                right.push(idx);
            } else {
                left.push(idx);
                right.push(idx);
            }
        }

        // Stop when the split does not separate anything
        if left.len() == tris.len() || right.len() == tris.len() {
            return self.push_leaf(bbox, &tris);
        }

        let node = self.nodes.len() as u32;
        self.nodes.push(Node::Interior {
            bbox,
            axis: axis as u8,
            split,
            left: 0,
            right: 0,
        });

        let left_child = self.build(left_box, left, depth + 1);
        let right_child = self.build(right_box, right, depth + 1);

        if let Node::Interior { left, right, .. } = &mut self.nodes[node as usize] {
            *left = left_child;
            *right = right_child;
        }

        node
    }

    /// Median vertex coordinate of the triangles along `axis`, clamped to
    /// the node's slab. Uses partial selection rather than a full sort.
    fn median_coordinate(&self, tris: &[u32], axis: usize, slab: Interval) -> f32 {
        let mut coords: Vec<f32> = tris
            .iter()
            .flat_map(|&idx| self.triangles[idx as usize].vertices())
            .map(|v| slab.clamp(v[axis]))
            .collect();

        let mid = coords.len() / 2;
        let (_, median, _) = coords.select_nth_unstable_by(mid, f32::total_cmp);
        *median
    }

    fn push_leaf(&mut self, bbox: Aabb, tris: &[u32]) -> u32 {
        let start = self.indices.len() as u32;
        self.indices.extend_from_slice(tris);
        self.nodes.push(Node::Leaf {
            bbox,
            start,
            len: tris.len() as u32,
        });
        (self.nodes.len() - 1) as u32
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounding box of the root node (padded), or empty for an empty tree.
    pub fn bounds(&self) -> Aabb {
        self.nodes.first().map(|n| *n.bbox()).unwrap_or(Aabb::EMPTY)
    }

    /// Closest triangle hit with `t` strictly inside `ray_t`, with the index
    /// of the triangle that was hit.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<(ShapeHit, usize)> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut best = None;
        self.hit_node(0, ray, ray_t, &mut best);
        best
    }

    fn hit_node(&self, node: u32, ray: &Ray, ray_t: Interval, best: &mut Option<(ShapeHit, usize)>) {
        let node = &self.nodes[node as usize];

        let mut clip = ray_t;
        if let Some((hit, _)) = best {
            clip.max = clip.max.min(hit.t);
        }
        let Some(span) = node.bbox().hit_interval(ray, clip) else {
            return;
        };

        match *node {
            Node::Leaf { start, len, .. } => {
                let range = start as usize..(start + len) as usize;
                for &idx in &self.indices[range] {
                    let closest = best.as_ref().map_or(ray_t.max, |(hit, _)| hit.t);
                    let triangle = &self.triangles[idx as usize];
                    if let Some(hit) = triangle.hit(ray, Interval::new(ray_t.min, closest)) {
                        *best = Some((hit, idx as usize));
                    }
                }
            }
            Node::Interior {
                axis,
                split,
                left,
                right,
                ..
            } => {
                let axis = axis as usize;
                let origin = ray.origin[axis];
                let dir = ray.direction[axis];

                if dir == 0.0 {
                    // Parallel to the split plane: only one side is reachable
                    let side = if origin < split { left } else { right };
                    self.hit_node(side, ray, ray_t, best);
                    return;
                }

                // Moving towards +axis enters the lower child first
                let (near, far) = if dir > 0.0 { (left, right) } else { (right, left) };
                let t_split = (split - origin) / dir;

                if t_split > span.max {
                    self.hit_node(near, ray, ray_t, best);
                } else if t_split < span.min {
                    self.hit_node(far, ray, ray_t, best);
                } else {
                    self.hit_node(near, ray, ray_t, best);
                    if matches!(best, Some((hit, _)) if hit.t <= t_split) {
                        return;
                    }
                    self.hit_node(far, ray, ray_t, best);
                }
            }
        }
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        if !self.nodes.is_empty() {
            self.collect_stats(0, 1, &mut stats);
        }
        stats
    }

    fn collect_stats(&self, node: u32, depth: usize, stats: &mut TreeStats) {
        stats.nodes += 1;
        stats.depth = stats.depth.max(depth);
        match self.nodes[node as usize] {
            Node::Leaf { len, .. } => {
                stats.leaves += 1;
                stats.references += len as usize;
            }
            Node::Interior { left, right, .. } => {
                self.collect_stats(left, depth + 1, stats);
                self.collect_stats(right, depth + 1, stats);
            }
        }
    }

    /// Visit every leaf reference with the boxes of all nodes on the path
    /// from the root to that leaf (root first).
    pub fn for_each_reference(&self, mut f: impl FnMut(usize, &[Aabb])) {
        if self.nodes.is_empty() {
            return;
        }
        let mut path = Vec::new();
        self.walk(0, &mut path, &mut f);
    }

    fn walk(&self, node: u32, path: &mut Vec<Aabb>, f: &mut impl FnMut(usize, &[Aabb])) {
        let node = &self.nodes[node as usize];
        path.push(*node.bbox());
        match *node {
            Node::Leaf { start, len, .. } => {
                for &idx in &self.indices[start as usize..(start + len) as usize] {
                    f(idx as usize, path);
                }
            }
            Node::Interior { left, right, .. } => {
                self.walk(left, path, f);
                self.walk(right, path, f);
            }
        }
        path.pop();
    }
}

#[derive(Debug, Clone)]
struct PointNode {
    point: Vec3,
    axis: u8,
    left: Option<u32>,
    right: Option<u32>,
}

/// k-d tree over points, cycling the split axis with depth.
#[derive(Debug, Clone, Default)]
pub struct PointTree {
    nodes: Vec<PointNode>,
}

impl PointTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a balanced tree from a static point list by median selection.
    pub fn build(mut points: Vec<Vec3>) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(points.len()),
        };
        tree.build_node(&mut points, 0);
        tree
    }

    fn build_node(&mut self, points: &mut [Vec3], depth: usize) -> Option<u32> {
        if points.is_empty() {
            return None;
        }

        let axis = depth % 3;
        let mid = points.len() / 2;
        points.select_nth_unstable_by(mid, |a, b| a[axis].total_cmp(&b[axis]));

        let node = self.nodes.len() as u32;
        self.nodes.push(PointNode {
            point: points[mid],
            axis: axis as u8,
            left: None,
            right: None,
        });

        let (lower, rest) = points.split_at_mut(mid);
        let left = self.build_node(lower, depth + 1);
        let right = self.build_node(&mut rest[1..], depth + 1);

        let entry = &mut self.nodes[node as usize];
        entry.left = left;
        entry.right = right;

        Some(node)
    }

    /// Insert a single point, descending by axis-at-depth comparison.
    pub fn insert(&mut self, point: Vec3) {
        let new_index = self.nodes.len() as u32;
        if self.nodes.is_empty() {
            self.nodes.push(PointNode {
                point,
                axis: 0,
                left: None,
                right: None,
            });
            return;
        }

        let mut current = 0u32;
        loop {
            let node = &self.nodes[current as usize];
            let axis = node.axis as usize;
            let goes_left = point[axis] < node.point[axis];
            let child = if goes_left { node.left } else { node.right };

            match child {
                Some(next) => current = next,
                None => {
                    let next_axis = ((axis + 1) % 3) as u8;
                    let node = &mut self.nodes[current as usize];
                    if goes_left {
                        node.left = Some(new_index);
                    } else {
                        node.right = Some(new_index);
                    }
                    self.nodes.push(PointNode {
                        point,
                        axis: next_axis,
                        left: None,
                        right: None,
                    });
                    return;
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The stored point closest to `query`.
    pub fn nearest_neighbour(&self, query: Vec3) -> Option<Vec3> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut best = (self.nodes[0].point, f32::INFINITY);
        self.nearest_node(0, query, &mut best);
        Some(best.0)
    }

    fn nearest_node(&self, node: u32, query: Vec3, best: &mut (Vec3, f32)) {
        let node = &self.nodes[node as usize];
        let dist_sq = node.point.distance_squared(query);
        if dist_sq < best.1 {
            *best = (node.point, dist_sq);
        }

        let axis = node.axis as usize;
        let diff = query[axis] - node.point[axis];
        let (favoured, other) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(child) = favoured {
            self.nearest_node(child, query, best);
        }
        // The far side can only hold a closer point if the splitting plane
        // is within the current best distance
        if let Some(child) = other {
            if diff * diff <= best.1 {
                self.nearest_node(child, query, best);
            }
        }
    }

    /// All stored points inside `bbox` (boundary inclusive).
    pub fn within(&self, bbox: &Aabb) -> Vec<Vec3> {
        let mut found = Vec::new();
        if !self.nodes.is_empty() {
            self.within_node(0, bbox, &mut found);
        }
        found
    }

    fn within_node(&self, node: u32, bbox: &Aabb, found: &mut Vec<Vec3>) {
        let node = &self.nodes[node as usize];
        if bbox.contains_point(node.point) {
            found.push(node.point);
        }

        let axis = node.axis as usize;
        let slab = bbox.axis_interval(axis);
        let value = node.point[axis];

        if let Some(left) = node.left {
            if slab.min <= value {
                self.within_node(left, bbox, found);
            }
        }
        if let Some(right) = node.right {
            if slab.max >= value {
                self.within_node(right, bbox, found);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{gen_f32, random_unit_vector};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cmp::Ordering;

    fn by_distance(query: Vec3) -> impl Fn(&Vec3, &Vec3) -> Ordering {
        move |a, b| a.distance_squared(query).total_cmp(&b.distance_squared(query))
    }

    fn random_point(rng: &mut StdRng, scale: f32) -> Vec3 {
        Vec3::new(
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
        ) * scale
    }

    /// Small random triangles scattered through a cube.
    fn random_triangles(count: usize, seed: u64) -> Vec<Triangle> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let center = random_point(&mut rng, 5.0);
                Triangle::new(
                    center + random_point(&mut rng, 0.6),
                    center + random_point(&mut rng, 0.6),
                    center + random_point(&mut rng, 0.6),
                )
            })
            .collect()
    }

    fn brute_force(triangles: &[Triangle], ray: &Ray, ray_t: Interval) -> Option<(ShapeHit, usize)> {
        let mut best: Option<(ShapeHit, usize)> = None;
        for (idx, tri) in triangles.iter().enumerate() {
            let closest = best.as_ref().map_or(ray_t.max, |(hit, _)| hit.t);
            if let Some(hit) = tri.hit(ray, Interval::new(ray_t.min, closest)) {
                best = Some((hit, idx));
            }
        }
        best
    }

    #[test]
    fn test_tree_matches_brute_force() {
        let triangles = random_triangles(500, 1);
        let tree = TriangleTree::new(triangles.clone());
        let mut rng = StdRng::seed_from_u64(2);
        let ray_t = Interval::new(0.001, f32::INFINITY);

        let mut hits = 0;
        for _ in 0..2000 {
            let origin = random_point(&mut rng, 8.0);
            let target = random_point(&mut rng, 4.0);
            let ray = Ray::new_simple(origin, target - origin);

            let expected = brute_force(&triangles, &ray, ray_t);
            let actual = tree.hit(&ray, ray_t);

            match (expected, actual) {
                (None, None) => {}
                (Some((e, _)), Some((a, _))) => {
                    hits += 1;
                    assert!((e.t - a.t).abs() < 1e-4, "t mismatch: {} vs {}", e.t, a.t);
                }
                (e, a) => panic!("brute force {:?} vs tree {:?}", e.map(|h| h.0.t), a.map(|h| h.0.t)),
            }
        }
        // Make sure the comparison actually exercised hits
        assert!(hits > 100);
    }

    #[test]
    fn test_axis_aligned_rays_match_brute_force() {
        let triangles = random_triangles(200, 4);
        let tree = TriangleTree::new(triangles.clone());
        let mut rng = StdRng::seed_from_u64(5);
        let ray_t = Interval::new(0.001, f32::INFINITY);

        for axis in [Vec3::X, Vec3::Y, Vec3::Z, -Vec3::X, -Vec3::Y, -Vec3::Z] {
            for _ in 0..200 {
                let origin = random_point(&mut rng, 4.0) - axis * 10.0;
                let ray = Ray::new_simple(origin, axis);
                let expected = brute_force(&triangles, &ray, ray_t).map(|h| h.0.t);
                let actual = tree.hit(&ray, ray_t).map(|h| h.0.t);
                match (expected, actual) {
                    (Some(e), Some(a)) => assert!((e - a).abs() < 1e-4),
                    (e, a) => assert_eq!(e, a),
                }
            }
        }
    }

    #[test]
    fn test_triangles_overlap_every_ancestor() {
        let tree = TriangleTree::new(random_triangles(300, 7));
        let mut checked = 0;

        tree.for_each_reference(|idx, path| {
            let tri_box = Aabb::enclosing(&tree.triangles()[idx].vertices());
            for ancestor in path {
                assert!(ancestor.overlaps(&tri_box), "triangle {idx} escapes an ancestor box");
            }
            checked += 1;
        });

        assert!(checked >= 300);
        assert!(tree.stats().depth > 1);
    }

    #[test]
    fn test_every_triangle_is_referenced() {
        let tree = TriangleTree::new(random_triangles(100, 8));
        let mut seen = vec![false; tree.len()];
        tree.for_each_reference(|idx, _| seen[idx] = true);
        assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn test_coincident_triangles_become_leaf() {
        // Many copies of the same triangle cannot be separated
        let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y);
        let tree = TriangleTree::new(vec![tri; 50]);

        let stats = tree.stats();
        assert_eq!(stats.leaves, 1);
        assert_eq!(stats.references, 50);

        let ray = Ray::new_simple(Vec3::new(0.2, 0.2, 1.0), -Vec3::Z);
        let (hit, _) = tree.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_collapsed_points_do_not_recurse() {
        // Zero-area triangles all at one point
        let p = Vec3::splat(2.0);
        let tree = TriangleTree::new(vec![Triangle::new(p, p, p); 20]);
        assert_eq!(tree.stats().nodes, 1);
    }

    #[test]
    fn test_flat_mesh_still_splits() {
        // A grid of triangles in the z = 0 plane
        let mut triangles = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                let o = Vec3::new(i as f32, j as f32, 0.0);
                triangles.push(Triangle::new(o, o + Vec3::X, o + Vec3::Y));
                triangles.push(Triangle::new(o + Vec3::X, o + Vec3::X + Vec3::Y, o + Vec3::Y));
            }
        }
        let tree = TriangleTree::new(triangles);
        assert!(tree.stats().leaves > 1);

        let ray = Ray::new_simple(Vec3::new(4.3, 6.6, 3.0), -Vec3::Z);
        let (hit, _) = tree.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((hit.t - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_tree() {
        let tree = TriangleTree::new(Vec::new());
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::X);
        assert!(tree.hit(&ray, Interval::UNIVERSE).is_none());
        assert_eq!(tree.stats(), TreeStats::default());
    }

    #[test]
    fn test_nearest_neighbour_matches_linear_scan() {
        let mut rng = StdRng::seed_from_u64(21);
        let points: Vec<Vec3> = (0..500).map(|_| random_point(&mut rng, 10.0)).collect();
        let tree = PointTree::build(points.clone());
        assert_eq!(tree.len(), points.len());

        for _ in 0..200 {
            let query = random_point(&mut rng, 12.0);
            let expected = points.iter().copied().min_by(by_distance(query)).unwrap();
            let found = tree.nearest_neighbour(query).unwrap();
            assert!((found.distance(query) - expected.distance(query)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_incremental_insert_matches_build() {
        let mut rng = StdRng::seed_from_u64(22);
        let points: Vec<Vec3> = (0..200).map(|_| random_unit_vector(&mut rng) * 3.0).collect();

        let mut grown = PointTree::new();
        for &p in &points {
            grown.insert(p);
        }
        let built = PointTree::build(points);

        for _ in 0..100 {
            let query = random_point(&mut rng, 4.0);
            let a = grown.nearest_neighbour(query).unwrap();
            let b = built.nearest_neighbour(query).unwrap();
            assert!((a.distance(query) - b.distance(query)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_within_box() {
        let mut rng = StdRng::seed_from_u64(23);
        let points: Vec<Vec3> = (0..400).map(|_| random_point(&mut rng, 5.0)).collect();
        let tree = PointTree::build(points.clone());

        let bbox = Aabb::from_corners(Vec3::new(-1.0, -2.0, 0.0), Vec3::new(2.0, 1.0, 3.0));
        let mut expected: Vec<Vec3> = points.into_iter().filter(|p| bbox.contains_point(*p)).collect();
        let mut found = tree.within(&bbox);

        let key = |a: &Vec3, b: &Vec3| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y));
        expected.sort_by(key);
        found.sort_by(key);
        assert_eq!(found, expected);
    }

    #[test]
    fn test_empty_point_tree() {
        let tree = PointTree::new();
        assert!(tree.nearest_neighbour(Vec3::ZERO).is_none());
        assert!(tree.within(&Aabb::from_corners(Vec3::splat(-1.0), Vec3::ONE)).is_empty());
    }
}
