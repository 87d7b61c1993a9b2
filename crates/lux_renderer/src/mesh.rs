//! Triangle mesh surface backed by a kd-tree.

use crate::kdtree::{PointTree, TreeStats, TriangleTree};
use crate::sampling::gen_f32;
use crate::shape::{ShapeHit, SurfaceSample};
use crate::Triangle;
use lux_core::TriangleMesh;
use lux_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;

/// A renderable triangle mesh.
///
/// Ray queries go through a [`TriangleTree`]; vertex queries through a
/// [`PointTree`]. Both are built once here and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Mesh {
    tree: TriangleTree,
    vertices: PointTree,
    /// Running sum of triangle areas, for area-weighted sampling
    area_cdf: Vec<f32>,
    bbox: Aabb,
}

impl Mesh {
    /// Build the spatial indices for `mesh`.
    pub fn new(mesh: &TriangleMesh) -> Self {
        let triangles: Vec<Triangle> = mesh.triangles().into_iter().map(Triangle::from).collect();
        Self::from_triangles(triangles, mesh.positions.clone())
    }

    /// Build a mesh directly from triangles.
    pub fn from_triangles(triangles: Vec<Triangle>, vertices: Vec<Vec3>) -> Self {
        let area_cdf: Vec<f32> = triangles
            .iter()
            .scan(0.0, |total, tri| {
                *total += tri.area();
                Some(*total)
            })
            .collect();

        let bbox = triangles.iter().fold(Aabb::EMPTY, |acc, tri| {
            Aabb::surrounding(&acc, &tri.bounding_box())
        });

        let tree = TriangleTree::new(triangles);
        let stats = tree.stats();
        log::info!(
            "Loaded mesh triangles: {} (kd-tree depth {}, {} leaves)",
            tree.len(),
            stats.depth,
            stats.leaves
        );

        Self {
            tree,
            vertices: PointTree::build(vertices),
            area_cdf,
            bbox,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.tree.len()
    }

    pub fn tree_stats(&self) -> TreeStats {
        self.tree.stats()
    }

    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<ShapeHit> {
        self.tree.hit(ray, ray_t).map(|(hit, _)| hit)
    }

    /// Mesh vertex closest to `point`.
    pub fn nearest_vertex(&self, point: Vec3) -> Option<Vec3> {
        self.vertices.nearest_neighbour(point)
    }

    /// Mesh vertices inside `bbox`.
    pub fn vertices_within(&self, bbox: &Aabb) -> Vec<Vec3> {
        self.vertices.within(bbox)
    }

    pub fn area(&self) -> f32 {
        self.area_cdf.last().copied().unwrap_or(0.0)
    }

    /// Uniform point over the whole surface: a triangle is chosen with
    /// probability proportional to its area.
    pub fn sample(&self, rng: &mut dyn RngCore) -> Option<SurfaceSample> {
        let total = self.area();
        if total <= 0.0 {
            return None;
        }
        let target = gen_f32(rng) * total;
        let index = self
            .area_cdf
            .partition_point(|&acc| acc <= target)
            .min(self.area_cdf.len() - 1);
        Some(self.tree.triangles()[index].sample(rng))
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Unit cube centered at the origin, 12 triangles.
    fn cube() -> TriangleMesh {
        let positions = vec![
            Vec3::new(-0.5, -0.5, -0.5),
            Vec3::new(0.5, -0.5, -0.5),
            Vec3::new(0.5, 0.5, -0.5),
            Vec3::new(-0.5, 0.5, -0.5),
            Vec3::new(-0.5, -0.5, 0.5),
            Vec3::new(0.5, -0.5, 0.5),
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(-0.5, 0.5, 0.5),
        ];
        let indices = vec![
            0, 2, 1, 0, 3, 2, // back
            4, 5, 6, 4, 6, 7, // front
            0, 1, 5, 0, 5, 4, // bottom
            3, 7, 6, 3, 6, 2, // top
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ];
        TriangleMesh::new(positions, indices, None)
    }

    #[test]
    fn test_mesh_hit() {
        let mesh = Mesh::new(&cube());
        assert_eq!(mesh.triangle_count(), 12);
        let stats = mesh.tree_stats();
        assert!(stats.references >= 12);
        assert!(stats.leaves >= 1 && stats.depth >= 1);

        let ray = Ray::new_simple(Vec3::new(0.1, 0.2, 5.0), -Vec3::Z);
        let hit = mesh.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((hit.t - 4.5).abs() < 1e-5);
        assert!((hit.outward_normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_mesh_area_and_sampling() {
        let mesh = Mesh::new(&cube());
        assert!((mesh.area() - 6.0).abs() < 1e-5);

        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..100 {
            let s = mesh.sample(&mut rng).unwrap();
            // Every sample lies on the cube's surface
            let m = s.point.abs().max_element();
            assert!((m - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_vertex_queries() {
        let mesh = Mesh::new(&cube());

        let nearest = mesh.nearest_vertex(Vec3::new(0.4, 0.6, 0.3)).unwrap();
        assert_eq!(nearest, Vec3::new(0.5, 0.5, 0.5));

        let upper = mesh.vertices_within(&Aabb::from_corners(
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
        ));
        assert_eq!(upper.len(), 4);
        assert!(upper.iter().all(|v| v.y > 0.0));
    }

    #[test]
    fn test_empty_mesh_cannot_be_sampled() {
        let mesh = Mesh::new(&TriangleMesh::new(Vec::new(), Vec::new(), None));
        let mut rng = StdRng::seed_from_u64(1);
        assert!(mesh.sample(&mut rng).is_none());
        assert_eq!(mesh.area(), 0.0);
    }
}
