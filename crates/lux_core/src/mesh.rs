//! Indexed triangle mesh data.
//!
//! Scene builders populate a [`TriangleMesh`] from any file format (OBJ,
//! PLY, generated geometry) and hand it to the renderer, which builds the
//! spatial index over its triangles.

use lux_math::{Aabb, Vec2, Vec3};

/// A mesh consisting of vertex positions, optional per-vertex normals and
/// uvs, and triangle indices.
///
/// Triangles are wound counter-clockwise: the face normal of `(a, b, c)` is
/// `(b - a) × (c - a)`.
#[derive(Clone, Debug)]
pub struct TriangleMesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional, one per vertex)
    pub normals: Option<Vec<Vec3>>,

    /// Texture coordinates (optional, one per vertex)
    pub uvs: Option<Vec<Vec2>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box of the positions
    pub bounds: Aabb,
}

/// One triangle resolved from a [`TriangleMesh`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshTriangle {
    pub positions: [Vec3; 3],
    pub normals: Option<[Vec3; 3]>,
    pub uvs: Option<[Vec2; 3]>,
}

impl TriangleMesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        let bounds = Aabb::enclosing(&positions);
        Self {
            positions,
            normals,
            uvs: None,
            indices,
            bounds,
        }
    }

    /// Attach per-vertex texture coordinates.
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Compute smooth vertex normals by averaging (area weighted) face
    /// normals of every face sharing the vertex.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            // Default up normal for vertices only used by degenerate faces
            *normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }

        self.normals = Some(normals);
    }

    /// Check if the mesh has normals.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Get the mesh center (mean of the vertex positions).
    pub fn centroid(&self) -> Vec3 {
        if self.positions.is_empty() {
            return Vec3::ZERO;
        }
        self.positions.iter().copied().sum::<Vec3>() / self.positions.len() as f32
    }

    /// Move the mesh so its centroid sits at `location`, scaling it about
    /// the centroid by `scale` first.
    pub fn place(&mut self, location: Vec3, scale: f32) {
        let centroid = self.centroid();
        for p in &mut self.positions {
            *p = (*p - centroid) * scale + location;
        }
        if scale < 0.0 {
            if let Some(normals) = &mut self.normals {
                for n in normals {
                    *n = -*n;
                }
            }
        }
        self.bounds = Aabb::enclosing(&self.positions);
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Resolve the index list into triangles.
    ///
    /// Faces referencing out-of-range vertices are skipped with a warning.
    /// Normals and uvs are only attached when their arrays match the vertex
    /// count.
    pub fn triangles(&self) -> Vec<MeshTriangle> {
        let vertex_count = self.positions.len();
        let normals = self
            .normals
            .as_ref()
            .filter(|normals| normals.len() == vertex_count);
        let uvs = self.uvs.as_ref().filter(|uvs| uvs.len() == vertex_count);

        let mut triangles = Vec::with_capacity(self.triangle_count());

        for chunk in self.indices.chunks_exact(3) {
            let idx = [chunk[0] as usize, chunk[1] as usize, chunk[2] as usize];

            if idx.iter().any(|&i| i >= vertex_count) {
                log::warn!(
                    "Invalid triangle indices: {:?}, vertex count: {}",
                    idx,
                    vertex_count
                );
                continue;
            }

            triangles.push(MeshTriangle {
                positions: idx.map(|i| self.positions[i]),
                normals: normals.map(|n| idx.map(|i| n[i])),
                uvs: uvs.map(|uv| idx.map(|i| uv[i])),
            });
        }

        triangles
    }
}
