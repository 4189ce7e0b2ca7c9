use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Structural defects in a [`TriangleMesh`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("position buffer length {len} is not a multiple of 3")]
    PositionsNotTriples { len: usize },

    #[error("vertex count {count} is not a multiple of 3 for a non-indexed mesh")]
    VerticesNotTriangles { count: usize },

    #[error("index buffer length {len} is not a multiple of 3")]
    IndicesNotTriples { len: usize },

    #[error("index {index} out of range (vertex count = {vertex_count})")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("mesh has no triangles")]
    Empty,
}

/// A triangle mesh in flat buffers, as uploaded to a renderer.
///
/// With `indices == None` the mesh is a triangle soup: every three
/// consecutive vertices form one triangle. With `Some(indices)` vertices are
/// shared and every three indices form one triangle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// Vertex positions [x, y, z, x, y, z, ...]
    pub positions: Vec<f32>,
    /// Vertex normals [nx, ny, nz, ...], same length as `positions`.
    pub normals: Vec<f32>,
    /// Triangle indices [i0, i1, i2, ...], if indexed.
    pub indices: Option<Vec<u32>>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a triangle soup and derive normals from vertex winding.
    pub fn from_soup(positions: Vec<f32>) -> Self {
        let mut mesh = Self {
            positions,
            normals: Vec::new(),
            indices: None,
        };
        mesh.compute_vertex_normals();
        mesh
    }

    /// Build an indexed mesh and derive normals from vertex winding.
    pub fn indexed(positions: Vec<f32>, indices: Vec<u32>) -> Self {
        let mut mesh = Self {
            positions,
            normals: Vec::new(),
            indices: Some(indices),
        };
        mesh.compute_vertex_normals();
        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.vertex_count() / 3,
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Vertex indices of triangle `t`.
    #[inline]
    pub fn triangle(&self, t: usize) -> [usize; 3] {
        match &self.indices {
            Some(indices) => [
                indices[t * 3] as usize,
                indices[t * 3 + 1] as usize,
                indices[t * 3 + 2] as usize,
            ],
            None => [t * 3, t * 3 + 1, t * 3 + 2],
        }
    }

    /// Write vertex `i` into `out` in double precision.
    #[inline]
    pub fn load_vertex(&self, i: usize, out: &mut Vector3<f64>) {
        let p = &self.positions[i * 3..i * 3 + 3];
        out.x = p[0] as f64;
        out.y = p[1] as f64;
        out.z = p[2] as f64;
    }

    pub fn vertex(&self, i: usize) -> Vector3<f64> {
        let mut v = Vector3::zeros();
        self.load_vertex(i, &mut v);
        v
    }

    /// Check buffer shapes and index ranges so per-triangle access cannot
    /// go out of bounds.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.positions.len() % 3 != 0 {
            return Err(MeshError::PositionsNotTriples {
                len: self.positions.len(),
            });
        }
        let vertex_count = self.vertex_count();
        match &self.indices {
            Some(indices) => {
                if indices.len() % 3 != 0 {
                    return Err(MeshError::IndicesNotTriples { len: indices.len() });
                }
                if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                    return Err(MeshError::IndexOutOfRange {
                        index,
                        vertex_count,
                    });
                }
            }
            None => {
                if vertex_count % 3 != 0 {
                    return Err(MeshError::VerticesNotTriangles {
                        count: vertex_count,
                    });
                }
            }
        }
        if self.triangle_count() == 0 {
            return Err(MeshError::Empty);
        }
        Ok(())
    }

    /// Recompute per-vertex normals from triangle winding, ignoring any
    /// normals the source file carried. Shared vertices average the
    /// area-weighted normals of their triangles; degenerate triangles
    /// contribute nothing and isolated vertices keep a zero normal.
    pub fn compute_vertex_normals(&mut self) {
        self.normals.clear();
        self.normals.resize(self.positions.len(), 0.0);
        if self.validate().is_err() {
            return;
        }

        let mut a = Vector3::zeros();
        let mut b = Vector3::zeros();
        let mut c = Vector3::zeros();
        for t in 0..self.triangle_count() {
            let [i0, i1, i2] = self.triangle(t);
            self.load_vertex(i0, &mut a);
            self.load_vertex(i1, &mut b);
            self.load_vertex(i2, &mut c);
            let n = (b - a).cross(&(c - a));
            for i in [i0, i1, i2] {
                self.normals[i * 3] += n.x as f32;
                self.normals[i * 3 + 1] += n.y as f32;
                self.normals[i * 3 + 2] += n.z as f32;
            }
        }

        for n in self.normals.chunks_mut(3) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            if len > 0.0 {
                n[0] /= len;
                n[1] /= len;
                n[2] /= len;
            }
        }
    }

    /// Axis-aligned bounds of all vertices, or `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if self.positions.len() < 3 {
            return None;
        }
        let mut bb = BoundingBox::empty();
        for p in self.positions.chunks_exact(3) {
            bb.expand(&Vector3::new(p[0] as f64, p[1] as f64, p[2] as f64));
        }
        Some(bb)
    }

    pub fn translate(&mut self, offset: &Vector3<f64>) {
        for p in self.positions.chunks_exact_mut(3) {
            p[0] += offset.x as f32;
            p[1] += offset.y as f32;
            p[2] += offset.z as f32;
        }
    }

    /// Move the bounding-box center onto the vertical axis (X = Z = 0),
    /// leaving Y untouched. Returns the bounds after the move.
    pub fn center_horizontally(&mut self) -> Option<BoundingBox> {
        let bb = self.bounding_box()?;
        let center = bb.center();
        let offset = Vector3::new(-center.x, 0.0, -center.z);
        self.translate(&offset);
        Some(bb.translated(&offset))
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
}

impl BoundingBox {
    /// An inverted box that any point expands.
    pub fn empty() -> Self {
        Self {
            min: Vector3::repeat(f64::INFINITY),
            max: Vector3::repeat(f64::NEG_INFINITY),
        }
    }

    pub fn expand(&mut self, p: &Vector3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn center(&self) -> Vector3<f64> {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn translated(&self, offset: &Vector3<f64>) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Bed placement data (height, vertical center, lift to the bed plane).
    pub fn to_mesh_bounds(&self) -> quote_types::MeshBounds {
        quote_types::MeshBounds::from_extents(
            [self.min.x, self.min.y, self.min.z],
            [self.max.x, self.max.y, self.max.z],
        )
    }
}
