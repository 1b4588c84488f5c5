//! Shared face topology

use crate::error::{Error, Result};
use ndarray::Array2;

/// The fixed set of vertex-index triples shared by every mesh of a
/// dataset. Loaded once per dataset root and passed explicitly to each
/// consumer; immutable after construction.
#[derive(Debug, Clone)]
pub struct FaceTopology {
    faces: Vec<[u32; 3]>,
    vertex_count: usize,
}

impl FaceTopology {
    /// Build a topology from index triples. The implied vertex count is
    /// the largest referenced index plus one.
    pub fn new(faces: Vec<[u32; 3]>) -> Result<Self> {
        if faces.is_empty() {
            return Err(Error::MalformedData("face topology is empty".into()));
        }
        let max_index = faces.iter().flatten().copied().max().unwrap_or(0);
        Ok(Self { faces, vertex_count: max_index as usize + 1 })
    }

    /// Build a topology from an F x 3 index array.
    pub fn from_array(tris: &Array2<u32>) -> Result<Self> {
        if tris.ncols() != 3 {
            return Err(Error::MalformedData(format!(
                "face topology must be F x 3, got {} columns",
                tris.ncols()
            )));
        }
        let faces = tris.rows().into_iter().map(|r| [r[0], r[1], r[2]]).collect();
        Self::new(faces)
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of vertices every rigged mesh must carry.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Check that a vertex array is compatible with this topology.
    pub fn check_vertices(&self, vertices: &Array2<f64>) -> Result<()> {
        if vertices.nrows() != self.vertex_count {
            return Err(Error::ShapeMismatch {
                expected: self.vertex_count,
                actual: vertices.nrows(),
            });
        }
        Ok(())
    }
}
