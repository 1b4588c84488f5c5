//! Mesh data structure used by the export backends

use crate::error::{Error, Result};
use crate::topology::FaceTopology;
use ndarray::{Array1, Array2};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A triangle mesh with vertices, faces and optional per-vertex colors.
///
/// Faces are shared across all frames of a dataset, so meshes built from
/// frame data all reference the same topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Point3d>,
    pub faces: Vec<[u32; 3]>,
    pub colors: Option<Vec<[u8; 3]>>,
}

impl Mesh {
    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3d>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces, colors: None }
    }

    /// Build a mesh from an N x 3 vertex array and the shared topology.
    pub fn from_arrays(vertices: &Array2<f64>, topology: &FaceTopology) -> Result<Self> {
        topology.check_vertices(vertices)?;
        let vertices = vertices
            .rows()
            .into_iter()
            .map(|r| Point3d::new(r[0], r[1], r[2]))
            .collect();
        Ok(Self {
            vertices,
            faces: topology.faces().to_vec(),
            colors: None,
        })
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Set one RGB color per vertex.
    pub fn set_vertex_colors(&mut self, colors: Vec<[u8; 3]>) -> Result<()> {
        if colors.len() != self.vertices.len() {
            return Err(Error::ShapeMismatch {
                expected: self.vertices.len(),
                actual: colors.len(),
            });
        }
        self.colors = Some(colors);
        Ok(())
    }

    /// Paint every vertex with the same color.
    pub fn set_uniform_color(&mut self, color: [u8; 3]) {
        self.colors = Some(vec![color; self.vertices.len()]);
    }

    /// Color-encode one scalar weight per vertex with a jet-style ramp.
    /// Weights are normalized by their maximum before mapping.
    pub fn set_vertex_colors_from_weights(&mut self, weights: &Array1<f64>) -> Result<()> {
        if weights.len() != self.vertices.len() {
            return Err(Error::ShapeMismatch {
                expected: self.vertices.len(),
                actual: weights.len(),
            });
        }
        let max = weights.iter().cloned().fold(0.0_f64, f64::max);
        let scale = if max > 0.0 { 1.0 / max } else { 0.0 };
        let colors = weights.iter().map(|&w| jet(w * scale)).collect();
        self.colors = Some(colors);
        Ok(())
    }

    /// Uniformly scale all vertex positions, e.g. to convert raw scans
    /// from millimeters to meters.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.vertices {
            v.coords *= factor;
        }
    }
}

/// Map t in [0, 1] to an RGB color on the jet ramp.
fn jet(t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let channel = |x: f64| (255.0 * (1.5 - x.abs()).clamp(0.0, 1.0)).round() as u8;
    [
        channel(4.0 * t - 3.0),
        channel(4.0 * t - 2.0),
        channel(4.0 * t - 1.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn topo() -> FaceTopology {
        FaceTopology::new(vec![[0, 1, 2]]).unwrap()
    }

    #[test]
    fn from_arrays_checks_topology() {
        let verts = array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let mesh = Mesh::from_arrays(&verts, &topo()).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);

        let short = array![[0.0, 0.0, 0.0]];
        assert!(matches!(
            Mesh::from_arrays(&short, &topo()),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn weights_color_the_extremes() {
        let verts = array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let mut mesh = Mesh::from_arrays(&verts, &topo()).unwrap();
        mesh.set_vertex_colors_from_weights(&array![0.0, 0.5, 1.0]).unwrap();
        let colors = mesh.colors.as_ref().unwrap();
        // zero weight sits at the blue end, max weight at the red end
        assert_eq!(colors[0][0], 0);
        assert!(colors[0][2] > 0);
        assert!(colors[2][0] > 0);
        assert_eq!(colors[2][2], 0);
    }

    #[test]
    fn zero_weights_do_not_divide_by_zero() {
        let verts = array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let mut mesh = Mesh::from_arrays(&verts, &topo()).unwrap();
        mesh.set_vertex_colors_from_weights(&array![0.0, 0.0, 0.0]).unwrap();
        assert!(mesh.colors.is_some());
    }

    #[test]
    fn color_count_must_match_vertices() {
        let verts = array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let mut mesh = Mesh::from_arrays(&verts, &topo()).unwrap();
        assert!(matches!(
            mesh.set_vertex_colors(vec![[0, 0, 0]; 2]),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn scale_converts_units() {
        let verts = array![[1000.0, 2000.0, -500.0], [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
        let mut mesh = Mesh::from_arrays(&verts, &topo()).unwrap();
        mesh.scale(1.0 / 1000.0);
        assert_eq!(mesh.vertices[0], Point3d::new(1.0, 2.0, -0.5));
    }
}
