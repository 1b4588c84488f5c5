//! Per-frame data of a mesh sequence

use crate::error::{Error, Result};
use ndarray::{Array1, Array2};

/// Dimensionality of the SMPL pose parameter vector (24 joints x 3).
pub const SMPL_POSE_DIM: usize = 72;

/// Whether an operation works on the posed or the canonical vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseOption {
    Posed,
    Canonical,
}

impl PoseOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoseOption::Posed => "posed",
            PoseOption::Canonical => "canonical",
        }
    }
}

impl std::fmt::Display for PoseOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PoseOption {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "posed" => Ok(PoseOption::Posed),
            "canonical" => Ok(PoseOption::Canonical),
            other => Err(format!("unknown pose option '{other}' (expected 'posed' or 'canonical')")),
        }
    }
}

/// One timestep of one subject/sequence.
///
/// A frame is read-only: it is materialized on demand from a frame
/// archive, never mutated, and discarded after use.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Clothed vertices in canonical pose (with pose-dependent clothing
    /// deformation), N x 3.
    pub v_cano: Array2<f64>,
    /// Clothed vertices, posed and translated, N x 3.
    pub v_posed: Array2<f64>,
    /// SMPL pose parameters of this frame.
    pub pose: Array1<f64>,
    /// Translation of the posed mesh in the global coordinate frame.
    pub transl: Array1<f64>,
}

impl Frame {
    /// Assemble a frame, validating the basic array shapes.
    pub fn new(
        v_cano: Array2<f64>,
        v_posed: Array2<f64>,
        pose: Array1<f64>,
        transl: Array1<f64>,
    ) -> Result<Self> {
        if v_cano.ncols() != 3 {
            return Err(Error::MalformedData(format!(
                "v_cano must be N x 3, got {} columns",
                v_cano.ncols()
            )));
        }
        if v_posed.ncols() != 3 {
            return Err(Error::MalformedData(format!(
                "v_posed must be N x 3, got {} columns",
                v_posed.ncols()
            )));
        }
        if v_cano.nrows() != v_posed.nrows() {
            return Err(Error::MalformedData(format!(
                "canonical and posed vertex counts differ: {} vs {}",
                v_cano.nrows(),
                v_posed.nrows()
            )));
        }
        if transl.len() != 3 {
            return Err(Error::MalformedData(format!(
                "transl must have 3 elements, got {}",
                transl.len()
            )));
        }
        Ok(Self { v_cano, v_posed, pose, transl })
    }

    /// Number of vertices in this frame.
    pub fn vertex_count(&self) -> usize {
        self.v_cano.nrows()
    }

    /// The vertex array selected by `option`.
    pub fn vertices(&self, option: PoseOption) -> &Array2<f64> {
        match option {
            PoseOption::Posed => &self.v_posed,
            PoseOption::Canonical => &self.v_cano,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn verts() -> Array2<f64> {
        array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
    }

    #[test]
    fn frame_accepts_consistent_arrays() {
        let frame = Frame::new(verts(), verts(), Array1::zeros(SMPL_POSE_DIM), array![0.0, 0.0, 0.0]).unwrap();
        assert_eq!(frame.vertex_count(), 3);
        assert_eq!(frame.vertices(PoseOption::Canonical), &frame.v_cano);
        assert_eq!(frame.vertices(PoseOption::Posed), &frame.v_posed);
    }

    #[test]
    fn frame_rejects_bad_translation() {
        let err = Frame::new(verts(), verts(), Array1::zeros(SMPL_POSE_DIM), array![0.0, 0.0]).unwrap_err();
        assert!(matches!(err, Error::MalformedData(_)));
    }

    #[test]
    fn frame_rejects_vertex_count_disagreement() {
        let short = array![[0.0, 0.0, 0.0]];
        let err = Frame::new(verts(), short, Array1::zeros(SMPL_POSE_DIM), array![0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, Error::MalformedData(_)));
    }

    #[test]
    fn pose_option_parses() {
        assert_eq!("posed".parse::<PoseOption>().unwrap(), PoseOption::Posed);
        assert_eq!("canonical".parse::<PoseOption>().unwrap(), PoseOption::Canonical);
        assert!("other".parse::<PoseOption>().is_err());
    }
}
