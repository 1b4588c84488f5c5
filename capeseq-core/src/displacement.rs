//! Clothing displacement computation
//!
//! The displacement field is the per-vertex offset between a clothed and
//! an unclothed body in the same pose. It must be computed from the
//! canonical-pose vertices of both operands; using posed vertices would
//! conflate pose-dependent deformation with the clothing offset.

use crate::error::{Error, Result};
use ndarray::{Array1, Array2};

/// Per-vertex clothing offset: `v_cano - minimal_cano`.
///
/// Both arrays must have the same shape; on mismatch no partial
/// computation is performed. The result is trivially invertible:
/// `minimal_cano = v_cano - disp`.
pub fn displacement(v_cano: &Array2<f64>, minimal_cano: &Array2<f64>) -> Result<Array2<f64>> {
    if v_cano.nrows() != minimal_cano.nrows() {
        return Err(Error::ShapeMismatch {
            expected: minimal_cano.nrows(),
            actual: v_cano.nrows(),
        });
    }
    if v_cano.ncols() != minimal_cano.ncols() {
        return Err(Error::MalformedData(format!(
            "displacement operands have incompatible shapes {:?} and {:?}",
            v_cano.shape(),
            minimal_cano.shape()
        )));
    }
    Ok(v_cano - minimal_cano)
}

/// Euclidean norm of each displacement vector, used to color-encode the
/// displacement field for visualization.
pub fn displacement_norms(disp: &Array2<f64>) -> Array1<f64> {
    disp.rows().into_iter().map(|row| row.dot(&row).sqrt()).collect()
}
