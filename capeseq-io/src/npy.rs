//! NPY array loading for auxiliary dataset files

use capeseq_core::{Error, Result};
use ndarray::Array2;
use ndarray_npy::ReadNpyExt;
use std::fs::File;
use std::path::Path;

/// Read an N x 3 `f64` array, e.g. a subject's minimal body shape.
pub fn read_f64_2d<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::not_found(path));
    }
    let file = File::open(path)?;
    Array2::<f64>::read_npy(file)
        .map_err(|e| Error::MalformedData(format!("{}: {}", path.display(), e)))
}

/// Read an F x 3 `u32` index array, e.g. the face topology table.
pub fn read_u32_2d<P: AsRef<Path>>(path: P) -> Result<Array2<u32>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::not_found(path));
    }
    let file = File::open(path)?;
    Array2::<u32>::read_npy(file)
        .map_err(|e| Error::MalformedData(format!("{}: {}", path.display(), e)))
}
