//! NPZ frame archive reading and writing
//!
//! Each frame of a sequence is stored as one NPZ archive keyed by four
//! named arrays: `v_cano`, `v_posed`, `pose` and `transl`.

use capeseq_core::{Error, Frame, Result};
use ndarray::{Array1, Array2};
use ndarray_npy::{NpzReader, NpzWriter, ReadNpzError};
use std::fs::File;
use std::path::Path;

const KEY_V_CANO: &str = "v_cano";
const KEY_V_POSED: &str = "v_posed";
const KEY_POSE: &str = "pose";
const KEY_TRANSL: &str = "transl";

/// Load one data frame from an NPZ archive.
///
/// Fails with `NotFound` if the path does not exist and with
/// `MalformedData` if any of the four expected entries is absent or has
/// an unexpected shape. Pure read, no caching.
pub fn read_frame<P: AsRef<Path>>(path: P) -> Result<Frame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::not_found(path));
    }
    let file = File::open(path)?;
    let mut npz = NpzReader::new(file)
        .map_err(|e| Error::MalformedData(format!("{}: {}", path.display(), e)))?;

    let v_cano: Array2<f64> = entry(&mut npz, path, KEY_V_CANO)?;
    let v_posed: Array2<f64> = entry(&mut npz, path, KEY_V_POSED)?;
    let pose: Array1<f64> = entry(&mut npz, path, KEY_POSE)?;
    let transl: Array1<f64> = entry(&mut npz, path, KEY_TRANSL)?;

    Frame::new(v_cano, v_posed, pose, transl)
}

fn entry<S, D>(npz: &mut NpzReader<File>, path: &Path, key: &str) -> Result<ndarray::ArrayBase<S, D>>
where
    S: ndarray::DataOwned,
    S::Elem: ndarray_npy::ReadableElement,
    D: ndarray::Dimension,
{
    npz.by_name(key).map_err(|e| match e {
        ReadNpzError::Zip(_) => Error::MalformedData(format!(
            "{}: missing entry '{}'",
            path.display(),
            key
        )),
        other => Error::MalformedData(format!(
            "{}: entry '{}': {}",
            path.display(),
            key,
            other
        )),
    })
}

/// Write one data frame as an NPZ archive. Used by tests and by tools
/// that synthesize frames.
pub fn write_frame<P: AsRef<Path>>(path: P, frame: &Frame) -> Result<()> {
    let path = path.as_ref();
    let mut npz = NpzWriter::new(File::create(path)?);
    npz.add_array(KEY_V_CANO, &frame.v_cano).map_err(write_err)?;
    npz.add_array(KEY_V_POSED, &frame.v_posed).map_err(write_err)?;
    npz.add_array(KEY_POSE, &frame.pose).map_err(write_err)?;
    npz.add_array(KEY_TRANSL, &frame.transl).map_err(write_err)?;
    npz.finish().map_err(write_err)?;
    Ok(())
}

fn write_err(e: ndarray_npy::WriteNpzError) -> Error {
    Error::Io(std::io::Error::other(e.to_string()))
}
