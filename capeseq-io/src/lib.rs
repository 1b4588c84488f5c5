//! I/O operations for capeseq
//!
//! This crate reads the on-disk layout of a CAPE-style mesh sequence
//! dataset (NPZ frame archives, NPY auxiliary arrays, a JSON gender
//! table), exports meshes through interchangeable OBJ/PLY backends, and
//! drives an external command to render extracted sequences into videos.

pub mod backend;
pub mod dataset;
pub mod npy;
pub mod npz;
pub mod obj;
pub mod ply;
pub mod video;

pub use backend::{BackendKind, MeshBackend};
pub use dataset::{Dataset, DisplacementDemo, Gender};
pub use npz::{read_frame, write_frame};
pub use obj::ObjBackend;
pub use ply::PlyBackend;
pub use video::{ExternalRenderer, VideoRenderer};
