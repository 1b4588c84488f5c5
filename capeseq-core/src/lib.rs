//! Core data structures for capeseq
//!
//! This crate provides the data model for clothed-human mesh sequence
//! datasets: per-frame vertex arrays, the shared face topology, the
//! clothing displacement computation, and a small mesh type used by the
//! export backends.

pub mod displacement;
pub mod error;
pub mod frame;
pub mod mesh;
pub mod topology;

pub use displacement::*;
pub use error::*;
pub use frame::*;
pub use mesh::*;
pub use topology::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

/// Common result type for capeseq operations
pub type Result<T> = std::result::Result<T, Error>;
