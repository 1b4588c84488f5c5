//! Interchangeable mesh-processing backends
//!
//! Mesh export is polymorphic over a small capability set (export mesh,
//! read mesh, set vertex colors). The backend is chosen once at
//! configuration time; call sites only see the trait object.

use crate::{ObjBackend, PlyBackend};
use capeseq_core::{Mesh, Result};
use std::path::Path;

/// Capability set implemented by every mesh backend.
pub trait MeshBackend: Send + Sync {
    /// Get the backend name
    fn name(&self) -> &'static str;

    /// File extension of the meshes this backend produces
    fn extension(&self) -> &'static str;

    /// Write a mesh to the given path
    fn export_mesh(&self, mesh: &Mesh, path: &Path) -> Result<()>;

    /// Read a mesh from the given path
    fn read_mesh(&self, path: &Path) -> Result<Mesh>;

    /// Attach one RGB color per vertex before export
    fn set_vertex_colors(&self, mesh: &mut Mesh, colors: Vec<[u8; 3]>) -> Result<()> {
        mesh.set_vertex_colors(colors)
    }
}

/// Which concrete backend to instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Obj,
    Ply,
}

impl BackendKind {
    /// Instantiate the chosen backend.
    pub fn create(self) -> Box<dyn MeshBackend> {
        match self {
            BackendKind::Obj => Box::new(ObjBackend),
            BackendKind::Ply => Box::new(PlyBackend),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Obj => f.write_str("obj"),
            BackendKind::Ply => f.write_str("ply"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "obj" => Ok(BackendKind::Obj),
            "ply" => Ok(BackendKind::Ply),
            other => Err(format!("unknown mesh backend '{other}' (expected 'obj' or 'ply')")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_backends() {
        assert_eq!(BackendKind::Obj.create().extension(), "obj");
        assert_eq!(BackendKind::Ply.create().extension(), "ply");
    }

    #[test]
    fn kind_parses() {
        assert_eq!("obj".parse::<BackendKind>().unwrap(), BackendKind::Obj);
        assert_eq!("ply".parse::<BackendKind>().unwrap(), BackendKind::Ply);
        assert!("stl".parse::<BackendKind>().is_err());
    }
}
