//! Video rendering via an external command
//!
//! Rendering a mesh sequence to a video is delegated to an external
//! tool. The tool is opaque to the rest of the crate: it receives the
//! directory of ordered mesh files and the output path, and either
//! produces the video or fails.

use capeseq_core::{Error, Result};
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Renders a directory of ordered mesh files into a video file.
pub trait VideoRenderer {
    fn render(&self, mesh_dir: &Path, video_path: &Path) -> Result<()>;
}

/// Invokes `<program> [args..] <mesh_dir> <video_path>`.
pub struct ExternalRenderer {
    program: String,
    args: Vec<String>,
}

impl ExternalRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    /// Extra arguments passed before the mesh directory and output path.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl VideoRenderer for ExternalRenderer {
    fn render(&self, mesh_dir: &Path, video_path: &Path) -> Result<()> {
        info!(
            program = %self.program,
            meshes = %mesh_dir.display(),
            video = %video_path.display(),
            "rendering mesh sequence"
        );
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(mesh_dir)
            .arg(video_path)
            .status()
            .map_err(|e| Error::Render(format!("failed to launch '{}': {}", self.program, e)))?;
        if !status.success() {
            return Err(Error::Render(format!(
                "'{}' exited with {}",
                self.program, status
            )));
        }
        if !video_path.exists() {
            return Err(Error::Render(format!(
                "'{}' produced no video at {}",
                self.program,
                video_path.display()
            )));
        }
        Ok(())
    }
}
