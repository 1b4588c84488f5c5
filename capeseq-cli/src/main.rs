//! capeseq command-line interface
//!
//! Browse, convert and visualize a CAPE-style mesh sequence dataset:
//! run the clothing displacement demo, extract sequences into mesh
//! files, render them into videos, and inspect scan/alignment overlap.

use anyhow::{Context, Result};
use capeseq_core::PoseOption;
use capeseq_io::{BackendKind, Dataset, ExternalRenderer};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "capeseq", version, about = "Browse, convert and visualize clothed-human mesh sequences")]
struct Cli {
    /// Path to the dataset root directory
    #[arg(long, default_value = ".")]
    dataset_dir: PathBuf,

    /// Six-digit subject id, e.g. 00032
    #[arg(long, default_value = "00032")]
    subj: String,

    /// Mesh backend used for exported files (obj or ply)
    #[arg(long, default_value = "obj")]
    backend: BackendKind,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute clothing displacements for one frame and export the
    /// minimal and color-encoded clothed meshes for inspection
    Demo {
        /// Sequence name in the format garment_motion, e.g. shortlong_hips
        #[arg(long)]
        seq: String,
    },
    /// Extract the vertices of a sequence into per-frame mesh files
    Extract {
        #[arg(long)]
        seq: String,
        /// Extract posed or canonical meshes
        #[arg(long, default_value = "posed")]
        option: PoseOption,
    },
    /// Render a sequence into a video, extracting meshes first if needed
    Render {
        #[arg(long)]
        seq: String,
        #[arg(long, default_value = "posed")]
        option: PoseOption,
        /// External command invoked as `<renderer> <mesh_dir> <video>`
        #[arg(long, default_value = "render-mesh-seq")]
        renderer: String,
    },
    /// Inspect whether raw scans and their registrations overlap
    Overlap {
        #[arg(long)]
        seq: String,
        /// How many random scan/alignment pairs to export
        #[arg(long, default_value_t = 5)]
        count: usize,
        /// Do not wait for Enter between pairs
        #[arg(long)]
        no_pause: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let dataset = Dataset::open(&cli.dataset_dir, cli.backend)
        .with_context(|| format!("opening dataset at {}", cli.dataset_dir.display()))?;

    match cli.command {
        Command::Demo { seq } => demo(&dataset, &cli.subj, &seq),
        Command::Extract { seq, option } => {
            let written = dataset.extract_mesh_seq(&cli.subj, &seq, option)?;
            info!(meshes = written.len(), "extraction finished");
            Ok(())
        }
        Command::Render { seq, option, renderer } => {
            let renderer = ExternalRenderer::new(renderer);
            let video = dataset.render_sequence(&cli.subj, &seq, option, &renderer)?;
            println!("wrote {}", video.display());
            Ok(())
        }
        Command::Overlap { seq, count, no_pause } => {
            let mut pause: Box<dyn FnMut(usize, usize)> = if no_pause {
                Box::new(|_, _| {})
            } else {
                Box::new(wait_for_enter)
            };
            let written = dataset.inspect_overlap(&cli.subj, &seq, count, &mut *pause)?;
            info!(pairs = written.len(), "overlap inspection finished");
            Ok(())
        }
    }
}

fn demo(dataset: &Dataset, subj: &str, seq: &str) -> Result<()> {
    if let Ok(gender) = dataset.gender(subj) {
        info!(subject = subj, gender = ?gender, "running displacement demo");
    }
    let demo = dataset.demo_displacements(subj, seq)?;

    let out_dir = dataset.root().join("visualization").join(subj);
    fs::create_dir_all(&out_dir)?;
    let ext = dataset.backend().extension();
    let minimal_out = out_dir.join(format!("{seq}_minimal.{ext}"));
    let clothed_out = out_dir.join(format!("{seq}_clothed_disps.{ext}"));
    dataset.backend().export_mesh(&demo.minimal, &minimal_out)?;
    dataset.backend().export_mesh(&demo.clothed, &clothed_out)?;

    let max = demo.norms.iter().cloned().fold(0.0_f64, f64::max);
    let mean = demo.norms.mean().unwrap_or(0.0);
    println!("frame: {}", demo.frame_path.display());
    println!("clothing displacement norm: mean {mean:.4}, max {max:.4}");
    println!("minimal body:    {}", minimal_out.display());
    println!("clothed, colored by displacement norm: {}", clothed_out.display());
    Ok(())
}

fn wait_for_enter(ordinal: usize, frame: usize) {
    print!("pair {} (frame {frame:04}) written, press Enter to continue ", ordinal + 1);
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
