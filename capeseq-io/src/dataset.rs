//! Dataset accessor
//!
//! Resolves the on-disk layout of a CAPE-style dataset root:
//!
//! ```text
//! <root>/misc/smpl_tris.npy            shared face topology
//! <root>/misc/subj_genders.json        subject id -> gender
//! <root>/minimal_body_shape/<subj>/<subj>_minimal.npy
//! <root>/sequences/<subj>/<seq>/*.npz  frame archives
//! <root>/raw_scans/<subj>/<seq>/*.ply  raw scans (millimeters)
//! <root>/meshes/, <root>/visualization/, <root>/scans_inspect/  outputs
//! ```
//!
//! The face topology is loaded once when the dataset is opened and owned
//! by the accessor; every consumer receives it explicitly.

use crate::backend::{BackendKind, MeshBackend};
use crate::ply::PlyBackend;
use crate::video::VideoRenderer;
use crate::{npy, npz};
use capeseq_core::{
    displacement, displacement_norms, Error, FaceTopology, Frame, Mesh, PoseOption, Result,
    SMPL_POSE_DIM,
};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Subject gender, from the per-dataset lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Result of the displacement demo for one frame.
pub struct DisplacementDemo {
    /// The frame archive the demo was computed from.
    pub frame_path: PathBuf,
    /// Minimal body in canonical pose.
    pub minimal: Mesh,
    /// Clothed body in canonical pose, colored by displacement norm.
    pub clothed: Mesh,
    /// Per-vertex clothing offsets.
    pub displacements: Array2<f64>,
    /// Euclidean norm of each offset.
    pub norms: Array1<f64>,
}

/// Accessor for one dataset root.
pub struct Dataset {
    root: PathBuf,
    faces: FaceTopology,
    backend: Box<dyn MeshBackend>,
}

impl Dataset {
    /// Open a dataset root, loading the shared face topology.
    pub fn open(root: impl Into<PathBuf>, backend: BackendKind) -> Result<Self> {
        let root = root.into();
        let tris = npy::read_u32_2d(root.join("misc").join("smpl_tris.npy"))?;
        let faces = FaceTopology::from_array(&tris)?;
        info!(
            vertices = faces.vertex_count(),
            faces = faces.face_count(),
            backend = %backend,
            "opened dataset"
        );
        Ok(Self { root, faces, backend: backend.create() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn faces(&self) -> &FaceTopology {
        &self.faces
    }

    pub fn backend(&self) -> &dyn MeshBackend {
        self.backend.as_ref()
    }

    /// Look up a subject's gender in `misc/subj_genders.json`.
    pub fn gender(&self, subj: &str) -> Result<Gender> {
        let path = self.root.join("misc").join("subj_genders.json");
        if !path.exists() {
            return Err(Error::not_found(path));
        }
        let table: HashMap<String, Gender> = serde_json::from_reader(File::open(&path)?)
            .map_err(|e| Error::MalformedData(format!("{}: {}", path.display(), e)))?;
        table
            .get(subj)
            .copied()
            .ok_or_else(|| Error::MalformedData(format!("no gender entry for subject {subj}")))
    }

    /// Load a subject's minimal (unclothed) body shape in canonical pose.
    pub fn minimal_shape(&self, subj: &str) -> Result<Array2<f64>> {
        let path = self
            .root
            .join("minimal_body_shape")
            .join(subj)
            .join(format!("{subj}_minimal.npy"));
        let shape = npy::read_f64_2d(&path)?;
        self.faces.check_vertices(&shape)?;
        Ok(shape)
    }

    /// Load one frame archive and validate it against the topology.
    pub fn load_frame(&self, path: &Path) -> Result<Frame> {
        let frame = npz::read_frame(path)?;
        if frame.vertex_count() != self.faces.vertex_count() {
            return Err(Error::MalformedData(format!(
                "{}: {} vertices, topology expects {}",
                path.display(),
                frame.vertex_count(),
                self.faces.vertex_count()
            )));
        }
        if frame.pose.len() != SMPL_POSE_DIM {
            return Err(Error::MalformedData(format!(
                "{}: pose has {} parameters, expected {}",
                path.display(),
                frame.pose.len(),
                SMPL_POSE_DIM
            )));
        }
        Ok(frame)
    }

    /// Directory holding the frame archives of one sequence.
    pub fn sequence_dir(&self, subj: &str, seq: &str) -> PathBuf {
        self.root.join("sequences").join(subj).join(seq)
    }

    /// Sorted frame archives of one sequence. An empty list is a valid
    /// outcome; a missing sequence directory is not.
    pub fn frame_files(&self, subj: &str, seq: &str) -> Result<Vec<PathBuf>> {
        let dir = self.sequence_dir(subj, seq);
        sorted_files(&dir, "npz")
    }

    /// Directory meshes of one sequence are extracted into.
    pub fn mesh_dir(&self, subj: &str, seq: &str, option: PoseOption) -> PathBuf {
        self.root
            .join("meshes")
            .join(subj)
            .join(seq)
            .join(option.as_str())
    }

    /// Extract the vertices of every frame of a sequence into per-frame
    /// mesh files through the configured backend. Returns the written
    /// paths; an empty sequence yields an empty Vec.
    pub fn extract_mesh_seq(
        &self,
        subj: &str,
        seq: &str,
        option: PoseOption,
    ) -> Result<Vec<PathBuf>> {
        let files = self.frame_files(subj, seq)?;
        let mesh_dir = self.mesh_dir(subj, seq, option);
        fs::create_dir_all(&mesh_dir)?;
        info!(
            subject = subj,
            sequence = seq,
            option = %option,
            frames = files.len(),
            "extracting meshes"
        );

        let mut written = Vec::with_capacity(files.len());
        for path in &files {
            let frame = self.load_frame(path)?;
            let mesh = Mesh::from_arrays(frame.vertices(option), &self.faces)?;
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| Error::MalformedData(format!("bad frame name: {}", path.display())))?;
            let out = mesh_dir.join(format!("{stem}.{}", self.backend.extension()));
            self.backend.export_mesh(&mesh, &out)?;
            written.push(out);
        }
        Ok(written)
    }

    /// Render a sequence into a video, extracting the meshes first if
    /// the mesh directory is missing or empty.
    pub fn render_sequence(
        &self,
        subj: &str,
        seq: &str,
        option: PoseOption,
        renderer: &dyn VideoRenderer,
    ) -> Result<PathBuf> {
        let mesh_dir = self.mesh_dir(subj, seq, option);
        let has_meshes = mesh_dir.is_dir() && fs::read_dir(&mesh_dir)?.next().is_some();
        if !has_meshes {
            self.extract_mesh_seq(subj, seq, option)?;
        }

        let video_dir = self.root.join("visualization").join(subj);
        fs::create_dir_all(&video_dir)?;
        let video_path = video_dir.join(format!("{seq}_{option}.mp4"));
        renderer.render(&mesh_dir, &video_path)?;
        Ok(video_path)
    }

    /// Compute clothing displacements for the first frame of a sequence.
    ///
    /// Displacements are taken in the canonical pose of both operands,
    /// never from posed vertices.
    pub fn demo_displacements(&self, subj: &str, seq: &str) -> Result<DisplacementDemo> {
        let minimal = self.minimal_shape(subj)?;
        let files = self.frame_files(subj, seq)?;
        // one frame is enough for the demo
        let frame_path = files
            .first()
            .cloned()
            .ok_or_else(|| Error::not_found(self.sequence_dir(subj, seq).join("*.npz")))?;
        let frame = self.load_frame(&frame_path)?;

        let displacements = displacement(&frame.v_cano, &minimal)?;
        let norms = displacement_norms(&displacements);

        let minimal_mesh = Mesh::from_arrays(&minimal, &self.faces)?;
        let mut clothed = Mesh::from_arrays(&frame.v_cano, &self.faces)?;
        clothed.set_vertex_colors_from_weights(&norms)?;

        Ok(DisplacementDemo {
            frame_path,
            minimal: minimal_mesh,
            clothed,
            displacements,
            norms,
        })
    }

    /// Inspect whether raw scans and their registrations overlap.
    ///
    /// Pairs the sorted scan PLYs with the sorted alignment archives,
    /// picks `count` random pairs and writes each pair under distinct
    /// names (`scan_NNNN`, `align_NNNN`) so the two never collide. The
    /// pause hook runs after each written pair with the sequential
    /// ordinal of the pair and the sampled frame index.
    pub fn inspect_overlap(
        &self,
        subj: &str,
        seq: &str,
        count: usize,
        pause: &mut dyn FnMut(usize, usize),
    ) -> Result<Vec<(PathBuf, PathBuf)>> {
        let aligned_dir = self.sequence_dir(subj, seq);
        let scan_dir = self.root.join("raw_scans").join(subj).join(seq);
        let aligns = sorted_files(&aligned_dir, "npz")?;
        let scans = sorted_files(&scan_dir, "ply")?;
        if aligns.len() != scans.len() {
            return Err(Error::PreconditionViolation(format!(
                "{} {}: {} alignments vs {} raw scans",
                subj,
                seq,
                aligns.len(),
                scans.len()
            )));
        }
        if scans.is_empty() {
            return Ok(Vec::new());
        }

        let out_dir = self.root.join("scans_inspect").join(subj).join(seq);
        fs::create_dir_all(&out_dir)?;

        let mut indices: Vec<usize> = (0..scans.len()).collect();
        indices.shuffle(&mut rand::thread_rng());
        indices.truncate(count);

        let ext = self.backend.extension();
        let mut written = Vec::with_capacity(indices.len());
        for (k, &i) in indices.iter().enumerate() {
            // scans always ship as PLY, whatever the configured backend
            let mut scan = PlyBackend.read_mesh(&scans[i])?;
            // raw scan data are in millimeters
            scan.scale(1.0 / 1000.0);
            scan.set_uniform_color([0, 255, 0]);

            let frame = self.load_frame(&aligns[i])?;
            let mut align = Mesh::from_arrays(&frame.v_posed, &self.faces)?;
            align.set_uniform_color([255, 0, 0]);

            let scan_out = out_dir.join(format!("scan_{i:04}.{ext}"));
            let align_out = out_dir.join(format!("align_{i:04}.{ext}"));
            self.backend.export_mesh(&scan, &scan_out)?;
            self.backend.export_mesh(&align, &align_out)?;
            info!(
                scan = %scan_out.display(),
                alignment = %align_out.display(),
                "wrote overlap pair"
            );
            written.push((scan_out, align_out));
            pause(k, i);
        }
        Ok(written)
    }
}

/// Sorted files with the given extension. Missing directory is
/// `NotFound`; a directory without matches yields an empty Vec.
fn sorted_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::not_found(dir));
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some(extension))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use ndarray_npy::WriteNpyExt;

    /// Lay out a tiny synthetic dataset under a temp root: a 4-vertex
    /// 2-face topology, one subject with a minimal shape, a gender
    /// table and `frames` archives in one sequence.
    fn make_dataset(tag: &str, frames: usize) -> PathBuf {
        let root = std::env::temp_dir().join(format!("capeseq_ds_{}_{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("misc")).unwrap();

        let tris = array![[0u32, 1, 2], [2, 1, 3]];
        tris.write_npy(File::create(root.join("misc").join("smpl_tris.npy")).unwrap()).unwrap();
        fs::write(
            root.join("misc").join("subj_genders.json"),
            r#"{"00032": "male", "00134": "female"}"#,
        )
        .unwrap();

        let minimal = array![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0]
        ];
        let minimal_dir = root.join("minimal_body_shape").join("00032");
        fs::create_dir_all(&minimal_dir).unwrap();
        minimal.write_npy(File::create(minimal_dir.join("00032_minimal.npy")).unwrap()).unwrap();

        let seq_dir = root.join("sequences").join("00032").join("shortlong_hips");
        fs::create_dir_all(&seq_dir).unwrap();
        for k in 0..frames {
            let offset = 0.1 * (k + 1) as f64;
            let v_cano = &minimal + offset;
            let v_posed = &minimal + (offset + 1.0);
            let frame = Frame::new(
                v_cano,
                v_posed,
                Array1::zeros(SMPL_POSE_DIM),
                array![0.0, 0.0, offset],
            )
            .unwrap();
            npz::write_frame(seq_dir.join(format!("frame_{k:03}.npz")), &frame).unwrap();
        }

        root
    }

    #[test]
    fn open_requires_topology() {
        let root = std::env::temp_dir().join(format!("capeseq_ds_empty_{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).unwrap();
        assert!(matches!(
            Dataset::open(&root, BackendKind::Obj),
            Err(Error::NotFound { .. })
        ));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn gender_lookup() {
        let root = make_dataset("gender", 0);
        let dataset = Dataset::open(&root, BackendKind::Obj).unwrap();
        assert_eq!(dataset.gender("00032").unwrap(), Gender::Male);
        assert_eq!(dataset.gender("00134").unwrap(), Gender::Female);
        assert!(matches!(
            dataset.gender("99999"),
            Err(Error::MalformedData(_))
        ));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn extract_writes_one_mesh_per_frame() {
        let root = make_dataset("extract", 3);
        let dataset = Dataset::open(&root, BackendKind::Obj).unwrap();
        let written = dataset
            .extract_mesh_seq("00032", "shortlong_hips", PoseOption::Posed)
            .unwrap();
        assert_eq!(written.len(), 3);
        for path in &written {
            assert!(path.exists());
            assert_eq!(path.extension().unwrap(), "obj");
        }
        // paths come out in frame order
        assert!(written.windows(2).all(|w| w[0] < w[1]));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn extract_of_empty_sequence_is_not_an_error() {
        let root = make_dataset("empty", 0);
        let dataset = Dataset::open(&root, BackendKind::Obj).unwrap();
        let written = dataset
            .extract_mesh_seq("00032", "shortlong_hips", PoseOption::Canonical)
            .unwrap();
        assert!(written.is_empty());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_sequence_is_not_found() {
        let root = make_dataset("missing_seq", 0);
        let dataset = Dataset::open(&root, BackendKind::Obj).unwrap();
        assert!(matches!(
            dataset.frame_files("00032", "no_such_seq"),
            Err(Error::NotFound { .. })
        ));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn demo_colors_the_clothed_mesh() {
        let root = make_dataset("demo", 2);
        let dataset = Dataset::open(&root, BackendKind::Ply).unwrap();
        let demo = dataset.demo_displacements("00032", "shortlong_hips").unwrap();

        // every vertex of frame 0 is offset by 0.1 in x, y and z
        let expected = (3.0f64 * 0.1 * 0.1).sqrt();
        for &n in demo.norms.iter() {
            assert_abs_diff_eq!(n, expected, epsilon = 1e-12);
        }
        assert!(demo.clothed.colors.is_some());
        assert!(demo.minimal.colors.is_none());
        assert_eq!(demo.displacements.nrows(), dataset.faces().vertex_count());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn overlap_requires_matching_counts() {
        let root = make_dataset("overlap", 2);
        let scan_dir = root.join("raw_scans").join("00032").join("shortlong_hips");
        fs::create_dir_all(&scan_dir).unwrap();
        // one scan for two alignments
        let scan = Mesh::from_vertices_and_faces(
            vec![capeseq_core::Point3d::new(0.0, 0.0, 0.0)],
            vec![[0, 0, 0]],
        );
        PlyBackend.export_mesh(&scan, &scan_dir.join("frame_000.ply")).unwrap();

        let dataset = Dataset::open(&root, BackendKind::Obj).unwrap();
        let mut pause = |_: usize, _: usize| {};
        assert!(matches!(
            dataset.inspect_overlap("00032", "shortlong_hips", 5, &mut pause),
            Err(Error::PreconditionViolation(_))
        ));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn overlap_writes_distinct_scan_and_alignment_files() {
        let root = make_dataset("overlap_ok", 2);
        let scan_dir = root.join("raw_scans").join("00032").join("shortlong_hips");
        fs::create_dir_all(&scan_dir).unwrap();
        let scan = Mesh::from_vertices_and_faces(
            vec![
                capeseq_core::Point3d::new(0.0, 0.0, 0.0),
                capeseq_core::Point3d::new(1000.0, 0.0, 0.0),
                capeseq_core::Point3d::new(0.0, 1000.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        for k in 0..2 {
            PlyBackend.export_mesh(&scan, &scan_dir.join(format!("frame_{k:03}.ply"))).unwrap();
        }

        let dataset = Dataset::open(&root, BackendKind::Obj).unwrap();
        let mut ordinals = Vec::new();
        let mut pause = |k: usize, i: usize| {
            assert!(i < 2);
            ordinals.push(k);
        };
        let written = dataset
            .inspect_overlap("00032", "shortlong_hips", 2, &mut pause)
            .unwrap();
        assert_eq!(written.len(), 2);
        // the hook counts pairs in order, whatever frames were sampled
        assert_eq!(ordinals, vec![0, 1]);
        for (scan_out, align_out) in &written {
            assert_ne!(scan_out, align_out);
            assert!(scan_out.exists());
            assert!(align_out.exists());
        }
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn frame_with_foreign_topology_is_malformed() {
        let root = make_dataset("foreign", 1);
        let dataset = Dataset::open(&root, BackendKind::Obj).unwrap();

        let bad = Frame::new(
            array![[0.0, 0.0, 0.0]],
            array![[0.0, 0.0, 0.0]],
            Array1::zeros(SMPL_POSE_DIM),
            array![0.0, 0.0, 0.0],
        )
        .unwrap();
        let bad_path = root.join("bad_frame.npz");
        npz::write_frame(&bad_path, &bad).unwrap();

        assert!(matches!(
            dataset.load_frame(&bad_path),
            Err(Error::MalformedData(_))
        ));
        let _ = fs::remove_dir_all(&root);
    }
}
