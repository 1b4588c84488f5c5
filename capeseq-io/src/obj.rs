//! OBJ format support
//!
//! Plain-text Wavefront OBJ with the common per-vertex color extension
//! (`v x y z r g b`, color channels in [0, 1]).

use crate::backend::MeshBackend;
use capeseq_core::{Error, Mesh, Point3d, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub struct ObjBackend;

impl MeshBackend for ObjBackend {
    fn name(&self) -> &'static str {
        "obj"
    }

    fn extension(&self) -> &'static str {
        "obj"
    }

    fn export_mesh(&self, mesh: &Mesh, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        for (i, v) in mesh.vertices.iter().enumerate() {
            match &mesh.colors {
                Some(colors) => {
                    let [r, g, b] = colors[i];
                    writeln!(
                        writer,
                        "v {} {} {} {} {} {}",
                        v.x,
                        v.y,
                        v.z,
                        r as f64 / 255.0,
                        g as f64 / 255.0,
                        b as f64 / 255.0
                    )?;
                }
                None => writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?,
            }
        }
        for face in &mesh.faces {
            // OBJ indices are 1-based
            writeln!(writer, "f {} {} {}", face[0] + 1, face[1] + 1, face[2] + 1)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn read_mesh(&self, path: &Path) -> Result<Mesh> {
        if !path.exists() {
            return Err(Error::not_found(path));
        }
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut vertices = Vec::new();
        let mut colors = Vec::new();
        let mut faces = Vec::new();

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("v") => {
                    let coords: Vec<f64> = parts
                        .map(|p| p.parse::<f64>())
                        .collect::<std::result::Result<_, _>>()
                        .map_err(|e| parse_err(path, lineno, &e.to_string()))?;
                    match coords.len() {
                        3 => vertices.push(Point3d::new(coords[0], coords[1], coords[2])),
                        6 => {
                            vertices.push(Point3d::new(coords[0], coords[1], coords[2]));
                            colors.push([
                                (coords[3] * 255.0).round() as u8,
                                (coords[4] * 255.0).round() as u8,
                                (coords[5] * 255.0).round() as u8,
                            ]);
                        }
                        n => {
                            return Err(parse_err(
                                path,
                                lineno,
                                &format!("vertex line with {n} components"),
                            ))
                        }
                    }
                }
                Some("f") => {
                    let indices: Vec<u32> = parts
                        .map(|p| {
                            // accept v, v/vt, v/vt/vn references
                            let first = p.split('/').next().unwrap_or(p);
                            first
                                .parse::<u32>()
                                .map_err(|e| parse_err(path, lineno, &e.to_string()))
                        })
                        .collect::<Result<_>>()?;
                    if indices.len() != 3 {
                        return Err(parse_err(
                            path,
                            lineno,
                            &format!("face with {} vertices (triangles only)", indices.len()),
                        ));
                    }
                    if indices.iter().any(|&i| i == 0) {
                        return Err(parse_err(path, lineno, "zero face index"));
                    }
                    faces.push([indices[0] - 1, indices[1] - 1, indices[2] - 1]);
                }
                // comments, normals, texture coordinates, groups
                _ => {}
            }
        }

        let mut mesh = Mesh::from_vertices_and_faces(vertices, faces);
        if !colors.is_empty() {
            if colors.len() != mesh.vertex_count() {
                return Err(Error::MalformedData(format!(
                    "{}: {} colored of {} vertices",
                    path.display(),
                    colors.len(),
                    mesh.vertex_count()
                )));
            }
            mesh.set_vertex_colors(colors)?;
        }
        Ok(mesh)
    }
}

fn parse_err(path: &Path, lineno: usize, msg: &str) -> Error {
    Error::MalformedData(format!("{}:{}: {}", path.display(), lineno + 1, msg))
}
