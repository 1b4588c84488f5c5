//! PLY format support
//!
//! ASCII PLY with double-precision vertex positions and optional uchar
//! vertex colors. Also used to read raw scan meshes, which ship as PLY.

use crate::backend::MeshBackend;
use capeseq_core::{Error, Mesh, Point3d, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use ply_rs::{
    parser::Parser,
    writer::Writer,
    ply::{Addable, DefaultElement, ElementDef, Ply, Property, PropertyDef, PropertyType, ScalarType},
};

pub struct PlyBackend;

impl MeshBackend for PlyBackend {
    fn name(&self) -> &'static str {
        "ply"
    }

    fn extension(&self) -> &'static str {
        "ply"
    }

    fn export_mesh(&self, mesh: &Mesh, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let mut ply = Ply::<DefaultElement>::new();

        // Define vertex element
        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = mesh.vertices.len();
        for name in ["x", "y", "z"] {
            vertex_element.properties.add(PropertyDef::new(
                name.to_string(),
                PropertyType::Scalar(ScalarType::Double),
            ));
        }
        if mesh.colors.is_some() {
            for name in ["red", "green", "blue"] {
                vertex_element.properties.add(PropertyDef::new(
                    name.to_string(),
                    PropertyType::Scalar(ScalarType::UChar),
                ));
            }
        }
        ply.header.elements.add(vertex_element);

        // Define face element
        let mut face_element = ElementDef::new("face".to_string());
        face_element.count = mesh.faces.len();
        face_element.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::Int),
        ));
        ply.header.elements.add(face_element);

        // Add vertex data
        let mut vertices = Vec::new();
        for (i, vertex) in mesh.vertices.iter().enumerate() {
            let mut element = DefaultElement::new();
            element.insert("x".to_string(), Property::Double(vertex.x));
            element.insert("y".to_string(), Property::Double(vertex.y));
            element.insert("z".to_string(), Property::Double(vertex.z));
            if let Some(colors) = &mesh.colors {
                let [r, g, b] = colors[i];
                element.insert("red".to_string(), Property::UChar(r));
                element.insert("green".to_string(), Property::UChar(g));
                element.insert("blue".to_string(), Property::UChar(b));
            }
            vertices.push(element);
        }
        ply.payload.insert("vertex".to_string(), vertices);

        // Add face data
        let mut faces = Vec::new();
        for face in &mesh.faces {
            let mut element = DefaultElement::new();
            let indices = vec![face[0] as i32, face[1] as i32, face[2] as i32];
            element.insert("vertex_indices".to_string(), Property::ListInt(indices));
            faces.push(element);
        }
        ply.payload.insert("face".to_string(), faces);

        let writer_instance = Writer::new();
        writer_instance.write_ply(&mut writer, &mut ply)?;

        Ok(())
    }

    fn read_mesh(&self, path: &Path) -> Result<Mesh> {
        if !path.exists() {
            return Err(Error::not_found(path));
        }
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let parser = Parser::<DefaultElement>::new();
        let ply = parser
            .read_ply(&mut reader)
            .map_err(|e| Error::MalformedData(format!("{}: {}", path.display(), e)))?;

        // Extract vertices and, where present, colors
        let mut vertices = Vec::new();
        let mut colors = Vec::new();
        if let Some(vertex_element) = ply.payload.get("vertex") {
            for vertex in vertex_element {
                let x = extract_property_value(vertex, "x")?;
                let y = extract_property_value(vertex, "y")?;
                let z = extract_property_value(vertex, "z")?;
                vertices.push(Point3d::new(x, y, z));

                if let (Ok(r), Ok(g), Ok(b)) = (
                    extract_property_value(vertex, "red"),
                    extract_property_value(vertex, "green"),
                    extract_property_value(vertex, "blue"),
                ) {
                    colors.push([r as u8, g as u8, b as u8]);
                }
            }
        }

        // Extract faces
        let mut faces = Vec::new();
        if let Some(face_element) = ply.payload.get("face") {
            for face in face_element {
                let indices = extract_face_indices(face)?;
                if indices.len() >= 3 {
                    faces.push([indices[0], indices[1], indices[2]]);
                }
            }
        }

        let mut mesh = Mesh::from_vertices_and_faces(vertices, faces);
        if !colors.is_empty() && colors.len() == mesh.vertex_count() {
            mesh.set_vertex_colors(colors)?;
        }
        Ok(mesh)
    }
}

/// Extract a property value as f64 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f64> {
    match element.get(name) {
        Some(Property::Double(val)) => Ok(*val),
        Some(Property::Float(val)) => Ok(*val as f64),
        Some(Property::Int(val)) => Ok(*val as f64),
        Some(Property::UInt(val)) => Ok(*val as f64),
        Some(Property::UChar(val)) => Ok(*val as f64),
        _ => Err(Error::MalformedData(format!(
            "property '{}' not found or invalid type",
            name
        ))),
    }
}

/// Extract face indices from a PLY face element
fn extract_face_indices(element: &DefaultElement) -> Result<Vec<u32>> {
    match element.get("vertex_indices").or_else(|| element.get("vertex_index")) {
        Some(Property::ListInt(indices)) => Ok(indices.iter().map(|&i| i as u32).collect()),
        Some(Property::ListUInt(indices)) => Ok(indices.clone()),
        _ => Err(Error::MalformedData("face indices not found".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capeseq_core::FaceTopology;
    use ndarray::array;

    fn sample_mesh() -> Mesh {
        let verts = array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.5]];
        let topo = FaceTopology::new(vec![[0, 1, 2]]).unwrap();
        Mesh::from_arrays(&verts, &topo).unwrap()
    }

    #[test]
    fn ply_round_trip() {
        let path = std::env::temp_dir().join(format!("capeseq_ply_{}.ply", std::process::id()));
        let mesh = sample_mesh();
        PlyBackend.export_mesh(&mesh, &path).unwrap();

        let loaded = PlyBackend.read_mesh(&path).unwrap();
        assert_eq!(loaded.vertices, mesh.vertices);
        assert_eq!(loaded.faces, mesh.faces);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn ply_round_trip_with_colors() {
        let path = std::env::temp_dir().join(format!("capeseq_ply_c_{}.ply", std::process::id()));
        let mut mesh = sample_mesh();
        mesh.set_uniform_color([0, 255, 0]);
        PlyBackend.export_mesh(&mesh, &path).unwrap();

        let loaded = PlyBackend.read_mesh(&path).unwrap();
        assert_eq!(loaded.colors, mesh.colors);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_ply_is_malformed_data() {
        let path = std::env::temp_dir().join(format!("capeseq_ply_bad_{}.ply", std::process::id()));
        std::fs::write(&path, "this is not a ply header\n").unwrap();

        match PlyBackend.read_mesh(&path) {
            Err(Error::MalformedData(msg)) => assert!(msg.contains("capeseq_ply_bad")),
            other => panic!("expected MalformedData, got {other:?}"),
        }

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_ply_is_not_found() {
        let err = PlyBackend.read_mesh(Path::new("/no/such/mesh.ply")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
