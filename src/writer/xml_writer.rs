use vtkio::model::*; // import model definition of a VTK file

use std::fs;
use std::path::Path;

use log::info;

use crate::database::SurfaceMesh;
use crate::error::WriterError;

pub struct VTUWriter;  // Writes a triangulated surface as a VTK XML unstructured grid (.vtu)

impl VTUWriter {

    /// In-process replacement for the external TSurf reader: one triangle cell per TRGL
    pub fn write_vtu<P: AsRef<Path>>(
        mesh: &SurfaceMesh,
        output_path: P,
    ) -> Result<(), WriterError> {
        let output_path = output_path.as_ref();
        if mesh.is_empty() {
            return Err(WriterError::InvalidData("cannot write an empty surface to VTU".to_string()));
        }

        let mut vtu = Vec::new();  // Serialized XML is collected in memory, then written in one go

        // 1. Prepare points data
        let points_data: Vec<f64> = mesh
            .vertices
            .iter()
            .flat_map(|vertex| vertex.iter().copied())
            .collect();

        // 2. Connectivity is 0-based in VTK, triangles are 1-based
        let mut connectivity = Vec::with_capacity(mesh.triangles.len() * 3);
        let mut offsets = Vec::with_capacity(mesh.triangles.len());
        let mut current_offset = 0;

        for triangle in &mesh.triangles {
            for &vertex in triangle {
                if vertex == 0 || vertex > mesh.vertices.len() {
                    return Err(WriterError::InvalidData(format!(
                        "triangle {:?} references a vertex outside 1..={}",
                        triangle,
                        mesh.vertices.len()
                    )));
                }
                connectivity.push((vertex - 1) as u64);
            }
            current_offset += 3;
            offsets.push(current_offset);
        }

        let cell_types = vec![CellType::Triangle; mesh.triangles.len()];

        Vtk {
            version: Version { major: 1, minor: 0 },
            title: String::new(),
            byte_order: ByteOrder::LittleEndian,
            file_path: None,
            data: DataSet::inline(UnstructuredGridPiece {
                points: IOBuffer::F64(points_data),
                cells: Cells {
                    cell_verts: VertexNumbers::XML {
                        connectivity,
                        offsets,
                    },
                    types: cell_types,
                },
                data: Attributes {
                    ..Default::default()
                },
            }),
        }.write_xml(&mut vtu)?;

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write the vector to file
        fs::write(output_path, &vtu)?;

        info!(
            "Wrote VTU {} ({} points, {} triangles)",
            output_path.display(),
            mesh.num_vertices(),
            mesh.num_triangles()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_triangle_grid() {
        let mesh = SurfaceMesh {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
            triangles: vec![[1, 2, 4], [1, 4, 3]],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vtu").join("quad.vtu");

        VTUWriter::write_vtu(&mesh, &path).unwrap();

        let xml = fs::read_to_string(&path).unwrap();
        assert!(xml.contains("UnstructuredGrid"));
        assert!(xml.contains("NumberOfPoints=\"4\""));
        assert!(xml.contains("NumberOfCells=\"2\""));
    }

    #[test]
    fn rejects_empty_surface() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.vtu");
        assert!(matches!(
            VTUWriter::write_vtu(&SurfaceMesh::default(), &path),
            Err(WriterError::InvalidData(_))
        ));
        assert!(!path.exists());
    }
}
