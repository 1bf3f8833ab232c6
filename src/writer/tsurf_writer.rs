//! GOCAD TSurf (`.ts`) serialization of a triangulated surface.
//!
//! The document is plain ASCII with `\n` line endings on every platform:
//!
//! ```text
//! GOCAD TSurf 1
//! HEADER{
//! name:<surface name>
//! }
//! GOCAD_ORIGINAL_COORDINATE_SYSTEM
//! ...
//! TFACE
//! VRTX 1 1.00000e+00 2.00000e+00 -3.00 CNXYZ
//! TRGL 1 2 4
//! END
//! ```

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;
use tempfile::NamedTempFile;

use crate::database::SurfaceMesh;
use crate::error::WriterError;

const HEADER_PREFIX: &str = "GOCAD TSurf 1\nHEADER{\n";

const COORDINATE_SYSTEM: &str = "}\n\
GOCAD_ORIGINAL_COORDINATE_SYSTEM\n\
NAME Default\n\
AXIS_NAME \"X\" \"Y\" \"Z\"\n\
AXIS_UNIT \"m\" \"m\" \"m\"\n\
ZPOSITIVE Depth\n\
END_ORIGINAL_COORDINATE_SYSTEM\n\
TFACE\n";

pub struct TSurfWriter;

impl TSurfWriter {
    /// Write `mesh` to `output_path`, creating missing parent directories.
    /// The target only appears once the whole document has been written.
    pub fn write_tsurf<P: AsRef<Path>>(
        mesh: &SurfaceMesh,
        name: &str,
        output_path: P,
    ) -> Result<(), WriterError> {
        let output_path = output_path.as_ref();
        Self::check_mesh(mesh)?;                                        // Nothing is created for an empty mesh

        Self::write_atomically(output_path, |writer| Self::write_to(writer, mesh, name))?;

        info!(
            "Wrote TSurf {} ({} vertices, {} triangles)",
            output_path.display(),
            mesh.num_vertices(),
            mesh.num_triangles()
        );
        Ok(())
    }

    // Stage the output in a temporary file beside the target, then rename it into place.
    // On error the temporary file is dropped (and deleted) and the target is untouched.
    fn write_atomically<F>(output_path: &Path, write: F) -> Result<(), WriterError>
    where
        F: FnOnce(&mut dyn Write) -> Result<(), WriterError>,
    {
        let parent = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut staged = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            write(&mut writer)?;
            writer.flush()?;
        }

        staged.persist(output_path).map_err(|e| WriterError::Io(e.error))?;
        Ok(())
    }

    /// Serialize `mesh` into any writer
    pub fn write_to<W: Write + ?Sized>(writer: &mut W, mesh: &SurfaceMesh, name: &str) -> Result<(), WriterError> {
        Self::check_mesh(mesh)?;

        writer.write_all(HEADER_PREFIX.as_bytes())?;
        writeln!(writer, "name:{}", name)?;
        writer.write_all(COORDINATE_SYSTEM.as_bytes())?;

        for (idx, &[x, y, z]) in mesh.vertices.iter().enumerate() {
            writeln!(
                writer,
                "VRTX {} {} {} {} CNXYZ",
                idx + 1,
                format_scientific(x, 5),
                format_scientific(y, 5),
                format_fixed(z, 2)
            )?;
        }

        for &[a, b, c] in &mesh.triangles {
            writeln!(writer, "TRGL {} {} {}", a, b, c)?;
        }

        writer.write_all(b"END\n")?;
        Ok(())
    }

    // Refuse meshes that would give an unusable document
    fn check_mesh(mesh: &SurfaceMesh) -> Result<(), WriterError> {
        if mesh.is_empty() {
            return Err(WriterError::InvalidData(format!(
                "surface has {} vertices and {} triangles",
                mesh.num_vertices(),
                mesh.num_triangles()
            )));
        }
        let count = mesh.num_vertices();
        if let Some(tri) = mesh.triangles.iter().find(|tri| tri.iter().any(|&v| v == 0 || v > count)) {
            return Err(WriterError::InvalidData(format!(
                "triangle {:?} references a vertex outside 1..={}",
                tri, count
            )));
        }
        Ok(())
    }
}

/// Scientific notation with a signed, at least two digit exponent: `1.23450e+02`
pub fn format_scientific(value: f64, precision: usize) -> String {
    if let Some(text) = non_finite(value) {
        return text.to_string();
    }
    let formatted = format!("{:.*e}", precision, value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => formatted,
    }
}

/// Fixed-point notation: `-3.00`
pub fn format_fixed(value: f64, precision: usize) -> String {
    match non_finite(value) {
        Some(text) => text.to_string(),
        None => format!("{:.*}", precision, value),
    }
}

fn non_finite(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("nan")
    } else if value.is_infinite() {
        Some(if value > 0.0 { "inf" } else { "-inf" })
    } else {
        None
    }
}
