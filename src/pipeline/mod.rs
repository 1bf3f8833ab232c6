//! PTL -> TS -> VTU -> STL conversion.
//!
//! The core stage (`ptl_to_ts`) reads the point list, triangulates it and writes the
//! TSurf document. The remaining stages hand that file to external tools and stage
//! their outputs under `<out>/ts`, `<out>/vtu` and `<out>/stl`.

pub mod config;
pub mod external;

pub use config::PipelineConfig;

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::database::SurfaceMesh;
use crate::error::PipelineResult;
use crate::mesh_builder::GridTriangulator;
use crate::parser::ptl::PtlParser;
use crate::writer::{TSurfWriter, VTUWriter};

/// Files produced by a full conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutputs {
    pub ts: PathBuf,
    pub vtus: Vec<PathBuf>,
    pub stls: Vec<PathBuf>,
}

/// File name with up to two trailing `.ptl` / `.ts` extensions removed (case-insensitive)
pub fn canonical_base(path: &Path) -> String {
    let mut base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    for _ in 0..2 {
        let lower = base.to_ascii_lowercase();
        if lower.ends_with(".ptl") {
            base.truncate(base.len() - 4);
        } else if lower.ends_with(".ts") {
            base.truncate(base.len() - 3);
        }
    }
    base
}

/// Core stage: read the PTL file, triangulate it and write the TSurf document.
/// The schema is validated before the input is touched; nothing is written on failure.
pub fn ptl_to_ts(ptl_path: &Path, ts_out: &Path, config: &PipelineConfig) -> PipelineResult<SurfaceMesh> {
    let schema = config.validate()?;

    PtlParser::normalize_line_endings(ptl_path)?;
    let points = PtlParser::parse_file(ptl_path, &schema, config.negate_z)?;
    let mesh = GridTriangulator::build(&points, config.diagonal)?;

    let name = ptl_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    TSurfWriter::write_tsurf(&mesh, &name, ts_out)?;
    Ok(mesh)
}

/// Run every stage for one PTL file
pub fn run(ptl_path: &Path, out_dir: &Path, config: &PipelineConfig) -> PipelineResult<PipelineOutputs> {
    config.validate()?;

    let ts_dir = out_dir.join("ts");
    let vtu_dir = out_dir.join("vtu");
    let stl_dir = out_dir.join("stl");
    for dir in [&ts_dir, &vtu_dir, &stl_dir] {
        fs::create_dir_all(dir)?;
    }

    let base = canonical_base(ptl_path);
    let ts_path = ts_dir.join(format!("{}.ts", base));
    info!("[PTL→TS] {} → {}", ptl_path.display(), ts_path.display());
    let mesh = ptl_to_ts(ptl_path, &ts_path, config)?;

    let mut outputs = PipelineOutputs { ts: ts_path, vtus: Vec::new(), stls: Vec::new() };
    if config.ts_only {
        info!("Done. TS→ {}", outputs.ts.display());
        return Ok(outputs);
    }

    info!("[TS→VTU] {} → {}", outputs.ts.display(), vtu_dir.display());
    outputs.vtus = if config.native_vtu {
        let vtu = vtu_dir.join(format!("{}.vtu", base));
        VTUWriter::write_vtu(&mesh, &vtu)?;
        vec![vtu]
    } else {
        let produced = external::ts_to_vtu(&outputs.ts, &vtu_dir, &config.ogs_reader)?;
        stage_vtus(produced, &vtu_dir, &base)
    };

    for vtu in &outputs.vtus {
        let stem = vtu.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let stl = stl_dir.join(format!("{}.stl", stem));
        info!("[VTU→STL] {} → {} (decimate={})", vtu.display(), stl.display(), config.decimate);
        external::vtu_to_stl(vtu, &stl, config.decimate, &config.pvpython)?;
        outputs.stls.push(stl);
    }

    info!(
        "Done. TS→ {}, VTU→ {}, STL→ {}",
        outputs.ts.display(),
        vtu_dir.display(),
        stl_dir.display()
    );
    Ok(outputs)
}

/// Rename reader outputs to `<base>.vtu`, or `<base>_NN.vtu` when there are several.
/// A failed rename is logged and the target name is still reported.
pub fn stage_vtus(produced: Vec<PathBuf>, vtu_dir: &Path, base: &str) -> Vec<PathBuf> {
    let single = produced.len() == 1;
    produced
        .into_iter()
        .enumerate()
        .map(|(n, vtu)| {
            let target = if single {
                vtu_dir.join(format!("{}.vtu", base))
            } else {
                vtu_dir.join(format!("{}_{:02}.vtu", base, n + 1))
            };
            if !same_file(&vtu, &target) {
                if let Err(e) = fs::rename(&vtu, &target) {
                    warn!("Could not rename {} to {}: {}", vtu.display(), target.display(), e);
                }
            }
            target
        })
        .collect()
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_base_strips_two_known_extensions() {
        assert_eq!(canonical_base(Path::new("dir/horizon.ptl")), "horizon");
        assert_eq!(canonical_base(Path::new("horizon.PTL")), "horizon");
        assert_eq!(canonical_base(Path::new("horizon.ts.ptl")), "horizon");
        assert_eq!(canonical_base(Path::new("horizon.ptl.ptl.ptl")), "horizon.ptl");
        assert_eq!(canonical_base(Path::new("horizon.txt")), "horizon.txt");
    }

    #[test]
    fn stage_single_and_multiple_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let produced = dir.path().join("reader_out.vtu");
        fs::write(&produced, "one").unwrap();
        let staged = stage_vtus(vec![produced.clone()], dir.path(), "horizon");
        assert_eq!(staged, vec![dir.path().join("horizon.vtu")]);
        assert!(!produced.exists());
        assert_eq!(fs::read_to_string(&staged[0]).unwrap(), "one");

        let parts: Vec<PathBuf> = ["p1.vtu", "p2.vtu"].iter().map(|n| dir.path().join(n)).collect();
        for p in &parts {
            fs::write(p, "").unwrap();
        }
        let staged = stage_vtus(parts, dir.path(), "horizon");
        assert_eq!(
            staged,
            vec![dir.path().join("horizon_01.vtu"), dir.path().join("horizon_02.vtu")]
        );
        assert!(staged.iter().all(|p| p.exists()));
    }
}
