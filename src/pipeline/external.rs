// Calls to the external TSurf reader and visualization scripting tool
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::error::{PipelineError, PipelineResult};

/// Script run by the scripting tool: extract surface, clean, triangulate, decimate, save STL.
/// Arguments: `<vtu> <stl> <target reduction>`.
pub const PV_TO_STL_SCRIPT: &str = "import sys
from paraview.simple import OpenDataFile, ExtractSurface, Clean, Decimate
try:
 from paraview.simple import Triangulate
except Exception:
 Triangulate=None
try:
 from paraview.simple import SaveData, SetActiveSource
except Exception:
 pass
vtu, stl, target = sys.argv[1], sys.argv[2], float(sys.argv[3])
src=OpenDataFile(vtu)
surf=ExtractSurface(Input=src)
cln=Clean(Input=surf)
tri=Triangulate(Input=cln) if Triangulate else cln
dec=Decimate(Input=tri); dec.TargetReduction=target
try:
 SaveData(stl, proxy=dec)
except TypeError:
 SetActiveSource(dec); SaveData(stl)";

pub const PV_SCRIPT_NAME: &str = "pv_to_stl_runtime.py";

/// Convert a TSurf file with the external reader and return the VTU files it produced
pub fn ts_to_vtu(ts_path: &Path, vtu_dir: &Path, reader: &str) -> PipelineResult<Vec<PathBuf>> {
    fs::create_dir_all(vtu_dir)?;
    let before: HashSet<PathBuf> = list_vtu(vtu_dir)?.into_iter().collect();

    run_tool(
        Command::new(reader)
            .arg("-i")
            .arg(ts_path)
            .arg("-o")
            .arg(vtu_dir),
        reader,
    )?;

    let mut produced: Vec<PathBuf> = list_vtu(vtu_dir)?
        .into_iter()
        .filter(|p| !before.contains(p))
        .collect();

    // Reader may have overwritten an existing file of the same name
    if produced.is_empty() {
        let stem = ts_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        produced = list_vtu(vtu_dir)?
            .into_iter()
            .filter(|p| file_name(p).starts_with(&stem))
            .collect();
    }

    if produced.is_empty() {
        return Err(PipelineError::NoVtuProduced(vtu_dir.to_path_buf()));
    }
    produced.sort();
    Ok(produced)
}

/// Write the conversion script into `dir`
pub fn write_pv_script(dir: &Path) -> io::Result<PathBuf> {
    let script = dir.join(PV_SCRIPT_NAME);
    fs::write(&script, PV_TO_STL_SCRIPT)?;
    Ok(script)
}

/// Decimate a VTU surface into an STL with the scripting tool
pub fn vtu_to_stl(vtu: &Path, stl: &Path, decimate: f64, pvpython: &str) -> PipelineResult<()> {
    if let Some(parent) = stl.parent() {
        fs::create_dir_all(parent)?;
    }

    let scratch = tempfile::tempdir()?;                                  // Removed when dropped
    let script = write_pv_script(scratch.path())?;

    run_tool(
        Command::new(pvpython)
            .arg(&script)
            .arg(vtu)
            .arg(stl)
            .arg(decimate.to_string()),
        pvpython,
    )
}

// Run to completion; a non-zero exit reports stderr, or stdout when stderr is empty
fn run_tool(command: &mut Command, program: &str) -> PipelineResult<()> {
    debug!("Running {:?}", command);
    let output = command.output().map_err(|e| PipelineError::Tool {
        program: program.to_string(),
        message: format!("cannot start: {}", e),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout).into_owned()
        } else {
            stderr.into_owned()
        };
        return Err(PipelineError::Tool {
            program: program.to_string(),
            message: message.trim().to_string(),
        });
    }
    Ok(())
}

// *.vtu files directly inside `dir`
fn list_vtu(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "vtu") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
