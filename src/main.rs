// Import standard library modules for system interaction
use std::env;                    // Provides access to command line arguments via env::args()
use std::path::PathBuf;
use std::process;                // Enables process::exit() for terminating with error codes

use log::error;

use ptl2surf::database::DiagonalMode;
use ptl2surf::pipeline::{self, PipelineConfig};

/// Parsed command line arguments
#[derive(Debug)]
struct CommandLineArgs {
    ptl_file: PathBuf,               // PTL point list to convert
    out_dir: PathBuf,                // Root of the ts/, vtu/ and stl/ output folders
    config: PipelineConfig,          // Defaults, then --config file, then individual flags
}

/// Settings given on the command line, applied on top of the config file
#[derive(Debug, Clone, PartialEq)]
enum Override {
    KeepZ,                           // --keep-z
    NativeVtu,                       // --native-vtu
    TsOnly,                          // --ts-only
    Decimate(f64),                   // --decimate <f>
    Pvpython(String),                // --pvpython <exe>
    OgsReader(String),               // --ogs-reader <exe>
    Schema(String),                  // --schema <s>
    Diagonal(DiagonalMode),          // --diagonal <fwd|bwd>
}

impl Override {
    fn apply(self, config: &mut PipelineConfig) {
        match self {
            Override::KeepZ => config.negate_z = false,
            Override::NativeVtu => config.native_vtu = true,
            Override::TsOnly => config.ts_only = true,
            Override::Decimate(value) => config.decimate = value,
            Override::Pvpython(exe) => config.pvpython = exe,
            Override::OgsReader(exe) => config.ogs_reader = exe,
            Override::Schema(schema) => config.schema = schema,
            Override::Diagonal(mode) => config.diagonal = mode,
        }
    }
}

/// Parse command line arguments and validate them according to program requirements
fn parse_arguments(args: &[String]) -> Result<CommandLineArgs, String> {
    let mut ptl_file: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;
    let mut config_file: Option<PathBuf> = None;
    let mut overrides: Vec<Override> = Vec::new();   // Applied after the config file is loaded

    // Start parsing from index 1 (skip program name at index 0)
    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();

        // Flags without a value
        match flag {
            "--keep-z" => overrides.push(Override::KeepZ),
            "--native-vtu" => overrides.push(Override::NativeVtu),
            "--ts-only" => overrides.push(Override::TsOnly),
            _ => {
                i += 1; // Move to next argument for the value
                let next = args.get(i);
                let value = || next.cloned().ok_or_else(|| format!("Missing value for {}", flag));
                match flag {
                    "--ptl" => ptl_file = Some(PathBuf::from(value()?)),
                    "--out-dir" => out_dir = Some(PathBuf::from(value()?)),
                    "--config" => config_file = Some(PathBuf::from(value()?)),
                    "--decimate" => {
                        let raw = value()?;
                        let decimate = raw
                            .parse::<f64>()
                            .map_err(|_| format!("Invalid decimation value: {}", raw))?;
                        overrides.push(Override::Decimate(decimate));
                    }
                    "--pvpython" => overrides.push(Override::Pvpython(value()?)),
                    "--ogs-reader" => overrides.push(Override::OgsReader(value()?)),
                    "--schema" => overrides.push(Override::Schema(value()?)),
                    "--diagonal" => overrides.push(Override::Diagonal(value()?.parse::<DiagonalMode>()?)),
                    _ => return Err(format!("Unknown argument: {}", flag)),
                }
            }
        }
        i += 1;
    }

    let ptl_file = ptl_file.ok_or("--ptl is required")?;
    let out_dir = out_dir.ok_or("--out-dir is required")?;

    let mut config = match config_file {
        Some(path) => PipelineConfig::from_file(&path).map_err(|e| e.to_string())?,
        None => PipelineConfig::default(),
    };
    for setting in overrides {
        setting.apply(&mut config);
    }

    Ok(CommandLineArgs { ptl_file, out_dir, config })
}

/// Print usage information
fn print_usage(program_name: &str) {
    eprintln!("Usage: {} --ptl <file.ptl> --out-dir <dir> [OPTIONS]", program_name);
    eprintln!();
    eprintln!("Converts a grid-indexed PTL point list: PTL → TS → VTU → STL");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --decimate <f>        Target reduction for the STL, in [0, 1] (default: 0.85)");
    eprintln!("  --pvpython <exe>      Scripting tool (default: $PVPYTHON or pvpython)");
    eprintln!("  --ogs-reader <exe>    TSurf reader (default: $OGS_GOCAD_READER or GocadTSurfaceReader)");
    eprintln!("  --schema <s>          Column order of the records (default: \"x y z i j\")");
    eprintln!("  --diagonal <fwd|bwd>  Diagonal used to split grid cells (default: fwd)");
    eprintln!("  --keep-z              Keep z as read instead of negating it");
    eprintln!("  --native-vtu          Write the VTU directly instead of calling the reader");
    eprintln!("  --ts-only             Stop after writing the TSurf file");
    eprintln!("  --config <file.json>  Load settings from JSON; flags override it");
    eprintln!();
    eprintln!("Set RUST_LOG=debug to see skipped PTL lines and tool invocations.");
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args: Vec<String> = env::args().collect();
    let program_name = args.first().map(String::as_str).unwrap_or("ptl2surf");

    if args.iter().skip(1).any(|a| a == "--help" || a == "-h") {
        print_usage(program_name);
        return;
    }

    let cmd_args = match parse_arguments(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage(program_name);
            process::exit(2);
        }
    };

    if let Err(e) = pipeline::run(&cmd_args.ptl_file, &cmd_args.out_dir, &cmd_args.config) {
        error!("{}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("ptl2surf").chain(list.iter().copied()).map(String::from).collect()
    }

    #[test]
    fn requires_input_and_output() {
        assert!(parse_arguments(&args(&["--out-dir", "out"])).is_err());
        assert!(parse_arguments(&args(&["--ptl", "a.ptl"])).is_err());
        assert!(parse_arguments(&args(&["--ptl"])).is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let parsed = parse_arguments(&args(&[
            "--ptl", "a.ptl", "--out-dir", "out", "--decimate", "0.5", "--diagonal", "bwd", "--keep-z",
            "--native-vtu", "--schema", "i,j,x,y,z",
        ]))
        .unwrap();
        assert_eq!(parsed.ptl_file, PathBuf::from("a.ptl"));
        assert_eq!(parsed.config.decimate, 0.5);
        assert_eq!(parsed.config.diagonal, DiagonalMode::Backward);
        assert!(!parsed.config.negate_z);
        assert!(parsed.config.native_vtu);
        assert_eq!(parsed.config.schema, "i,j,x,y,z");
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{ "diagonal": "bwd", "decimate": 0.2, "ts_only": true }"#).unwrap();
        let config_arg = config_path.to_string_lossy().into_owned();

        let parsed = parse_arguments(&args(&[
            "--decimate", "0.7", "--ptl", "a.ptl", "--config", &config_arg, "--out-dir", "out", "--diagonal", "fwd",
        ]))
        .unwrap();
        assert_eq!(parsed.config.decimate, 0.7);
        assert_eq!(parsed.config.diagonal, DiagonalMode::Forward);
        assert!(parsed.config.ts_only);
    }

    #[test]
    fn every_override_reaches_the_config() {
        let mut config = PipelineConfig::default();
        for setting in [
            Override::KeepZ,
            Override::NativeVtu,
            Override::TsOnly,
            Override::Decimate(0.25),
            Override::Pvpython("pv".to_string()),
            Override::OgsReader("reader".to_string()),
            Override::Schema("j i z y x".to_string()),
            Override::Diagonal(DiagonalMode::Backward),
        ] {
            setting.apply(&mut config);
        }
        assert!(!config.negate_z && config.native_vtu && config.ts_only);
        assert_eq!(config.decimate, 0.25);
        assert_eq!(config.pvpython, "pv");
        assert_eq!(config.ogs_reader, "reader");
        assert_eq!(config.schema, "j i z y x");
        assert_eq!(config.diagonal, DiagonalMode::Backward);
    }

    #[test]
    fn rejects_unknown_flags_and_bad_values() {
        assert!(parse_arguments(&args(&["--ptl", "a", "--out-dir", "o", "--fast"])).is_err());
        assert!(parse_arguments(&args(&["--ptl", "a", "--out-dir", "o", "--decimate", "lots"])).is_err());
        assert!(parse_arguments(&args(&["--ptl", "a", "--out-dir", "o", "--diagonal", "up"])).is_err());
    }
}
