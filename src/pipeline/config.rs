use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::database::{ColumnSchema, DiagonalMode};
use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_SCHEMA: &str = "x y z i j";
pub const DEFAULT_DECIMATE: f64 = 0.85;
pub const DEFAULT_PVPYTHON: &str = "pvpython";
pub const DEFAULT_OGS_READER: &str = "GocadTSurfaceReader";

/// Settings of one PTL -> TS -> VTU -> STL conversion.
/// Missing JSON fields fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub schema: String,             // Column order of the PTL records
    pub negate_z: bool,             // Store -z (depth positive) instead of z
    pub diagonal: DiagonalMode,     // Cell split used for the whole surface
    pub decimate: f64,              // Target reduction handed to the scripting tool, in [0, 1]
    pub pvpython: String,           // Visualization scripting executable
    pub ogs_reader: String,         // TSurf -> VTU reader executable
    pub native_vtu: bool,           // Write the VTU with vtkio instead of calling the reader
    pub ts_only: bool,              // Stop once the TSurf file is written
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            schema: DEFAULT_SCHEMA.to_string(),
            negate_z: true,
            diagonal: DiagonalMode::Forward,
            decimate: DEFAULT_DECIMATE,
            pvpython: env::var("PVPYTHON").unwrap_or_else(|_| DEFAULT_PVPYTHON.to_string()),
            ogs_reader: env::var("OGS_GOCAD_READER").unwrap_or_else(|_| DEFAULT_OGS_READER.to_string()),
            native_vtu: false,
            ts_only: false,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> PipelineResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Check value ranges and return the parsed column schema
    pub fn validate(&self) -> PipelineResult<ColumnSchema> {
        if !(0.0..=1.0).contains(&self.decimate) {
            return Err(PipelineError::InvalidDecimation(self.decimate));
        }
        Ok(ColumnSchema::parse(&self.schema)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_negate_z_forward_diagonal() {
        let config = PipelineConfig::default();
        assert_eq!(config.schema, "x y z i j");
        assert!(config.negate_z);
        assert_eq!(config.diagonal, DiagonalMode::Forward);
        assert_eq!(config.decimate, 0.85);
        assert!(!config.native_vtu);
        assert_eq!(config.validate().unwrap(), ColumnSchema::default());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json(r#"{ "schema": "i j x y z", "diagonal": "bwd", "negate_z": false }"#).unwrap();
        assert_eq!(config.diagonal, DiagonalMode::Backward);
        assert!(!config.negate_z);
        assert_eq!(config.decimate, DEFAULT_DECIMATE);
        assert_eq!(config.validate().unwrap().i, 0);
    }

    #[test]
    fn rejects_unknown_fields_and_bad_values() {
        assert!(matches!(
            PipelineConfig::from_json(r#"{ "decimation": 0.5 }"#),
            Err(PipelineError::Config(_))
        ));

        let config = PipelineConfig { decimate: 1.5, ..PipelineConfig::default() };
        assert!(matches!(config.validate(), Err(PipelineError::InvalidDecimation(_))));

        let config = PipelineConfig { schema: "x y z".to_string(), ..PipelineConfig::default() };
        assert!(matches!(config.validate(), Err(PipelineError::Parse(_))));
    }
}
