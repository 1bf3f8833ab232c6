use std::io;    // Import I/O module for error handling
use std::path::PathBuf;

/// Errors raised while reading the schema or the PTL input.
/// Malformed records are never reported here: they are skipped by the reader.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),                          // File I/O errors (e.g., file not found)

    #[error("Invalid schema '{schema}': {reason}")]
    Schema { schema: String, reason: String },      // Column schema is not a permutation of x y z i j
}

/// Errors raised while turning a point map into a triangulated surface
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("Empty mesh: no valid PTL records were read")]
    EmptyPointMap,

    #[error("Empty mesh: {points} points but no complete grid cell to triangulate")]
    NoQuads { points: usize },
}

// Writer errors for output operations
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("VTK error: {0}")]
    Vtk(String),
}

impl From<vtkio::Error> for WriterError {
    fn from(err: vtkio::Error) -> Self {
        WriterError::Vtk(format!("{:?}", err))
    }
}

/// Errors of the full PTL -> TS -> VTU -> STL conversion
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Writer(#[from] WriterError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Decimation fraction must be within [0, 1], got {0}")]
    InvalidDecimation(f64),

    #[error("{program} failed: {message}")]
    Tool { program: String, message: String },

    #[error("No .vtu produced in {}", .0.display())]
    NoVtuProduced(PathBuf),
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Config(err.to_string())
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
