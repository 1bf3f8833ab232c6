use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ParseError;

/// Logical (i, j) position of a sample inside the structured grid
pub type GridIndex = (i64, i64);

/// Sparse grid: each index holds at most one (x, y, z) sample, last write wins
pub type PointMap = HashMap<GridIndex, [f64; 3]>;

/// Column positions of the five fields of a PTL record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSchema {
    pub x: usize,                   // Column holding the x coordinate
    pub y: usize,                   // Column holding the y coordinate
    pub z: usize,                   // Column holding the z coordinate (depth or elevation)
    pub i: usize,                   // Column holding the grid row index
    pub j: usize,                   // Column holding the grid column index
}

impl Default for ColumnSchema {
    fn default() -> Self {
        ColumnSchema { x: 0, y: 1, z: 2, i: 3, j: 4 }
    }
}

impl ColumnSchema {
    /// Number of tokens a record needs before every field can be read
    pub fn min_columns(&self) -> usize {
        [self.x, self.y, self.z, self.i, self.j]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Field names ordered by column position
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = vec![
            (self.x, "x"),
            (self.y, "y"),
            (self.z, "z"),
            (self.i, "i"),
            (self.j, "j"),
        ];
        fields.sort_by_key(|&(pos, _)| pos);
        fields.into_iter().map(|(_, name)| name).collect()
    }
}

impl fmt::Display for ColumnSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field_names().join(" "))
    }
}

impl FromStr for ColumnSchema {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnSchema::parse(s)
    }
}

/// Which diagonal splits every grid cell into two triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum DiagonalMode {
    #[default]
    Forward,                        // Split along bottom-left -> top-right
    Backward,                       // Split along bottom-right -> top-left
}

impl FromStr for DiagonalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "fwd" => Ok(DiagonalMode::Forward),
            "backward" | "bwd" => Ok(DiagonalMode::Backward),
            other => Err(format!("Unknown diagonal mode '{}' (expected forward/fwd or backward/bwd)", other)),
        }
    }
}

impl TryFrom<String> for DiagonalMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for DiagonalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagonalMode::Forward => write!(f, "fwd"),
            DiagonalMode::Backward => write!(f, "bwd"),
        }
    }
}

/// Triangulated surface ready for serialization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    pub vertices: Vec<[f64; 3]>,    // Vertex coordinates; vertex n is vertices[n - 1]
    pub triangles: Vec<[usize; 3]>, // 1-based vertex indices into `vertices`
}

impl SurfaceMesh {
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schema_renders_in_column_order() {
        let schema = ColumnSchema::default();
        assert_eq!(schema.to_string(), "x y z i j");
        assert_eq!(schema.min_columns(), 5);
    }

    #[test]
    fn diagonal_mode_accepts_short_and_long_names() {
        assert_eq!("fwd".parse::<DiagonalMode>(), Ok(DiagonalMode::Forward));
        assert_eq!("Forward".parse::<DiagonalMode>(), Ok(DiagonalMode::Forward));
        assert_eq!("bwd".parse::<DiagonalMode>(), Ok(DiagonalMode::Backward));
        assert_eq!("backward".parse::<DiagonalMode>(), Ok(DiagonalMode::Backward));
        assert!("diagonal".parse::<DiagonalMode>().is_err());
    }

    #[test]
    fn diagonal_mode_deserializes_from_json_string() {
        let mode: DiagonalMode = serde_json::from_str("\"bwd\"").unwrap();
        assert_eq!(mode, DiagonalMode::Backward);
        assert!(serde_json::from_str::<DiagonalMode>("\"sideways\"").is_err());
    }
}
