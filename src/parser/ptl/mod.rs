// PTL point lists: column schema + grid-indexed records
pub mod schema;
pub mod ptl_reader;

pub use ptl_reader::{IngestStats, PtlParser};
