// Structured-grid reconstruction and triangulation
pub mod grid_triangulation;

pub use grid_triangulation::GridTriangulator;
