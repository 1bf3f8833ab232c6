// File format parsers
pub mod ptl;
