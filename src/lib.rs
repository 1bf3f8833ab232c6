// src/lib.rs

// Top-level modules (each has its own mod.rs or file):
pub mod error;
pub mod database;
pub mod parser;
pub mod mesh_builder;
pub mod writer;
pub mod pipeline;
