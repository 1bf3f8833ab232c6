// Output writers
pub mod tsurf_writer;
pub mod xml_writer;

pub use tsurf_writer::TSurfWriter;
pub use xml_writer::VTUWriter;
