//! Outer surfaces: the interactive console and the CSV export.

pub mod console;
pub mod csv;
