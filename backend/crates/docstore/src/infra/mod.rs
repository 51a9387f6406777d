//! Storage engine implementations

pub mod json_file;
pub mod memory;
