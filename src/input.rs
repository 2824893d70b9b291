//! Salsa inputs.

pub mod catalog_file;
