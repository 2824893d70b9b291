//! Workspace scanning for translation catalogs.

pub mod types;
pub mod workspace;
