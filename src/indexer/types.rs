//! Indexer type definitions.

use std::path::PathBuf;

use thiserror::Error;

/// A catalog document read from disk during indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedCatalog {
    pub path: PathBuf,
    pub text: String,
}

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Invalid workspace path: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Matcher(#[from] crate::config::MatcherError),
}
