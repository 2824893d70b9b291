//! Glob matcher deciding which workspace files are catalogs.
//!
//! Patterns are relative to the workspace root. Exclude patterns ending in
//! `/**` also prune whole directories during the workspace walk.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::LinguistSettings;

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid catalog include pattern '{pattern}': {source}")]
    InvalidIncludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid catalog exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// Matches files against the `catalogFiles` patterns.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    /// Patterns are matched against paths relative to this.
    workspace_root: PathBuf,
    /// `includePatterns`
    include: GlobSet,
    /// `excludePatterns`
    exclude: GlobSet,
    /// `foo/**` の除外パターンから `/**` を外したもの
    excluded_dirs: GlobSet,
}

impl FileMatcher {
    /// # Errors
    /// Returns an error when a pattern is not a valid glob.
    pub fn new(workspace_root: PathBuf, settings: &LinguistSettings) -> Result<Self, MatcherError> {
        let patterns = &settings.catalog_files;

        let include = compile(patterns.include_patterns.iter().map(String::as_str), |pattern, source| {
            MatcherError::InvalidIncludePattern { pattern, source }
        })?;
        let exclude = compile(patterns.exclude_patterns.iter().map(String::as_str), |pattern, source| {
            MatcherError::InvalidExcludePattern { pattern, source }
        })?;
        let excluded_dirs = compile(
            patterns.exclude_patterns.iter().filter_map(|pattern| pattern.strip_suffix("/**")),
            |pattern, source| MatcherError::InvalidExcludePattern { pattern, source },
        )?;

        Ok(Self { workspace_root, include, exclude, excluded_dirs })
    }

    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// The path must be absolute and under the workspace root.
    ///
    /// Only the patterns are checked. Whether a `.ts` file is a Linguist
    /// catalog or TypeScript is decided from its content.
    #[must_use]
    pub fn is_catalog_file(&self, absolute_path: &Path) -> bool {
        absolute_path
            .strip_prefix(&self.workspace_root)
            .is_ok_and(|relative| self.is_catalog_file_relative(relative))
    }

    /// The path must be relative to the workspace root.
    #[must_use]
    pub fn is_catalog_file_relative(&self, relative_path: &Path) -> bool {
        self.include.is_match(relative_path) && !self.exclude.is_match(relative_path)
    }

    /// Whether nothing below the directory can be a catalog.
    ///
    /// The workspace root itself is never excluded.
    #[must_use]
    pub fn is_excluded_dir(&self, absolute_path: &Path) -> bool {
        match absolute_path.strip_prefix(&self.workspace_root) {
            Ok(relative) if relative.as_os_str().is_empty() => false,
            Ok(relative) => self.excluded_dirs.is_match(relative),
            Err(_) => true,
        }
    }
}

/// Builds one `GlobSet`, reporting the first invalid pattern.
fn compile<'a, F>(
    patterns: impl Iterator<Item = &'a str>,
    make_error: F,
) -> Result<GlobSet, MatcherError>
where
    F: Fn(String, globset::Error) -> MatcherError,
{
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| make_error(pattern.to_string(), e))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
