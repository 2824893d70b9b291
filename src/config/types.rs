use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;
use tower_lsp::lsp_types::DiagnosticSeverity;

use crate::catalog::FindingKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "catalogFiles.includePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// One line per error.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinguistSettings {
    pub catalog_files: CatalogFilesConfig,

    pub indexing: IndexingConfig,

    pub diagnostics: DiagnosticsConfig,

    /// Language priority for hover when `currentLanguage` is unset.
    pub primary_languages: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogFilesConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for CatalogFilesConfig {
    fn default() -> Self {
        Self {
            include_patterns: vec!["**/*.ts".to_string()],
            exclude_patterns: vec!["**/node_modules/**".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingConfig {
    /// Parallel file reads during indexing.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_threads: Option<usize>,
}

impl IndexingConfig {
    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.num_threads.unwrap_or_else(|| (num_cpus::get() * 4 / 5).max(1))
    }
}

/// Diagnostic severity as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Off,
    Hint,
    Information,
    Warning,
    Error,
}

impl Severity {
    /// `None` for [`Severity::Off`].
    #[must_use]
    pub const fn to_lsp(self) -> Option<DiagnosticSeverity> {
        match self {
            Self::Off => None,
            Self::Hint => Some(DiagnosticSeverity::HINT),
            Self::Information => Some(DiagnosticSeverity::INFORMATION),
            Self::Warning => Some(DiagnosticSeverity::WARNING),
            Self::Error => Some(DiagnosticSeverity::ERROR),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticsConfig {
    pub duplicate_messages: Severity,
    /// lupdate output often keeps suggestions in unfinished entries, hence a hint.
    pub unfinished_with_text: Severity,
    pub empty_translations: Severity,
    pub place_markers: Severity,
    pub accelerators: Severity,
    pub punctuation: Severity,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            duplicate_messages: Severity::Error,
            unfinished_with_text: Severity::Hint,
            empty_translations: Severity::Warning,
            place_markers: Severity::Warning,
            accelerators: Severity::Information,
            punctuation: Severity::Information,
        }
    }
}

impl DiagnosticsConfig {
    #[must_use]
    pub const fn severity(&self, kind: FindingKind) -> Severity {
        match kind {
            FindingKind::DuplicateMessage => self.duplicate_messages,
            FindingKind::UnfinishedWithText => self.unfinished_with_text,
            FindingKind::EmptyTranslation => self.empty_translations,
            FindingKind::PlaceMarkerMismatch => self.place_markers,
            FindingKind::AcceleratorMismatch => self.accelerators,
            FindingKind::PunctuationMismatch => self.punctuation,
        }
    }
}

impl LinguistSettings {
    /// # Errors
    /// - No include pattern
    /// - Invalid glob pattern
    /// - `indexing.numThreads` is zero
    /// - Empty language code
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.catalog_files.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "catalogFiles.includePatterns",
                "At least one pattern is required. Example: [\"translations/*.ts\"]",
            ));
        }

        for (index, pattern) in self.catalog_files.include_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("catalogFiles.includePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        for (index, pattern) in self.catalog_files.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("catalogFiles.excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.indexing.num_threads == Some(0) {
            errors.push(ValidationError::new(
                "indexing.numThreads",
                "Must be at least 1. Remove the field to use 80% of the CPU cores",
            ));
        }

        if let Some(languages) = &self.primary_languages {
            for (index, language) in languages.iter().enumerate() {
                if language.trim().is_empty() {
                    errors.push(ValidationError::new(
                        format!("primaryLanguages[{index}]"),
                        "The language code cannot be empty. Example: \"pt_BR\"",
                    ));
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
