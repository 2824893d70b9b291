//! Server configuration: `.qt-linguist.json` and client settings.

/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Catalog file pattern matcher
mod matcher;
/// Configuration types and settings
mod types;

pub use loader::{
    CONFIG_FILE_NAME,
    settings_from_value,
};
pub use manager::{
    ConfigManager,
    SettingsSource,
};
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub use types::{
    CatalogFilesConfig,
    ConfigError,
    DiagnosticsConfig,
    IndexingConfig,
    LinguistSettings,
    Severity,
    ValidationError,
};
