//! 設定管理を行うモジュール

use std::path::{
    Path,
    PathBuf,
};

use super::{
    CONFIG_FILE_NAME,
    ConfigError,
    LinguistSettings,
    loader,
};

/// Where the active settings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsSource {
    #[default]
    Defaults,
    /// `.qt-linguist.json`
    WorkspaceFile,
    /// `workspace/didChangeConfiguration`
    Client,
}

/// 設定管理を行う
///
/// Settings are only replaced after they validate, so a broken edit to the
/// config file keeps the server running with the last good settings.
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// Last valid settings.
    current_settings: LinguistSettings,
    /// Where `current_settings` came from.
    source: SettingsSource,
    /// Directory searched for the config file.
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ワークスペースの設定を読み込む
    ///
    /// `.qt-linguist.json` がなければデフォルト設定を使う。
    ///
    /// # Errors
    /// - ファイル読み込みエラー
    /// - JSON パースエラー
    /// - バリデーションエラー
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        let loaded = match &workspace_root {
            Some(root) => loader::load_from_workspace(root)?,
            None => None,
        };
        let source =
            if loaded.is_some() { SettingsSource::WorkspaceFile } else { SettingsSource::Defaults };
        let settings = loaded.unwrap_or_default();

        settings.validate().map_err(ConfigError::ValidationErrors)?;

        tracing::debug!(root = ?workspace_root, ?source, "Settings loaded");
        self.current_settings = settings;
        self.source = source;
        self.workspace_root = workspace_root;
        Ok(())
    }

    /// 設定ファイルを読み直す（ファイル監視用）
    ///
    /// # Errors
    /// [`Self::load_settings`] と同じ
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        self.load_settings(self.workspace_root.clone())
    }

    /// クライアントから受け取った設定に置き換える
    ///
    /// # Errors
    /// バリデーションエラー。その場合は現在の設定を維持する。
    pub fn update_settings(&mut self, new_settings: LinguistSettings) -> Result<(), ConfigError> {
        new_settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = new_settings;
        self.source = SettingsSource::Client;
        tracing::debug!("Settings updated from client");
        Ok(())
    }

    #[must_use]
    pub const fn get_settings(&self) -> &LinguistSettings {
        &self.current_settings
    }

    #[must_use]
    pub const fn source(&self) -> SettingsSource {
        self.source
    }

    #[must_use]
    pub const fn workspace_root(&self) -> Option<&PathBuf> {
        self.workspace_root.as_ref()
    }

    /// Whether `path` is the config file of the current workspace root.
    ///
    /// Files with the same name in subdirectories are not ours.
    #[must_use]
    pub fn is_workspace_config(&self, path: &Path) -> bool {
        match &self.workspace_root {
            Some(root) => path == root.join(CONFIG_FILE_NAME),
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::config::Severity;

    fn workspace_with_config(content: &str) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), content).unwrap();
        temp_dir
    }

    #[rstest]
    fn test_load_settings_without_workspace() {
        let mut manager = ConfigManager::new();

        assert_that!(manager.load_settings(None), ok(anything()));
        assert_that!(manager.source(), eq(SettingsSource::Defaults));
        assert_that!(manager.get_settings().catalog_files.include_patterns, elements_are![eq("**/*.ts")]);
    }

    #[rstest]
    fn test_load_settings_with_config_file() {
        let temp_dir = workspace_with_config(r#"{"diagnostics": {"accelerators": "off"}}"#);

        let mut manager = ConfigManager::new();
        let result = manager.load_settings(Some(temp_dir.path().to_path_buf()));

        assert_that!(result, ok(anything()));
        assert_that!(manager.get_settings().diagnostics.accelerators, eq(Severity::Off));
        assert_that!(manager.source(), eq(SettingsSource::WorkspaceFile));
    }

    #[rstest]
    fn test_load_settings_rejects_invalid_config_file() {
        let temp_dir = workspace_with_config(r#"{"indexing": {"numThreads": 0}}"#);

        let mut manager = ConfigManager::new();
        let result = manager.load_settings(Some(temp_dir.path().to_path_buf()));

        assert_that!(matches!(result, Err(ConfigError::ValidationErrors(_))), eq(true));
        // 失敗時は以前の設定を維持
        assert_that!(manager.get_settings().indexing.num_threads, none());
        assert_that!(manager.workspace_root().is_none(), eq(true));
    }

    #[rstest]
    fn test_reload_picks_up_edits_and_keeps_last_good_settings() {
        let temp_dir = workspace_with_config(r#"{"primaryLanguages": ["de"]}"#);
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        let mut manager = ConfigManager::new();
        manager.load_settings(Some(temp_dir.path().to_path_buf())).unwrap();

        fs::write(&config_path, r#"{"primaryLanguages": ["pt_BR"]}"#).unwrap();
        assert_that!(manager.reload(), ok(anything()));
        assert_that!(manager.get_settings().primary_languages, some(elements_are![eq("pt_BR")]));

        fs::write(&config_path, r#"{"primaryLanguages": [""]}"#).unwrap();
        assert_that!(manager.reload().is_err(), eq(true));
        assert_that!(manager.get_settings().primary_languages, some(elements_are![eq("pt_BR")]));

        fs::remove_file(&config_path).unwrap();
        assert_that!(manager.reload(), ok(anything()));
        assert_that!(manager.source(), eq(SettingsSource::Defaults));
    }

    #[rstest]
    fn test_is_workspace_config_only_matches_root_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new();
        assert_that!(manager.is_workspace_config(&temp_dir.path().join(CONFIG_FILE_NAME)), eq(false));

        manager.load_settings(Some(temp_dir.path().to_path_buf())).unwrap();

        assert_that!(manager.is_workspace_config(&temp_dir.path().join(CONFIG_FILE_NAME)), eq(true));
        assert_that!(
            manager.is_workspace_config(&temp_dir.path().join("sub").join(CONFIG_FILE_NAME)),
            eq(false)
        );
    }

    #[rstest]
    fn test_update_settings() {
        let mut manager = ConfigManager::new();
        let valid = LinguistSettings {
            primary_languages: Some(vec!["ja".to_string()]),
            ..LinguistSettings::default()
        };
        let mut invalid = LinguistSettings::default();
        invalid.catalog_files.include_patterns.clear();

        assert_that!(manager.update_settings(valid), ok(anything()));
        assert_that!(manager.source(), eq(SettingsSource::Client));
        assert_that!(manager.update_settings(invalid).is_err(), eq(true));
        assert_that!(manager.get_settings().primary_languages, some(elements_are![eq("ja")]));
    }
}
