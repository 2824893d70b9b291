//! 設定の読み込み
//!
//! Settings reach the server from two places: `.qt-linguist.json` at the
//! workspace root and `workspace/didChangeConfiguration`. Both accept the bare
//! settings object as well as one wrapped in a `qtLinguist` section.

use std::path::Path;

use serde_json::Value;

use super::{
    ConfigError,
    LinguistSettings,
};

/// Workspace-level configuration file name.
pub const CONFIG_FILE_NAME: &str = ".qt-linguist.json";

/// クライアント設定のセクション名
const SECTION: &str = "qtLinguist";

/// JSON 値から設定を取り出す
///
/// `null` と空オブジェクトはデフォルト設定になる。
///
/// # Errors
/// 値が設定として解釈できない場合（未知の severity など）
pub fn settings_from_value(value: Value) -> Result<LinguistSettings, ConfigError> {
    let value = match value {
        Value::Null => return Ok(LinguistSettings::default()),
        Value::Object(mut object) => match object.remove(SECTION) {
            Some(section) if object.is_empty() => section,
            Some(section) => {
                tracing::debug!(ignored = ?object.keys().collect::<Vec<_>>(), "Ignoring keys next to the qtLinguist section");
                section
            }
            None => Value::Object(object),
        },
        other => other,
    };

    if value.is_null() {
        return Ok(LinguistSettings::default());
    }
    Ok(serde_json::from_value(value)?)
}

/// ワークスペースから設定を読み込む
///
/// # Returns
/// - `Ok(Some(settings))`: 設定ファイルが見つかり、読み込みに成功
/// - `Ok(None)`: 設定ファイルが見つからない
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
pub(super) fn load_from_workspace(
    workspace_root: &Path,
) -> Result<Option<LinguistSettings>, ConfigError> {
    let config_path = workspace_root.join(CONFIG_FILE_NAME);

    if !config_path.is_file() {
        tracing::debug!(path = %config_path.display(), "Configuration file not found");
        return Ok(None);
    }

    let content = std::fs::read_to_string(&config_path)?;
    // エディタが BOM を付けることがある
    let content = content.trim_start_matches('\u{feff}');
    if content.trim().is_empty() {
        tracing::debug!(path = %config_path.display(), "Configuration file is empty, using defaults");
        return Ok(Some(LinguistSettings::default()));
    }

    tracing::debug!(path = %config_path.display(), "Loading configuration");
    let value: Value = serde_json::from_str(content)?;
    settings_from_value(value).map(Some)
}
