//! Workspace-related handlers.

use tower_lsp::lsp_types::{
    DidChangeConfigurationParams,
    DidChangeWatchedFilesParams,
    DidChangeWorkspaceFoldersParams,
    FileChangeType,
    MessageType,
};

use super::super::backend::Backend;
use crate::config::settings_from_value;

/// `workspace/didChangeConfiguration`
///
/// Valid settings replace the current ones and trigger a reindex, since the
/// catalog patterns may have changed.
pub async fn handle_did_change_configuration(
    backend: &Backend,
    params: DidChangeConfigurationParams,
) {
    tracing::info!(settings = %params.settings, "didChangeConfiguration received");

    let new_settings = match settings_from_value(params.settings) {
        Ok(settings) => settings,
        Err(error) => {
            tracing::warn!(%error, "Ignoring unparsable settings");
            backend.client.log_message(MessageType::WARNING, format!("{error}")).await;
            return;
        }
    };

    let result = backend.config_manager.lock().await.update_settings(new_settings);
    match result {
        Ok(()) => {
            tracing::info!("Configuration updated");
            backend.reindex_workspace().await;
        }
        Err(error) => {
            tracing::error!(%error, "Configuration validation error");
            backend.client.log_message(MessageType::ERROR, format!("{error}")).await;
        }
    }
}

/// `workspace/didChangeWatchedFiles`
///
/// Catalog changes of documents open in the editor are ignored; the editor
/// buffer wins until the document is closed.
pub async fn handle_did_change_watched_files(
    backend: &Backend,
    params: DidChangeWatchedFilesParams,
) {
    let mut catalogs_changed = false;

    for change in params.changes {
        let Some(file_path) = Backend::uri_to_path(&change.uri) else {
            continue;
        };

        if Backend::is_config_file(&file_path) {
            backend.handle_config_file_change(&file_path, change.typ).await;
            continue;
        }

        if !backend.is_catalog_candidate(&file_path).await {
            continue;
        }

        tracing::debug!(path = %file_path.display(), typ = ?change.typ, "Catalog file changed");
        if change.typ == FileChangeType::DELETED {
            backend.remove_catalog_file(&file_path).await;
        } else {
            backend.reload_catalog_file(&file_path).await;
        }
        catalogs_changed = true;
    }

    // 他カタログの変更はホバーや参照に影響するが、診断はファイル単位なので
    // 開いているファイル分だけ再送する
    if catalogs_changed {
        backend.send_diagnostics_to_opened_files().await;
    }
}

/// `workspace/didChangeWorkspaceFolders`
///
/// The folder list is fetched again from the client while reindexing.
pub async fn handle_did_change_workspace_folders(
    backend: &Backend,
    params: DidChangeWorkspaceFoldersParams,
) {
    tracing::info!(
        added = params.event.added.len(),
        removed = params.event.removed.len(),
        "Workspace folders changed"
    );
    backend.reindex_workspace().await;
}
