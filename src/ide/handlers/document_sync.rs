//! Document synchronization handlers.
//!
//! Open documents are owned by the editor: their text replaces the file on
//! disk until they are closed.

use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams,
    DidCloseTextDocumentParams,
    DidOpenTextDocumentParams,
    DidSaveTextDocumentParams,
    FileChangeType,
};

use super::super::backend::Backend;

pub async fn handle_did_open(backend: &Backend, params: DidOpenTextDocumentParams) {
    let document = params.text_document;
    tracing::debug!(uri = %document.uri, language_id = %document.language_id, version = document.version, "didOpen");

    backend.state.opened_files.lock().await.insert(document.uri.clone());
    backend.update_and_diagnose(document.uri, document.text, true).await;
}

/// Full sync: only the last change carries the whole text.
pub async fn handle_did_change(backend: &Backend, params: DidChangeTextDocumentParams) {
    let Some(change) = params.content_changes.into_iter().next_back() else {
        return;
    };

    backend.update_and_diagnose(params.text_document.uri, change.text, false).await;
}

/// 設定ファイルの保存はファイル監視を待たずに反映する
pub async fn handle_did_save(backend: &Backend, params: DidSaveTextDocumentParams) {
    let uri = params.text_document.uri;
    tracing::debug!(uri = %uri, "didSave");

    if let Some(path) = Backend::uri_to_path(&uri)
        && Backend::is_config_file(&path)
    {
        backend.handle_config_file_change(&path, FileChangeType::CHANGED).await;
    }
}

/// 閉じたファイルはディスクの内容に戻す
pub async fn handle_did_close(backend: &Backend, params: DidCloseTextDocumentParams) {
    let uri = params.text_document.uri;
    backend.state.opened_files.lock().await.remove(&uri);

    let Some(path) = Backend::uri_to_path(&uri) else {
        return;
    };
    let is_catalog = backend.state.catalogs.lock().await.contains_key(&path);
    if !is_catalog {
        return;
    }

    // 保存せずに閉じた新規ファイルはディスクに存在しない
    if path.is_file() {
        backend.reload_catalog_file(&path).await;
    } else {
        backend.remove_catalog_file(&path).await;
    }
    backend.client.publish_diagnostics(uri, Vec::new(), None).await;
}
