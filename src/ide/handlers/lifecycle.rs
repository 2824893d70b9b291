//! LSP lifecycle handlers: `initialize`, `initialized`, `shutdown`.

use std::path::PathBuf;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CodeActionKind,
    CodeActionOptions,
    CodeActionProviderCapability,
    ExecuteCommandOptions,
    HoverProviderCapability,
    InitializeParams,
    InitializeResult,
    InitializedParams,
    MessageType,
    OneOf,
    ServerCapabilities,
    ServerInfo,
    TextDocumentSyncCapability,
    TextDocumentSyncKind,
    WorkspaceFoldersServerCapabilities,
    WorkspaceServerCapabilities,
};

use super::super::backend::Backend;
use super::execute_command::COMMANDS;

/// 設定ファイルを探すルート
///
/// 最初のワークスペースフォルダ。古いクライアントは `rootUri` のみ送ってくる。
#[allow(deprecated)]
fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|folder| &folder.uri)
        .or(params.root_uri.as_ref())
        .and_then(|uri| uri.to_file_path().ok())
}

/// Capabilities announced in `initialize`.
fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        definition_provider: Some(OneOf::Left(true)),
        references_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        document_formatting_provider: Some(OneOf::Left(true)),
        code_action_provider: Some(CodeActionProviderCapability::Options(CodeActionOptions {
            code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
            resolve_provider: Some(false),
            ..CodeActionOptions::default()
        })),
        execute_command_provider: Some(ExecuteCommandOptions {
            commands: COMMANDS.iter().map(ToString::to_string).collect(),
            ..ExecuteCommandOptions::default()
        }),
        workspace: Some(WorkspaceServerCapabilities {
            workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                supported: Some(true),
                change_notifications: Some(OneOf::Left(true)),
            }),
            file_operations: None,
        }),
        ..ServerCapabilities::default()
    }
}

pub async fn handle_initialize(
    backend: &Backend,
    params: InitializeParams,
) -> Result<InitializeResult> {
    let client_name = params.client_info.as_ref().map(|info| info.name.as_str());
    let workspace_root = workspace_root(&params);
    tracing::info!(client = ?client_name, root = ?workspace_root, "initialize");

    // 設定エラーでも起動は続ける（デフォルト設定のまま）
    let result = backend.config_manager.lock().await.load_settings(workspace_root);
    if let Err(error) = result {
        tracing::error!(%error, "Configuration error during initialize");
        backend.client.log_message(MessageType::ERROR, format!("Configuration error: {error}")).await;
    }

    Ok(InitializeResult {
        server_info: Some(ServerInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
        capabilities: server_capabilities(),
    })
}

/// Indexes the workspace, then diagnoses documents opened in the meantime.
pub async fn handle_initialized(backend: &Backend, _: InitializedParams) {
    backend.index_workspace_folders().await;

    let catalog_count = backend.state.catalogs.lock().await.len();
    backend
        .client
        .log_message(MessageType::INFO, format!("Qt Linguist: {catalog_count} catalogs loaded"))
        .await;

    backend.send_diagnostics_to_opened_files().await;
    backend.register_file_watchers().await;
}

#[allow(clippy::unused_async)]
pub async fn handle_shutdown() -> Result<()> {
    tracing::info!("shutdown");
    Ok(())
}
