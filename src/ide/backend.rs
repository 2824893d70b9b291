//! LSP Backend 実装

use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CodeActionParams,
    CodeActionResponse,
    DidChangeConfigurationParams,
    DidChangeTextDocumentParams,
    DidChangeWatchedFilesParams,
    DidChangeWatchedFilesRegistrationOptions,
    DidChangeWorkspaceFoldersParams,
    DidCloseTextDocumentParams,
    DidOpenTextDocumentParams,
    DidSaveTextDocumentParams,
    DocumentFormattingParams,
    DocumentSymbolParams,
    DocumentSymbolResponse,
    ExecuteCommandParams,
    FileChangeType,
    FileSystemWatcher,
    GlobPattern,
    GotoDefinitionParams,
    GotoDefinitionResponse,
    Hover,
    HoverParams,
    InitializeParams,
    InitializeResult,
    InitializedParams,
    Location,
    MessageType,
    NumberOrString,
    ProgressParams,
    ProgressParamsValue,
    ReferenceParams,
    Registration,
    TextEdit,
    Url,
    WatchKind,
    WorkDoneProgress,
    WorkDoneProgressBegin,
    WorkDoneProgressEnd,
    WorkDoneProgressReport,
    WorkspaceFolder,
    notification::Progress,
};
use tower_lsp::{
    Client,
    LanguageServer,
};

use super::handlers;
use super::state::ServerState;
use crate::config::{
    CONFIG_FILE_NAME,
    ConfigManager,
    FileMatcher,
};
use crate::db::LinguistDatabaseImpl;
use crate::indexer::types::LoadedCatalog;
use crate::indexer::workspace::WorkspaceIndexer;
use crate::input::catalog_file::{
    CatalogFile,
    is_linguist_document,
};

/// インデックス完了を待つ最大時間
const INDEXING_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// `$/progress` token for workspace indexing.
const INDEXING_PROGRESS_TOKEN: &str = "qt-linguist-indexing";

/// LSP Backend
#[derive(Clone)]
pub struct Backend {
    /// LSP クライアント
    pub client: Client,
    /// 設定管理
    pub config_manager: Arc<Mutex<ConfigManager>>,
    /// ワークスペースインデクサー
    pub workspace_indexer: Arc<WorkspaceIndexer>,
    /// 共有状態
    pub state: ServerState,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("config_manager", &"<ConfigManager>")
            .field("workspace_indexer", &self.workspace_indexer)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Backend {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            config_manager: Arc::new(Mutex::new(ConfigManager::new())),
            workspace_indexer: Arc::new(WorkspaceIndexer::new()),
            state: ServerState::new(LinguistDatabaseImpl::default()),
        }
    }

    pub(crate) fn uri_to_path(uri: &Url) -> Option<PathBuf> {
        let path = uri.to_file_path().ok();
        if path.is_none() {
            tracing::warn!("Failed to convert URI to file path: {}", uri);
        }
        path
    }

    pub(crate) fn is_config_file(path: &Path) -> bool {
        path.file_name().is_some_and(|name| name == CONFIG_FILE_NAME)
    }

    /// ワークスペースフォルダを取得
    ///
    /// # Errors
    /// クライアントとの通信に失敗した場合
    pub(crate) async fn get_workspace_folders(&self) -> Result<Vec<WorkspaceFolder>> {
        self.client.workspace_folders().await.map(Option::unwrap_or_default)
    }

    /// Waits for the initial indexing. Returns `false` on timeout.
    pub(crate) async fn wait_for_catalogs(&self) -> bool {
        self.workspace_indexer.wait_for_completion(INDEXING_WAIT_TIMEOUT).await
    }

    /// `CatalogFile` registered for the URI.
    pub(crate) async fn catalog_for_uri(&self, uri: &Url) -> Option<CatalogFile> {
        let path = Self::uri_to_path(uri)?;
        self.state.catalogs.lock().await.get(&path).copied()
    }

    /// Whether a path matches the configured catalog patterns.
    pub(crate) async fn is_catalog_candidate(&self, path: &Path) -> bool {
        let config_manager = self.config_manager.lock().await;
        let Some(root) = config_manager.workspace_root() else {
            return path.extension().is_some_and(|ext| ext == "ts");
        };
        FileMatcher::new(root.clone(), config_manager.get_settings())
            .is_ok_and(|matcher| matcher.is_catalog_file(path))
    }

    /// Indexes every workspace folder, reporting `$/progress`, then marks
    /// indexing as completed.
    pub(crate) async fn index_workspace_folders(&self) {
        let workspace_folders = match self.get_workspace_folders().await {
            Ok(folders) => folders,
            Err(error) => {
                tracing::warn!(%error, "Failed to get workspace folders");
                Vec::new()
            }
        };

        for folder in workspace_folders {
            let Ok(workspace_path) = folder.uri.to_file_path() else {
                continue;
            };
            self.index_folder(&workspace_path).await;
        }

        self.workspace_indexer.mark_completed();
    }

    /// 1 つのワークスペースフォルダをインデックスし、進捗を報告する
    async fn index_folder(&self, workspace_path: &Path) {
        let token = NumberOrString::String(INDEXING_PROGRESS_TOKEN.to_string());
        self.send_progress(
            &token,
            WorkDoneProgress::Begin(WorkDoneProgressBegin {
                title: "Indexing translation catalogs".to_string(),
                cancellable: Some(false),
                message: Some("Starting...".to_string()),
                percentage: Some(0),
            }),
        )
        .await;

        let settings = self.config_manager.lock().await.get_settings().clone();
        let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<(u32, u32)>(100);

        let progress_task = {
            let client = self.client.clone();
            let token = token.clone();
            tokio::spawn(async move {
                while let Some((current, total)) = progress_rx.recv().await {
                    let percentage = (current * 100).checked_div(total).unwrap_or(0);
                    client
                        .send_notification::<Progress>(ProgressParams {
                            token: token.clone(),
                            value: ProgressParamsValue::WorkDone(WorkDoneProgress::Report(
                                WorkDoneProgressReport {
                                    cancellable: Some(false),
                                    message: Some(format!("Reading files: {current}/{total}")),
                                    percentage: Some(percentage),
                                },
                            )),
                        })
                        .await;
                }
            })
        };

        let progress_callback = move |current: u32, total: u32| {
            let _ = progress_tx.try_send((current, total));
        };

        let index_result = self
            .workspace_indexer
            .index_workspace(workspace_path, &settings, Some(progress_callback))
            .await;
        let _ = progress_task.await;

        let end_message = match index_result {
            Ok(loaded) => {
                let count = loaded.len();
                let loaded =
                    loaded.into_iter().map(|LoadedCatalog { path, text }| (path, text)).collect();
                let from_disk = self.state.register_from_disk(loaded).await;
                tracing::debug!(count, from_disk, "Registered indexed catalogs");
                self.client
                    .log_message(MessageType::INFO, format!("Indexed {count} translation catalogs"))
                    .await;
                format!("{count} catalogs indexed")
            }
            Err(error) => {
                self.client
                    .log_message(MessageType::ERROR, format!("error indexing workspace: {error}"))
                    .await;
                format!("Indexing failed: {error}")
            }
        };

        self.send_progress(
            &token,
            WorkDoneProgress::End(WorkDoneProgressEnd { message: Some(end_message) }),
        )
        .await;
    }

    /// `$/progress` notification
    async fn send_progress(&self, token: &NumberOrString, progress: WorkDoneProgress) {
        self.client
            .send_notification::<Progress>(ProgressParams {
                token: token.clone(),
                value: ProgressParamsValue::WorkDone(progress),
            })
            .await;
    }

    /// ワークスペースを再インデックス
    ///
    /// 新しい Salsa データベースを作成して全カタログを読み直します。
    /// 開いているドキュメントはエディタの内容を引き継ぎます。
    pub(crate) async fn reindex_workspace(&self) {
        self.client.log_message(MessageType::INFO, "Reindexing workspace...").await;
        self.workspace_indexer.reset();

        let kept = self.state.reset_keeping_open().await;
        tracing::debug!(kept, "Open catalogs carried over");

        self.index_workspace_folders().await;
        self.send_diagnostics_to_opened_files().await;
    }

    /// ドキュメントの内容を更新して診断を送信
    ///
    /// TypeScript sources sharing the `.ts` extension are ignored.
    pub(crate) async fn update_and_diagnose(&self, uri: Url, text: String, is_open: bool) {
        let Some(file_path) = Self::uri_to_path(&uri) else {
            return;
        };

        if !is_linguist_document(&text) {
            tracing::debug!(uri = %uri, is_open, "Not a Linguist catalog, ignoring");
            if self.state.remove_catalog(&file_path).await {
                self.client.publish_diagnostics(uri, Vec::new(), None).await;
            }
            return;
        }

        self.state.upsert_catalog(file_path, text).await;
        self.publish_diagnostics(&uri).await;
        tracing::debug!(uri = %uri, is_open, "Catalog updated and diagnostics sent");
    }

    /// Publishes diagnostics for one catalog.
    pub(crate) async fn publish_diagnostics(&self, uri: &Url) {
        let config = self.config_manager.lock().await.get_settings().diagnostics;
        let diagnostics = {
            let Some(path) = Self::uri_to_path(uri) else {
                return;
            };
            let (db, catalogs) = self.state.lock_db_and_catalogs().await;
            let Some(file) = catalogs.get(&path).copied() else {
                return;
            };
            crate::ide::diagnostics::generate_diagnostics(&*db, file, uri, &config)
        };

        self.client.publish_diagnostics(uri.clone(), diagnostics, None).await;
    }

    pub(crate) async fn send_diagnostics_to_opened_files(&self) {
        let opened: Vec<Url> = self.state.opened_files.lock().await.iter().cloned().collect();
        for uri in opened {
            self.publish_diagnostics(&uri).await;
        }
    }

    /// ファイル監視を登録
    pub(crate) async fn register_file_watchers(&self) {
        let watchers = ["**/*.ts".to_string(), format!("**/{CONFIG_FILE_NAME}")]
            .into_iter()
            .map(|glob| FileSystemWatcher {
                glob_pattern: GlobPattern::String(glob),
                kind: Some(WatchKind::all()),
            })
            .collect();

        let options = DidChangeWatchedFilesRegistrationOptions { watchers };
        let Ok(register_options) = serde_json::to_value(options) else {
            return;
        };

        let registration = Registration {
            id: "qt-linguist-file-watcher".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: Some(register_options),
        };

        if let Err(error) = self.client.register_capability(vec![registration]).await {
            tracing::warn!(%error, "Failed to register file watchers");
        }
    }

    /// 設定ファイルの変更を反映して再インデックス
    pub(crate) async fn handle_config_file_change(&self, path: &Path, change: FileChangeType) {
        let result = {
            let mut config_manager = self.config_manager.lock().await;
            if !config_manager.is_workspace_config(path) {
                tracing::debug!(path = %path.display(), "Ignoring config file outside the workspace root");
                return;
            }
            config_manager.reload()
        };

        tracing::info!(path = %path.display(), ?change, "Configuration file changed");
        match result {
            Ok(()) => self.reindex_workspace().await,
            Err(error) => {
                self.client
                    .log_message(MessageType::ERROR, format!("Configuration error: {error}"))
                    .await;
            }
        }
    }

    /// Rereads a catalog changed on disk. Open documents are owned by the editor.
    pub(crate) async fn reload_catalog_file(&self, path: &Path) {
        let is_open = match Url::from_file_path(path) {
            Ok(uri) => self.state.opened_files.lock().await.contains(&uri),
            Err(()) => false,
        };
        if is_open {
            return;
        }

        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "Failed to read catalog");
                return;
            }
        };

        if is_linguist_document(&text) {
            self.state.upsert_catalog(path.to_path_buf(), text).await;
        } else {
            self.state.remove_catalog(path).await;
        }
    }

    pub(crate) async fn remove_catalog_file(&self, path: &Path) {
        if self.state.remove_catalog(path).await {
            tracing::debug!(path = %path.display(), "Catalog removed");
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        handlers::lifecycle::handle_initialize(self, params).await
    }

    async fn initialized(&self, params: InitializedParams) {
        handlers::lifecycle::handle_initialized(self, params).await;
    }

    async fn shutdown(&self) -> Result<()> {
        handlers::lifecycle::handle_shutdown().await
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        handlers::document_sync::handle_did_open(self, params).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        handlers::document_sync::handle_did_change(self, params).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        handlers::document_sync::handle_did_save(self, params).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        handlers::document_sync::handle_did_close(self, params).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        handlers::workspace::handle_did_change_configuration(self, params).await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        handlers::workspace::handle_did_change_watched_files(self, params).await;
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        handlers::workspace::handle_did_change_workspace_folders(self, params).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        handlers::features::handle_hover(self, params).await
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        handlers::features::handle_goto_definition(self, params).await
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        handlers::features::handle_references(self, params).await
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        handlers::features::handle_document_symbol(self, params).await
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        handlers::features::handle_formatting(self, params).await
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        handlers::code_action::handle_code_action(self, params).await
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        handlers::execute_command::handle_execute_command(self, params).await
    }
}
