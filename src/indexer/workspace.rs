//! Finds and reads the catalogs of a workspace.

use std::path::{
    Path,
    PathBuf,
};
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::time::Duration;

use futures::StreamExt;
use ignore::WalkBuilder;
use tokio::sync::Notify;

use crate::config::{
    FileMatcher,
    LinguistSettings,
};
use crate::indexer::types::{
    IndexerError,
    LoadedCatalog,
};
use crate::input::catalog_file::is_linguist_document;

/// Workspace indexer
///
/// Tracks whether the initial scan has finished so that requests arriving
/// early can wait for it.
#[derive(Debug, Default)]
pub struct WorkspaceIndexer {
    /// Set once the initial scan is done.
    completed: AtomicBool,
    /// Wakes up `wait_for_completion`.
    notify: Notify,
}

impl WorkspaceIndexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_indexing_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    pub fn mark_completed(&self) {
        self.completed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// 再インデックス前に呼ぶ
    pub fn reset(&self) {
        self.completed.store(false, Ordering::Release);
    }

    /// Waits until indexing finishes. Returns `false` on timeout.
    pub async fn wait_for_completion(&self, timeout: Duration) -> bool {
        let notified = self.notify.notified();
        if self.is_indexing_completed() {
            return true;
        }
        tokio::time::timeout(timeout, notified).await.is_ok() || self.is_indexing_completed()
    }

    /// ワークスペースの翻訳カタログを読み込む
    ///
    /// `.ts` files that turn out to be TypeScript are skipped silently.
    /// Unreadable files are logged and skipped.
    ///
    /// # Errors
    /// - ワークスペースパスがディレクトリでない
    /// - 設定のパターンが不正
    pub async fn index_workspace<F>(
        &self,
        workspace_path: &Path,
        settings: &LinguistSettings,
        progress_callback: Option<F>,
    ) -> Result<Vec<LoadedCatalog>, IndexerError>
    where
        F: Fn(u32, u32) + Send + Sync,
    {
        tracing::debug!(workspace_path = %workspace_path.display(), "Indexing workspace");

        if !workspace_path.is_dir() {
            return Err(IndexerError::InvalidPath(workspace_path.display().to_string()));
        }

        let matcher = FileMatcher::new(workspace_path.to_path_buf(), settings)?;
        let files = Self::find_catalog_files(&matcher);
        let total = u32::try_from(files.len()).unwrap_or(u32::MAX);
        let num_threads = settings.indexing.thread_count();

        tracing::debug!(total, num_threads, "Reading candidate catalog files");

        let mut processed = 0_u32;
        let mut catalogs = Vec::new();
        let mut reads = futures::stream::iter(files)
            .map(|path| async move {
                let result = tokio::fs::read_to_string(&path).await;
                (path, result)
            })
            .buffer_unordered(num_threads);

        while let Some((path, result)) = reads.next().await {
            processed += 1;
            if let Some(callback) = &progress_callback {
                callback(processed, total);
            }

            match result {
                Ok(text) if is_linguist_document(&text) => {
                    catalogs.push(LoadedCatalog { path, text });
                }
                Ok(_) => tracing::trace!(path = %path.display(), "Not a Linguist catalog"),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "Failed to read file");
                }
            }
        }

        // 処理順は非決定的なのでパス順に揃える
        catalogs.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::info!(count = catalogs.len(), "Workspace indexing finished");

        Ok(catalogs)
    }

    /// Walks the workspace and returns every candidate `.ts` path.
    fn find_catalog_files(matcher: &FileMatcher) -> Vec<PathBuf> {
        let mut found_files = Vec::new();
        let dir_matcher = matcher.clone();

        for result in WalkBuilder::new(matcher.workspace_root())
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            // 除外ディレクトリには降りない
            .filter_entry(move |entry| {
                !(entry.file_type().is_some_and(|ft| ft.is_dir())
                    && dir_matcher.is_excluded_dir(entry.path()))
            })
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            if matcher.is_catalog_file(entry.path()) {
                found_files.push(entry.path().to_path_buf());
            }
        }

        found_files
    }
}
