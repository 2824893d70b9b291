//! LSP サーバーの共有状態

use std::collections::{
    HashMap,
    HashSet,
};
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use salsa::Setter;
use tokio::sync::{
    Mutex,
    MutexGuard,
};
use tower_lsp::lsp_types::Url;

use crate::db::LinguistDatabaseImpl;
use crate::input::catalog_file::CatalogFile;

/// パス → `CatalogFile`
pub type CatalogMap = HashMap<PathBuf, CatalogFile>;

/// LSP サーバーの共有状態
///
/// # ロック順序
///
/// 複数のロックを同時に取得する場合は、以下の順序を厳守してください：
/// 1. `db`
/// 2. `catalogs`
/// 3. `opened_files`
/// 4. `current_language`
#[derive(Clone)]
pub struct ServerState {
    /// Salsa データベース
    pub db: Arc<Mutex<LinguistDatabaseImpl>>,
    /// Loaded catalogs, including open documents that are not on disk yet.
    pub catalogs: Arc<Mutex<CatalogMap>>,
    /// 現在開いているファイルの URI
    pub opened_files: Arc<Mutex<HashSet<Url>>>,
    /// ホバーと `qtLinguist.translate` で最優先する言語
    pub current_language: Arc<Mutex<Option<String>>>,
}

impl ServerState {
    pub fn new(db: LinguistDatabaseImpl) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            catalogs: Arc::new(Mutex::new(HashMap::new())),
            opened_files: Arc::new(Mutex::new(HashSet::new())),
            current_language: Arc::new(Mutex::new(None)),
        }
    }

    /// `db` と `catalogs` のロックを一括取得
    pub async fn lock_db_and_catalogs(
        &self,
    ) -> (MutexGuard<'_, LinguistDatabaseImpl>, MutexGuard<'_, CatalogMap>) {
        let db = self.db.lock().await;
        let catalogs = self.catalogs.lock().await;
        (db, catalogs)
    }

    /// All catalogs, sorted by path for stable output.
    pub async fn sorted_catalogs(&self) -> Vec<CatalogFile> {
        let catalogs = self.catalogs.lock().await;
        let mut entries: Vec<_> = catalogs.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, file)| *file).collect()
    }

    /// Paths of the documents open in the editor.
    pub async fn opened_paths(&self) -> HashSet<PathBuf> {
        let opened_files = self.opened_files.lock().await;
        opened_files.iter().filter_map(|uri| uri.to_file_path().ok()).collect()
    }

    /// Registers `text` for `path`, reusing the existing input.
    ///
    /// Unchanged text does not touch the input, so salsa keeps its memos.
    pub async fn upsert_catalog(&self, path: PathBuf, text: String) -> CatalogFile {
        let (mut db, mut catalogs) = self.lock_db_and_catalogs().await;
        upsert(&mut db, &mut catalogs, path, text)
    }

    /// Registers catalogs read from disk. Open documents keep the editor text.
    ///
    /// Returns how many catalogs took the disk text.
    pub async fn register_from_disk(&self, loaded: Vec<(PathBuf, String)>) -> usize {
        let opened = self.opened_paths().await;
        let (mut db, mut catalogs) = self.lock_db_and_catalogs().await;

        let mut registered = 0;
        for (path, text) in loaded {
            if opened.contains(&path) && catalogs.contains_key(&path) {
                continue;
            }
            upsert(&mut db, &mut catalogs, path, text);
            registered += 1;
        }
        registered
    }

    /// Forgets the catalog at `path`. Returns whether it was known.
    pub async fn remove_catalog(&self, path: &Path) -> bool {
        self.catalogs.lock().await.remove(path).is_some()
    }

    /// Starts over with an empty database.
    ///
    /// Open catalogs are carried over with their editor text. Returns how
    /// many were kept.
    pub async fn reset_keeping_open(&self) -> usize {
        let opened = self.opened_paths().await;
        let (mut db, mut catalogs) = self.lock_db_and_catalogs().await;

        let kept: Vec<(PathBuf, String)> = catalogs
            .iter()
            .filter(|(path, _)| opened.contains(*path))
            .map(|(path, file)| (path.clone(), file.text(&*db).clone()))
            .collect();

        *db = LinguistDatabaseImpl::default();
        catalogs.clear();

        let count = kept.len();
        for (path, text) in kept {
            upsert(&mut db, &mut catalogs, path, text);
        }
        count
    }
}

/// Creates the input for `path` or updates its text when it changed.
fn upsert(
    db: &mut LinguistDatabaseImpl,
    catalogs: &mut CatalogMap,
    path: PathBuf,
    text: String,
) -> CatalogFile {
    if let Some(existing) = catalogs.get(&path).copied() {
        if existing.text(&*db) != &text {
            existing.set_text(db).to(text);
        }
        return existing;
    }

    let file = CatalogFile::new(&*db, path.to_string_lossy().into_owned(), text);
    catalogs.insert(path, file);
    file
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("db", &"<LinguistDatabaseImpl>")
            .field("catalogs", &"<CatalogMap>")
            .field("opened_files", &"<HashSet<Url>>")
            .field("current_language", &"<Option<String>>")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;

    use super::*;
    use crate::test_utils::SAMPLE_CATALOG;

    const OTHER_CATALOG: &str = "<TS language=\"de\"></TS>";

    fn path_strings(state_db: &LinguistDatabaseImpl, files: &[CatalogFile]) -> Vec<String> {
        files.iter().map(|file| file.file_path(state_db).clone()).collect()
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let state1 = ServerState::new(LinguistDatabaseImpl::default());
        let state2 = state1.clone();

        *state1.current_language.lock().await = Some("de".to_string());

        assert_that!(Arc::ptr_eq(&state1.catalogs, &state2.catalogs), eq(true));
        assert_that!(state2.current_language.lock().await.as_deref(), some(eq("de")));
    }

    #[tokio::test]
    async fn sorted_catalogs_orders_by_path() {
        let state = ServerState::new(LinguistDatabaseImpl::default());
        for path in ["/p/app_pt.ts", "/p/app_de.ts", "/p/app_fr.ts"] {
            state.upsert_catalog(PathBuf::from(path), SAMPLE_CATALOG.to_string()).await;
        }

        let sorted = state.sorted_catalogs().await;
        let db = state.db.lock().await;

        assert_that!(
            path_strings(&db, &sorted),
            elements_are![eq("/p/app_de.ts"), eq("/p/app_fr.ts"), eq("/p/app_pt.ts")]
        );
    }

    #[tokio::test]
    async fn upsert_reuses_input_and_updates_text() {
        let state = ServerState::new(LinguistDatabaseImpl::default());
        let path = PathBuf::from("/p/app_pt.ts");

        let first = state.upsert_catalog(path.clone(), SAMPLE_CATALOG.to_string()).await;
        let second = state.upsert_catalog(path.clone(), OTHER_CATALOG.to_string()).await;

        assert_that!(first == second, eq(true));
        let db = state.db.lock().await;
        assert_that!(second.text(&*db).as_str(), eq(OTHER_CATALOG));
    }

    #[tokio::test]
    async fn register_from_disk_keeps_open_documents() {
        let state = ServerState::new(LinguistDatabaseImpl::default());
        let open_path = PathBuf::from("/p/app_pt.ts");
        state.opened_files.lock().await.insert(Url::from_file_path(&open_path).unwrap());
        let open_file = state.upsert_catalog(open_path.clone(), OTHER_CATALOG.to_string()).await;

        let count = state
            .register_from_disk(vec![
                (open_path, SAMPLE_CATALOG.to_string()),
                (PathBuf::from("/p/app_de.ts"), SAMPLE_CATALOG.to_string()),
            ])
            .await;

        assert_that!(count, eq(1));
        assert_that!(state.catalogs.lock().await.len(), eq(2));
        let db = state.db.lock().await;
        assert_that!(open_file.text(&*db).as_str(), eq(OTHER_CATALOG));
    }

    #[tokio::test]
    async fn reset_keeping_open_drops_closed_catalogs() {
        let state = ServerState::new(LinguistDatabaseImpl::default());
        let open_path = PathBuf::from("/p/app_pt.ts");
        state.opened_files.lock().await.insert(Url::from_file_path(&open_path).unwrap());
        state.upsert_catalog(open_path.clone(), OTHER_CATALOG.to_string()).await;
        state.upsert_catalog(PathBuf::from("/p/app_de.ts"), SAMPLE_CATALOG.to_string()).await;

        let kept = state.reset_keeping_open().await;

        assert_that!(kept, eq(1));
        let (db, catalogs) = state.lock_db_and_catalogs().await;
        let file = catalogs.get(&open_path).copied().unwrap();
        assert_that!(file.text(&*db).as_str(), eq(OTHER_CATALOG));
        assert_that!(catalogs.len(), eq(1));
    }

    #[tokio::test]
    async fn remove_catalog_reports_presence() {
        let state = ServerState::new(LinguistDatabaseImpl::default());
        let path = PathBuf::from("/p/app_pt.ts");
        state.upsert_catalog(path.clone(), SAMPLE_CATALOG.to_string()).await;

        assert_that!(state.remove_catalog(&path).await, eq(true));
        assert_that!(state.remove_catalog(&path).await, eq(false));
    }
}
