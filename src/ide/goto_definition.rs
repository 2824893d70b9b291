//! Go to Definition: jumps from a message to the application code that uses it.

use std::path::{
    Component,
    Path,
    PathBuf,
};

use tower_lsp::lsp_types::{
    Location,
    Position,
    Range,
    Url,
};

use crate::catalog::MessageRef;
use crate::db::LinguistDatabase;
use crate::input::catalog_file::CatalogFile;
use crate::syntax::parse_catalog_file;

/// Source code locations recorded for a message.
///
/// `filename` is relative to the catalog's directory. Locations without a
/// line point at the start of the file.
pub fn find_definitions(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
    message_ref: MessageRef,
) -> Vec<Location> {
    let Ok(parsed) = parse_catalog_file(db, file) else {
        return Vec::new();
    };
    let base_dir = Path::new(file.file_path(db)).parent().unwrap_or_else(|| Path::new(""));

    let Some((_, resolved)) =
        parsed.catalog.resolved_locations().into_iter().find(|(candidate, _)| *candidate == message_ref)
    else {
        return Vec::new();
    };

    resolved
        .into_iter()
        .filter_map(|location| {
            let path = normalize_path(&base_dir.join(&location.filename));
            let Ok(uri) = Url::from_file_path(&path) else {
                tracing::warn!("Failed to create URI from file path: {}", path.display());
                return None;
            };
            let line = location.line.map_or(0, |line| line.saturating_sub(1));
            let position = Position { line, character: 0 };
            Some(Location { uri, range: Range { start: position, end: position } })
        })
        .collect()
}

/// `..` と `.` を字句的に解決する（シンボリックリンクは辿らない）
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::db::LinguistDatabaseImpl;
    use crate::test_utils::{
        SAMPLE_CATALOG,
        create_catalog_file,
    };

    #[rstest]
    fn find_definitions_resolves_relative_lines() {
        let db = LinguistDatabaseImpl::default();
        let file = create_catalog_file(&db, "/project/translations/app_pt_BR.ts", SAMPLE_CATALOG);

        let locations = find_definitions(&db, file, MessageRef { context: 0, message: 1 });

        assert_that!(locations, len(eq(2)));
        assert_that!(locations[0].uri.as_str(), eq("file:///project/mainwindow.cpp"));
        assert_that!(locations[0].range.start.line, eq(119));
        assert_that!(locations[1].uri.as_str(), eq("file:///project/mainwindow.cpp"));
        assert_that!(locations[1].range.start.line, eq(123));
    }

    #[rstest]
    fn find_definitions_without_locations() {
        let db = LinguistDatabaseImpl::default();
        let file = create_catalog_file(&db, "/project/translations/app_pt_BR.ts", SAMPLE_CATALOG);

        let locations = find_definitions(&db, file, MessageRef { context: 0, message: 0 });

        assert_that!(locations, len(eq(0)));
    }

    #[rstest]
    #[case::parent("/a/b/../c.cpp", "/a/c.cpp")]
    #[case::current("/a/./b/c.cpp", "/a/b/c.cpp")]
    #[case::plain("/a/b/c.cpp", "/a/b/c.cpp")]
    #[case::leading_parent("../x.cpp", "../x.cpp")]
    fn test_normalize_path(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_path(Path::new(input)), PathBuf::from(expected));
    }
}
