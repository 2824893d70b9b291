//! References: the same message in every catalog of the workspace.

use tower_lsp::lsp_types::{
    Location,
    Url,
};

use crate::catalog::MessageRef;
use crate::db::LinguistDatabase;
use crate::ide::diagnostics::message_range;
use crate::input::catalog_file::CatalogFile;
use crate::interned::MessageKey;
use crate::syntax::{
    message_keys,
    parse_catalog_file,
};
use crate::types::LineIndex;

/// Lookup key of the message at `message_ref`.
pub fn key_for_message(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
    message_ref: MessageRef,
) -> Option<MessageKey<'_>> {
    let parsed = parse_catalog_file(db, file).as_ref().ok()?;
    let (context, message) = parsed.catalog.message(message_ref)?;
    Some(MessageKey::new(
        db,
        context.name.clone(),
        message.source.clone(),
        message.disambiguation().map(str::to_string),
    ))
}

/// Finds every message with the same key across `catalogs`.
pub fn find_references(
    db: &dyn LinguistDatabase,
    key: MessageKey<'_>,
    catalogs: &[CatalogFile],
) -> Vec<Location> {
    let mut locations = Vec::new();

    for catalog in catalogs {
        let Ok(parsed) = parse_catalog_file(db, *catalog) else {
            continue;
        };
        let keys = message_keys(db, *catalog);
        if !keys.contains(&key) {
            continue;
        }

        let file_path = catalog.file_path(db);
        let Ok(uri) = Url::from_file_path(file_path) else {
            tracing::warn!("Failed to create URI from file path: {}", file_path);
            continue;
        };
        let line_index = LineIndex::new(catalog.text(db));

        // message_keys は文書順なので messages() と対応する
        for ((message_ref, _, _), candidate) in parsed.catalog.messages().zip(keys) {
            if candidate != key {
                continue;
            }
            if let Some(range) = message_range(parsed, &line_index, message_ref) {
                locations.push(Location { uri: uri.clone(), range });
            }
        }
    }

    locations
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

    const FRENCH_CATALOG: &str = r#"<TS version="2.1" language="fr">
<context>
    <name>MainWindow</name>
    <message>
        <source>Open</source>
        <translation>Ouvrir</translation>
    </message>
    <message>
        <source>Open</source>
        <comment>menu entry</comment>
        <translation>Ouvrir</translation>
    </message>
</context>
</TS>
"#;

    #[rstest]
    fn find_references_matches_context_source_and_disambiguation() {
        let db = LinguistDatabaseImpl::default();
        let pt = create_catalog_file(&db, "/project/app_pt_BR.ts", SAMPLE_CATALOG);
        let fr = create_catalog_file(&db, "/project/app_fr.ts", FRENCH_CATALOG);

        let key = key_for_message(&db, pt, MessageRef { context: 0, message: 1 }).unwrap();
        let locations = find_references(&db, key, &[pt, fr]);

        assert_that!(locations, len(eq(2)));
        assert_that!(locations[0].uri.as_str(), eq("file:///project/app_pt_BR.ts"));
        assert_that!(locations[0].range.start.line, eq(12));
        assert_that!(locations[1].uri.as_str(), eq("file:///project/app_fr.ts"));
        assert_that!(locations[1].range.start.line, eq(8));
    }

    #[rstest]
    fn find_references_only_in_own_catalog() {
        let db = LinguistDatabaseImpl::default();
        let pt = create_catalog_file(&db, "/project/app_pt_BR.ts", SAMPLE_CATALOG);
        let fr = create_catalog_file(&db, "/project/app_fr.ts", FRENCH_CATALOG);

        let key = key_for_message(&db, pt, MessageRef { context: 1, message: 0 }).unwrap();
        let locations = find_references(&db, key, &[pt, fr]);

        assert_that!(locations, len(eq(1)));
        assert_that!(key.source(&db).as_str(), eq("Input device"));
    }

    #[rstest]
    fn key_for_message_out_of_range() {
        let db = LinguistDatabaseImpl::default();
        let pt = create_catalog_file(&db, "/project/app_pt_BR.ts", SAMPLE_CATALOG);

        assert_that!(key_for_message(&db, pt, MessageRef { context: 5, message: 0 }), none());
    }
}
