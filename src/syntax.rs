//! Tracked queries over catalog files.

use std::path::Path;

use crate::catalog::{
    CatalogError,
    Finding,
    MessageRef,
    ParsedCatalog,
    Translator,
    parse_catalog,
    validate_catalog,
};
use crate::db::LinguistDatabase;
use crate::input::catalog_file::{
    CatalogFile,
    detect_language_from_path,
};
use crate::interned::MessageKey;
use crate::types::{
    LineIndex,
    SourcePosition,
};

/// Parses a catalog file.
#[salsa::tracked(returns(ref))]
pub fn parse_catalog_file(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
) -> Result<ParsedCatalog, CatalogError> {
    let result = parse_catalog(file.text(db));
    if let Err(error) = &result {
        tracing::debug!(path = %file.file_path(db), %error, "Failed to parse catalog");
    }
    result
}

/// Language of a catalog: the `language` attribute, else a guess from the path.
#[salsa::tracked]
pub fn catalog_language(db: &dyn LinguistDatabase, file: CatalogFile) -> String {
    parse_catalog_file(db, file)
        .as_ref()
        .ok()
        .and_then(|parsed| parsed.catalog.language.clone())
        .filter(|language| !language.is_empty())
        .unwrap_or_else(|| detect_language_from_path(Path::new(file.file_path(db))))
}

/// Lookup index of the finished translations. Empty for unparsable files.
#[salsa::tracked(returns(ref))]
pub fn catalog_translator(db: &dyn LinguistDatabase, file: CatalogFile) -> Translator {
    parse_catalog_file(db, file)
        .as_ref()
        .map(|parsed| Translator::from_catalog(&parsed.catalog))
        .unwrap_or_default()
}

/// Validation findings of a catalog.
#[salsa::tracked(returns(ref))]
pub fn catalog_findings(db: &dyn LinguistDatabase, file: CatalogFile) -> Vec<Finding> {
    parse_catalog_file(db, file)
        .as_ref()
        .map(|parsed| validate_catalog(&parsed.catalog))
        .unwrap_or_default()
}

/// Interned keys of all messages, in document order.
#[salsa::tracked]
pub fn message_keys(db: &dyn LinguistDatabase, file: CatalogFile) -> Vec<MessageKey<'_>> {
    let Ok(parsed) = parse_catalog_file(db, file) else {
        return Vec::new();
    };

    parsed
        .catalog
        .messages()
        .map(|(_, context, message)| {
            MessageKey::new(
                db,
                context.name.clone(),
                message.source.clone(),
                message.disambiguation().map(str::to_string),
            )
        })
        .collect()
}

/// Finds the message under the cursor.
pub fn message_at_position(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
    position: SourcePosition,
) -> Option<MessageRef> {
    let parsed = parse_catalog_file(db, file).as_ref().ok()?;
    let offset = LineIndex::new(file.text(db)).offset(position);
    parsed.message_at_offset(offset)
}
