//! Document formatting: rewrites a catalog in lupdate layout.

use tower_lsp::lsp_types::{
    Position,
    Range,
    TextEdit,
};

use crate::catalog::write_catalog;
use crate::db::LinguistDatabase;
use crate::input::catalog_file::CatalogFile;
use crate::syntax::parse_catalog_file;
use crate::types::LineIndex;

/// Returns `None` when the document cannot be parsed or holds content the
/// writer would drop (XML comments, unknown elements), and no edits when it
/// is already formatted.
pub fn format_catalog(db: &dyn LinguistDatabase, file: CatalogFile) -> Option<Vec<TextEdit>> {
    let parsed = parse_catalog_file(db, file).as_ref().ok()?;
    if parsed.skipped_content {
        tracing::debug!(file = %file.file_path(db), "Not formatting: document has unknown content");
        return None;
    }
    let text = file.text(db);
    let formatted = write_catalog(&parsed.catalog);

    if formatted == *text {
        return Some(Vec::new());
    }

    let line_index = LineIndex::new(text);
    let range = Range { start: Position::default(), end: line_index.end_position().into() };
    Some(vec![TextEdit { range, new_text: formatted }])
}
