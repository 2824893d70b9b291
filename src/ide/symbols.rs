//! Document outline: contexts with their messages.

use tower_lsp::lsp_types::{
    DocumentSymbol,
    Range,
    SymbolKind,
};

use crate::catalog::{
    CatalogStatistics,
    MessageRef,
};
use crate::db::LinguistDatabase;
use crate::input::catalog_file::CatalogFile;
use crate::syntax::parse_catalog_file;
use crate::types::LineIndex;

/// シンボル名の最大長
const MAX_NAME_LENGTH: usize = 60;

pub fn document_symbols(db: &dyn LinguistDatabase, file: CatalogFile) -> Vec<DocumentSymbol> {
    let Ok(parsed) = parse_catalog_file(db, file) else {
        return Vec::new();
    };
    let line_index = LineIndex::new(file.text(db));
    let statistics = CatalogStatistics::from_catalog(&parsed.catalog);

    parsed
        .catalog
        .contexts
        .iter()
        .zip(&parsed.spans.contexts)
        .zip(&statistics.contexts)
        .enumerate()
        .map(|(context_index, ((context, spans), stats))| {
            let range: Range = line_index.range(spans.element).into();
            let selection_range = spans.name.map_or(range, |span| line_index.range(span).into());

            let children = context
                .messages
                .iter()
                .enumerate()
                .filter_map(|(message_index, message)| {
                    let message_ref = MessageRef { context: context_index, message: message_index };
                    let message_spans = parsed.message_spans(message_ref)?;
                    let range: Range = line_index.range(message_spans.element).into();
                    let selection_range =
                        message_spans.source.map_or(range, |span| line_index.range(span).into());
                    Some(symbol(
                        symbol_name(&message.source),
                        Some(message.status().to_string()),
                        SymbolKind::STRING,
                        range,
                        selection_range,
                        None,
                    ))
                })
                .collect();

            symbol(
                symbol_name(&context.name),
                Some(format!("{}% complete", stats.completion_percent)),
                SymbolKind::CLASS,
                range,
                selection_range,
                Some(children),
            )
        })
        .collect()
}

/// エディタは空の名前を受け付けないため置き換える
fn symbol_name(text: &str) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.trim().is_empty() {
        return "(empty)".to_string();
    }
    if single_line.chars().count() > MAX_NAME_LENGTH {
        let truncated: String = single_line.chars().take(MAX_NAME_LENGTH - 3).collect();
        return format!("{truncated}...");
    }
    single_line
}

#[allow(deprecated)]
/// `DocumentSymbol` のコンストラクタ（deprecated フィールド対策）
fn symbol(
    name: String,
    detail: Option<String>,
    kind: SymbolKind,
    range: Range,
    selection_range: Range,
    children: Option<Vec<DocumentSymbol>>,
) -> DocumentSymbol {
    DocumentSymbol {
        name,
        detail,
        kind,
        tags: None,
        deprecated: None,
        range,
        selection_range,
        children,
    }
}
