//! Code actions on catalog messages.
//!
//! Edits are surgical: only the `<translation>` start tag or its content
//! changes, so the rest of the document keeps its formatting.

use std::collections::HashMap;

use tower_lsp::lsp_types::{
    CodeAction,
    CodeActionKind,
    CodeActionOrCommand,
    Diagnostic,
    NumberOrString,
    Range,
    TextEdit,
    Url,
    WorkspaceEdit,
};

use crate::catalog::validation::is_placeholder;
use crate::catalog::writer::{
    escape_text,
    translation_start_tag,
};
use crate::catalog::{
    FindingKind,
    Message,
    MessageRef,
    TranslationStatus,
};
use crate::db::LinguistDatabase;
use crate::input::catalog_file::CatalogFile;
use crate::syntax::{
    message_at_position,
    parse_catalog_file,
};
use crate::types::{
    ByteSpan,
    LineIndex,
};

/// Edit that switches the message to `status`.
///
/// Returns `None` when the message already has that status or has no
/// `<translation>` element.
pub fn status_edit(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
    message_ref: MessageRef,
    status: TranslationStatus,
) -> Option<TextEdit> {
    let parsed = parse_catalog_file(db, file).as_ref().ok()?;
    let (_, message) = parsed.catalog.message(message_ref)?;
    if message.status() == status {
        return None;
    }

    let text = file.text(db);
    let tag_span = parsed.message_spans(message_ref)?.translation_tag?;
    let old_tag = text.get(tag_span.start..tag_span.end)?;

    let variants = has_length_variants(message);
    let new_tag = if is_self_closing(old_tag) {
        self_closing_tag(status, variants)
    } else {
        translation_start_tag(status, variants)
    };

    Some(TextEdit { range: LineIndex::new(text).range(tag_span).into(), new_text: new_tag })
}

/// Edit that fills an empty translation with the source text.
fn copy_source_edit(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
    message_ref: MessageRef,
) -> Option<TextEdit> {
    let parsed = parse_catalog_file(db, file).as_ref().ok()?;
    let (_, message) = parsed.catalog.message(message_ref)?;
    if message.numerus
        || has_length_variants(message)
        || !message.translation.text.is_empty()
        || message.source.is_empty()
    {
        return None;
    }

    let text = file.text(db);
    let line_index = LineIndex::new(text);
    let spans = parsed.message_spans(message_ref)?;
    let escaped = escape_text(&message.source);

    match spans.translation {
        Some(content) => {
            Some(TextEdit { range: line_index.range(content).into(), new_text: escaped })
        }
        None => {
            // <translation type="unfinished"/> は開始タグと終了タグに展開する
            let tag_span = spans.translation_tag?;
            Some(TextEdit {
                range: line_index.range(tag_span).into(),
                new_text: format!(
                    "{}{escaped}</translation>",
                    translation_start_tag(message.status(), false)
                ),
            })
        }
    }
}

/// `<translation …/>`
fn is_self_closing(tag: &str) -> bool {
    tag.trim_end().ends_with("/>")
}

/// Whether the `<translation>` element carries `variants="yes"`.
fn has_length_variants(message: &Message) -> bool {
    !message.numerus && !message.translation.length_variants.is_empty()
}

/// Self-closing form of [`translation_start_tag`].
fn self_closing_tag(status: TranslationStatus, variants: bool) -> String {
    let start = translation_start_tag(status, variants);
    let inner = start.strip_suffix('>').unwrap_or(&start);
    format!("{inner}/>")
}

/// Code actions for the message under `range.start`.
pub fn generate_code_actions(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
    uri: &Url,
    range: Range,
    diagnostics: &[Diagnostic],
) -> Vec<CodeActionOrCommand> {
    let Some(message_ref) = message_at_position(db, file, range.start.into()) else {
        return Vec::new();
    };
    let Ok(parsed) = parse_catalog_file(db, file) else {
        return Vec::new();
    };
    let Some((_, message)) = parsed.catalog.message(message_ref) else {
        return Vec::new();
    };
    let Some(element) = parsed.message_spans(message_ref).map(|spans| spans.element) else {
        return Vec::new();
    };

    let line_index = LineIndex::new(file.text(db));
    let related = |kind: FindingKind| -> Vec<Diagnostic> {
        diagnostics
            .iter()
            .filter(|diagnostic| {
                matches!(&diagnostic.code, Some(NumberOrString::String(code)) if code == kind.code())
                    && span_contains(&line_index, element, diagnostic.range)
            })
            .cloned()
            .collect()
    };

    let mut actions = Vec::new();
    match message.status() {
        TranslationStatus::Unfinished if !is_placeholder(message) => {
            if let Some(edit) = status_edit(db, file, message_ref, TranslationStatus::Finished) {
                let fixes = related(FindingKind::UnfinishedWithText);
                actions.push(action("Mark translation as finished", uri, edit, fixes));
            }
        }
        TranslationStatus::Finished => {
            if let Some(edit) = status_edit(db, file, message_ref, TranslationStatus::Unfinished) {
                let fixes = related(FindingKind::EmptyTranslation);
                actions.push(action("Mark translation as unfinished", uri, edit, fixes));
            }
        }
        _ => {}
    }

    if message.status().is_active()
        && let Some(edit) = copy_source_edit(db, file, message_ref)
    {
        actions.push(action("Copy source text to translation", uri, edit, Vec::new()));
    }

    actions
}

/// Whether `range` lies inside `span`.
fn span_contains(line_index: &LineIndex<'_>, span: ByteSpan, range: Range) -> bool {
    let element = line_index.range(span);
    element.contains(range.start.into()) && element.contains(range.end.into())
}

/// A quick fix applying `edit` to `uri`.
fn action(title: &str, uri: &Url, edit: TextEdit, diagnostics: Vec<Diagnostic>) -> CodeActionOrCommand {
    let is_preferred = !diagnostics.is_empty();
    CodeActionOrCommand::CodeAction(CodeAction {
        title: title.to_string(),
        kind: Some(CodeActionKind::QUICKFIX),
        diagnostics: is_preferred.then_some(diagnostics),
        edit: Some(WorkspaceEdit {
            changes: Some(HashMap::from([(uri.clone(), vec![edit])])),
            ..WorkspaceEdit::default()
        }),
        is_preferred: is_preferred.then_some(true),
        ..CodeAction::default()
    })
}
