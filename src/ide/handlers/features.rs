//! LSP 機能ハンドラー
//!
//! `hover`, `goto_definition`, `references`, `documentSymbol`, `formatting` の処理を担当します。

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    DocumentFormattingParams,
    DocumentSymbolParams,
    DocumentSymbolResponse,
    GotoDefinitionParams,
    GotoDefinitionResponse,
    Hover,
    HoverContents,
    HoverParams,
    Location,
    MarkupContent,
    MarkupKind,
    ReferenceParams,
    TextEdit,
};

use super::super::backend::Backend;
use crate::syntax::message_at_position;
use crate::types::SourcePosition;

/// `textDocument/hover` リクエストを処理
pub async fn handle_hover(backend: &Backend, params: HoverParams) -> Result<Option<Hover>> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Hover request");

    // 他のカタログの翻訳を表示するため、インデックス完了を待つ
    if !backend.wait_for_catalogs().await {
        tracing::debug!("Hover request timeout - catalogs not indexed yet");
        return Ok(None);
    }

    let Some(file) = backend.catalog_for_uri(&uri).await else {
        return Ok(None);
    };

    let primary_languages =
        backend.config_manager.lock().await.get_settings().primary_languages.clone();
    let current_language = backend.state.current_language.lock().await.clone();
    let catalogs = backend.state.sorted_catalogs().await;

    let hover_text = {
        let db = backend.state.db.lock().await;
        let Some(message_ref) = message_at_position(&*db, file, SourcePosition::from(position))
        else {
            tracing::debug!("No message found at position");
            return Ok(None);
        };
        crate::ide::hover::generate_hover_content(
            &*db,
            file,
            message_ref,
            &catalogs,
            current_language.as_deref(),
            primary_languages.as_deref(),
        )
    };

    Ok(hover_text.map(|value| Hover {
        contents: HoverContents::Markup(MarkupContent { kind: MarkupKind::Markdown, value }),
        range: None,
    }))
}

/// `textDocument/definition` リクエストを処理
pub async fn handle_goto_definition(
    backend: &Backend,
    params: GotoDefinitionParams,
) -> Result<Option<GotoDefinitionResponse>> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Goto Definition request");

    let Some(file) = backend.catalog_for_uri(&uri).await else {
        return Ok(None);
    };

    let locations = {
        let db = backend.state.db.lock().await;
        let Some(message_ref) = message_at_position(&*db, file, SourcePosition::from(position))
        else {
            return Ok(None);
        };
        crate::ide::goto_definition::find_definitions(&*db, file, message_ref)
    };

    tracing::debug!("Found {} source locations", locations.len());

    if locations.is_empty() {
        Ok(None)
    } else {
        Ok(Some(GotoDefinitionResponse::Array(locations)))
    }
}

/// `textDocument/references` リクエストを処理
pub async fn handle_references(
    backend: &Backend,
    params: ReferenceParams,
) -> Result<Option<Vec<Location>>> {
    let uri = params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "References request");

    if !backend.wait_for_catalogs().await {
        tracing::debug!("References request - catalogs not indexed yet");
        return Ok(None);
    }

    let Some(file) = backend.catalog_for_uri(&uri).await else {
        return Ok(None);
    };
    let catalogs = backend.state.sorted_catalogs().await;

    let locations = {
        let db = backend.state.db.lock().await;
        let Some(message_ref) = message_at_position(&*db, file, SourcePosition::from(position))
        else {
            return Ok(None);
        };
        let Some(key) = crate::ide::references::key_for_message(&*db, file, message_ref) else {
            return Ok(None);
        };

        let mut locations = crate::ide::references::find_references(&*db, key, &catalogs);
        if !params.context.include_declaration {
            // 自分自身を除外
            let own = crate::ide::references::find_references(&*db, key, &[file]);
            locations.retain(|location| !own.contains(location));
        }
        locations
    };

    tracing::debug!("Found {} references", locations.len());

    if locations.is_empty() { Ok(None) } else { Ok(Some(locations)) }
}

/// `textDocument/documentSymbol` リクエストを処理
pub async fn handle_document_symbol(
    backend: &Backend,
    params: DocumentSymbolParams,
) -> Result<Option<DocumentSymbolResponse>> {
    let Some(file) = backend.catalog_for_uri(&params.text_document.uri).await else {
        return Ok(None);
    };

    let db = backend.state.db.lock().await;
    let symbols = crate::ide::symbols::document_symbols(&*db, file);
    drop(db);

    Ok(Some(DocumentSymbolResponse::Nested(symbols)))
}

/// `textDocument/formatting` リクエストを処理
pub async fn handle_formatting(
    backend: &Backend,
    params: DocumentFormattingParams,
) -> Result<Option<Vec<TextEdit>>> {
    let Some(file) = backend.catalog_for_uri(&params.text_document.uri).await else {
        return Ok(None);
    };

    let db = backend.state.db.lock().await;
    let edits = crate::ide::formatting::format_catalog(&*db, file);
    drop(db);

    if edits.is_none() {
        tracing::debug!(uri = %params.text_document.uri, "Formatting skipped: document does not parse");
    }
    Ok(edits)
}
