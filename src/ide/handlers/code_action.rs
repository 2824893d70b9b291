//! Code Action ハンドラー
//!
//! 翻訳ステータスの変更などのクイックフィックスを返します。

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CodeActionKind,
    CodeActionParams,
    CodeActionResponse,
};

use super::super::backend::Backend;

/// `textDocument/codeAction` リクエストを処理
///
/// All actions are quick fixes; a request restricted to other kinds gets none.
pub async fn handle_code_action(
    backend: &Backend,
    params: CodeActionParams,
) -> Result<Option<CodeActionResponse>> {
    let uri = &params.text_document.uri;
    tracing::debug!(uri = %uri, line = params.range.start.line, "Code Action request");

    if let Some(only) = &params.context.only
        && !only.iter().any(|kind| CodeActionKind::QUICKFIX.as_str().starts_with(kind.as_str()))
    {
        return Ok(None);
    }

    let Some(file) = backend.catalog_for_uri(uri).await else {
        return Ok(None);
    };

    let actions = {
        let db = backend.state.db.lock().await;
        crate::ide::code_actions::generate_code_actions(
            &*db,
            file,
            uri,
            params.range,
            &params.context.diagnostics,
        )
    };

    tracing::debug!(count = actions.len(), "Generated code actions");
    Ok((!actions.is_empty()).then_some(actions))
}
