//! Execute Command ハンドラー
//!
//! `workspace/executeCommand` リクエストを処理し、
//! カスタムコマンドを実行します。

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{
    Value,
    json,
};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    ExecuteCommandParams,
    MessageType,
    Position,
    Url,
    WorkspaceEdit,
};

use super::super::backend::Backend;
use crate::catalog::TranslationStatus;
use crate::ide::hover::get_language_priority;
use crate::syntax::{
    catalog_language,
    catalog_translator,
    message_at_position,
    parse_catalog_file,
};

pub const TRANSLATE_COMMAND: &str = "qtLinguist.translate";
pub const GET_STATISTICS_COMMAND: &str = "qtLinguist.getStatistics";
pub const SET_STATUS_COMMAND: &str = "qtLinguist.setStatus";
pub const SET_CURRENT_LANGUAGE_COMMAND: &str = "qtLinguist.setCurrentLanguage";

/// Commands advertised in `initialize`.
pub const COMMANDS: [&str; 4] = [
    TRANSLATE_COMMAND,
    GET_STATISTICS_COMMAND,
    SET_STATUS_COMMAND,
    SET_CURRENT_LANGUAGE_COMMAND,
];

/// `workspace/executeCommand` リクエストを処理
pub async fn handle_execute_command(
    backend: &Backend,
    params: ExecuteCommandParams,
) -> Result<Option<Value>> {
    tracing::debug!(command = %params.command, "Execute Command request");

    match params.command.as_str() {
        TRANSLATE_COMMAND => handle_translate(backend, params.arguments).await,
        GET_STATISTICS_COMMAND => handle_get_statistics(backend, params.arguments).await,
        SET_STATUS_COMMAND => handle_set_status(backend, params.arguments).await,
        SET_CURRENT_LANGUAGE_COMMAND => handle_set_current_language(backend, params.arguments).await,
        _ => {
            tracing::warn!("Unknown command: {}", params.command);
            Ok(None)
        }
    }
}

/// 最初の引数をデシリアライズする。引数なしは `None`。
fn parse_first_argument<T: for<'de> Deserialize<'de>>(
    command: &str,
    arguments: Vec<Value>,
) -> Option<T> {
    let first_arg = arguments.into_iter().next()?;
    match serde_json::from_value(first_arg) {
        Ok(args) => Some(args),
        Err(e) => {
            tracing::warn!("Invalid arguments for {}: {}", command, e);
            None
        }
    }
}

/// `qtLinguist.translate` コマンドの引数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateArgs {
    /// `<context><name>`
    context: String,
    /// Source text to translate.
    source: String,
    /// Disambiguation comment.
    disambiguation: Option<String>,
    /// 省略時は currentLanguage → primaryLanguages → アルファベット順の先頭
    language: Option<String>,
}

/// `qtLinguist.translate` コマンドを実行
///
/// Returns the finished translation, or the source text when there is none.
async fn handle_translate(backend: &Backend, arguments: Vec<Value>) -> Result<Option<Value>> {
    let Some(args) = parse_first_argument::<TranslateArgs>(TRANSLATE_COMMAND, arguments) else {
        return Ok(None);
    };

    backend.wait_for_catalogs().await;

    let primary_languages =
        backend.config_manager.lock().await.get_settings().primary_languages.clone();
    let current_language = backend.state.current_language.lock().await.clone();
    let requested = args.language.clone().or(current_language);
    let catalogs = backend.state.sorted_catalogs().await;

    let db = backend.state.db.lock().await;
    let mut languages: Vec<_> =
        catalogs.iter().map(|file| (catalog_language(&*db, *file), *file)).collect();
    languages.sort_by(|a, b| {
        get_language_priority(&a.0, requested.as_deref(), primary_languages.as_deref())
            .cmp(&get_language_priority(&b.0, requested.as_deref(), primary_languages.as_deref()))
    });

    // 言語指定がある場合はその言語のみ
    let chosen = languages
        .iter()
        .find(|(language, _)| args.language.as_ref().is_none_or(|wanted| wanted == language));

    let translated = chosen.map_or(args.source.as_str(), |(_, file)| {
        catalog_translator(&*db, *file).translate_disambiguated(
            &args.context,
            &args.source,
            args.disambiguation.as_deref(),
        )
    });
    let result = Value::String(translated.to_string());
    drop(db);

    Ok(Some(result))
}

/// `qtLinguist.getStatistics` コマンドの引数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetStatisticsArgs {
    /// 省略時は全カタログ
    uri: Option<String>,
}

/// `qtLinguist.getStatistics` コマンドを実行
///
/// Returns `[{ uri, language, messages, finished, ..., contexts }]`.
async fn handle_get_statistics(backend: &Backend, arguments: Vec<Value>) -> Result<Option<Value>> {
    let args = parse_first_argument::<GetStatisticsArgs>(GET_STATISTICS_COMMAND, arguments)
        .unwrap_or_default();

    backend.wait_for_catalogs().await;

    let only = args.uri.as_deref().and_then(|uri| Url::parse(uri).ok());
    let catalogs = backend.state.sorted_catalogs().await;

    let db = backend.state.db.lock().await;
    let mut results = Vec::new();
    for file in catalogs {
        let Ok(uri) = Url::from_file_path(file.file_path(&*db)) else {
            continue;
        };
        if only.as_ref().is_some_and(|wanted| *wanted != uri) {
            continue;
        }
        let Ok(parsed) = parse_catalog_file(&*db, file) else {
            continue;
        };

        let mut statistics = parsed.catalog.statistics();
        statistics.language = Some(catalog_language(&*db, file));
        match serde_json::to_value(&statistics) {
            Ok(Value::Object(mut object)) => {
                object.insert("uri".to_string(), Value::String(uri.to_string()));
                results.push(Value::Object(object));
            }
            Ok(_) => {}
            Err(error) => tracing::warn!(%error, "Failed to serialize statistics"),
        }
    }
    drop(db);

    Ok(Some(Value::Array(results)))
}

/// `qtLinguist.setStatus` コマンドの引数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetStatusArgs {
    /// Catalog document.
    uri: String,
    /// Any position inside the message.
    position: Position,
    /// `finished` または `unfinished`
    status: String,
}

/// `qtLinguist.setStatus` コマンドを実行
///
/// Asks the client to apply the edit. Returns whether it was applied.
async fn handle_set_status(backend: &Backend, arguments: Vec<Value>) -> Result<Option<Value>> {
    let Some(args) = parse_first_argument::<SetStatusArgs>(SET_STATUS_COMMAND, arguments) else {
        return Ok(Some(json!(false)));
    };

    let status = match args.status.as_str() {
        "finished" => TranslationStatus::Finished,
        "unfinished" => TranslationStatus::Unfinished,
        other => {
            tracing::warn!("Unsupported status for {}: {}", SET_STATUS_COMMAND, other);
            return Ok(Some(json!(false)));
        }
    };

    let Ok(uri) = Url::parse(&args.uri) else {
        tracing::warn!("Invalid URI: {}", args.uri);
        return Ok(Some(json!(false)));
    };
    let Some(file) = backend.catalog_for_uri(&uri).await else {
        return Ok(Some(json!(false)));
    };

    let edit = {
        let db = backend.state.db.lock().await;
        message_at_position(&*db, file, args.position.into()).and_then(|message_ref| {
            crate::ide::code_actions::status_edit(&*db, file, message_ref, status)
        })
    };
    let Some(edit) = edit else {
        return Ok(Some(json!(false)));
    };

    let workspace_edit = WorkspaceEdit {
        changes: Some(HashMap::from([(uri, vec![edit])])),
        ..WorkspaceEdit::default()
    };

    match backend.client.apply_edit(workspace_edit).await {
        Ok(response) => Ok(Some(json!(response.applied))),
        Err(error) => {
            tracing::warn!(%error, "workspace/applyEdit failed");
            Ok(Some(json!(false)))
        }
    }
}

/// `qtLinguist.setCurrentLanguage` コマンドの引数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetCurrentLanguageArgs {
    /// 設定する言語コード（null でリセット）
    language: Option<String>,
}

/// `qtLinguist.setCurrentLanguage` コマンドを実行
///
/// 現在の表示言語を変更する。ホバーと `qtLinguist.translate` で使用される。
async fn handle_set_current_language(
    backend: &Backend,
    arguments: Vec<Value>,
) -> Result<Option<Value>> {
    // 引数なしの場合はリセット
    let parsed_args = if arguments.is_empty() {
        SetCurrentLanguageArgs { language: None }
    } else {
        let Some(args) =
            parse_first_argument::<SetCurrentLanguageArgs>(SET_CURRENT_LANGUAGE_COMMAND, arguments)
        else {
            return Ok(None);
        };
        args
    };

    tracing::debug!(language = ?parsed_args.language, "Executing qtLinguist.setCurrentLanguage");

    let mut current_language = backend.state.current_language.lock().await;
    current_language.clone_from(&parsed_args.language);
    drop(current_language);

    backend
        .client
        .log_message(
            MessageType::INFO,
            format!("Current language set to: {:?}", parsed_args.language),
        )
        .await;

    Ok(None)
}
