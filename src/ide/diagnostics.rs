//! 診断メッセージ生成モジュール

use tower_lsp::lsp_types::{
    Diagnostic,
    DiagnosticRelatedInformation,
    DiagnosticSeverity,
    Location,
    NumberOrString,
    Range,
    Url,
};

use crate::catalog::{
    MessageRef,
    ParsedCatalog,
};
use crate::config::DiagnosticsConfig;
use crate::db::LinguistDatabase;
use crate::input::catalog_file::CatalogFile;
use crate::syntax::{
    catalog_findings,
    parse_catalog_file,
};
use crate::types::LineIndex;

/// `source` field of every diagnostic.
pub const DIAGNOSTIC_SOURCE: &str = "qt-linguist";

/// Diagnostic code for documents that cannot be read.
pub const PARSE_ERROR_CODE: &str = "parse-error";

/// カタログファイルの診断メッセージを生成
///
/// A document that fails to parse gets a single error at the failing
/// offset. Otherwise every finding is reported with the severity the
/// configuration assigns to its kind. Kinds set to `off` are dropped.
pub fn generate_diagnostics(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
    uri: &Url,
    config: &DiagnosticsConfig,
) -> Vec<Diagnostic> {
    let text = file.text(db);
    let line_index = LineIndex::new(text);

    tracing::debug!("Generating diagnostics for catalog '{}'", file.file_path(db));

    let parsed = match parse_catalog_file(db, file) {
        Ok(parsed) => parsed,
        Err(error) => {
            let position = line_index.position(error.offset().unwrap_or(0)).into();
            return vec![Diagnostic {
                range: Range { start: position, end: position },
                severity: Some(DiagnosticSeverity::ERROR),
                code: Some(NumberOrString::String(PARSE_ERROR_CODE.to_string())),
                source: Some(DIAGNOSTIC_SOURCE.to_string()),
                message: error.to_string(),
                ..Diagnostic::default()
            }];
        }
    };

    let mut diagnostics = Vec::new();
    for finding in catalog_findings(db, file) {
        let Some(severity) = config.severity(finding.kind).to_lsp() else {
            continue;
        };
        let Some(range) = message_range(parsed, &line_index, finding.message_ref) else {
            continue;
        };

        let related_information = finding.related.and_then(|related| {
            let range = message_range(parsed, &line_index, related)?;
            Some(vec![DiagnosticRelatedInformation {
                location: Location { uri: uri.clone(), range },
                message: "First occurrence".to_string(),
            }])
        });

        diagnostics.push(Diagnostic {
            range,
            severity: Some(severity),
            code: Some(NumberOrString::String(finding.kind.code().to_string())),
            source: Some(DIAGNOSTIC_SOURCE.to_string()),
            message: finding.message.clone(),
            related_information,
            ..Diagnostic::default()
        });
    }

    diagnostics
}

/// Range of the `<source>` text, falling back to the whole `<message>`.
pub fn message_range(
    parsed: &ParsedCatalog,
    line_index: &LineIndex<'_>,
    message_ref: MessageRef,
) -> Option<Range> {
    let spans = parsed.message_spans(message_ref)?;
    let span = spans.source.filter(|span| span.start < span.end).unwrap_or(spans.element);
    Some(line_index.range(span).into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;

    use super::*;
    use crate::config::Severity;
    use crate::db::LinguistDatabaseImpl;
    use crate::test_utils::{
        SAMPLE_CATALOG,
        create_catalog_file,
    };

    fn uri() -> Url {
        Url::parse("file:///project/translations/app_pt_BR.ts").unwrap()
    }

    #[googletest::test]
    fn test_generate_diagnostics_for_sample() {
        let db = LinguistDatabaseImpl::default();
        let file = create_catalog_file(&db, "/project/translations/app_pt_BR.ts", SAMPLE_CATALOG);

        let diagnostics = generate_diagnostics(&db, file, &uri(), &DiagnosticsConfig::default());

        assert_that!(diagnostics, len(eq(2)));
        let open = &diagnostics[0];
        expect_that!(open.severity, some(eq(DiagnosticSeverity::HINT)));
        expect_that!(
            open.code,
            some(eq(&NumberOrString::String("unfinished-with-text".to_string())))
        );
        expect_that!(open.source.as_deref(), some(eq(DIAGNOSTIC_SOURCE)));
        // `<source>Open</source>` は 13 行目（0 始まりで 12 行目）
        expect_that!(open.range.start.line, eq(12));
        expect_that!(open.range.start.character, eq(16));
        expect_that!(open.range.end.character, eq(20));
    }

    #[googletest::test]
    fn test_generate_diagnostics_respects_off() {
        let db = LinguistDatabaseImpl::default();
        let file = create_catalog_file(&db, "/project/translations/app_pt_BR.ts", SAMPLE_CATALOG);
        let config =
            DiagnosticsConfig { unfinished_with_text: Severity::Off, ..DiagnosticsConfig::default() };

        let diagnostics = generate_diagnostics(&db, file, &uri(), &config);

        expect_that!(diagnostics, len(eq(0)));
    }

    #[googletest::test]
    fn test_generate_diagnostics_parse_error() {
        let db = LinguistDatabaseImpl::default();
        let text = "<?xml version=\"1.0\"?>\n<TS version=\"2.1\">\n<context>\n</TS>\n";
        let file = create_catalog_file(&db, "/project/broken.ts", text);

        let diagnostics = generate_diagnostics(&db, file, &uri(), &DiagnosticsConfig::default());

        assert_that!(diagnostics, len(eq(1)));
        expect_that!(diagnostics[0].severity, some(eq(DiagnosticSeverity::ERROR)));
        expect_that!(
            diagnostics[0].code,
            some(eq(&NumberOrString::String(PARSE_ERROR_CODE.to_string())))
        );
        expect_that!(diagnostics[0].range.start.line, ge(1));
    }

    #[googletest::test]
    fn test_generate_diagnostics_duplicate_has_related_information() {
        let db = LinguistDatabaseImpl::default();
        let text = r#"<TS version="2.1" language="de">
<context>
    <name>C</name>
    <message>
        <source>Quit</source>
        <translation>Beenden</translation>
    </message>
    <message>
        <source>Quit</source>
        <translation>Schließen</translation>
    </message>
</context>
</TS>
"#;
        let file = create_catalog_file(&db, "/project/app_de.ts", text);

        let diagnostics = generate_diagnostics(&db, file, &uri(), &DiagnosticsConfig::default());

        assert_that!(diagnostics, len(eq(1)));
        let duplicate = &diagnostics[0];
        expect_that!(duplicate.severity, some(eq(DiagnosticSeverity::ERROR)));
        expect_that!(duplicate.range.start.line, eq(8));
        let related = duplicate.related_information.as_ref().unwrap();
        assert_that!(related, len(eq(1)));
        expect_that!(related[0].location.range.start.line, eq(4));
        expect_that!(related[0].location.uri, eq(&uri()));
    }
}
