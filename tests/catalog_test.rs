//! lupdate が出力した実際のカタログを使ったテスト

#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use std::collections::HashSet;

use googletest::prelude::*;
use pretty_assertions::assert_eq;
use qt_linguist_language_server::catalog::{
    CatalogStatistics,
    FindingKind,
    Translator,
    parse_catalog,
    validate_catalog,
    write_catalog,
};
use rstest::rstest;

const PIANO_TUNER_PT: &str = include_str!("fixtures/piano_tuner_pt.ts");

#[test]
fn test_fixture_round_trip_is_byte_exact() {
    let parsed = parse_catalog(PIANO_TUNER_PT).unwrap();

    assert!(!parsed.skipped_content);
    assert_eq!(write_catalog(&parsed.catalog), PIANO_TUNER_PT);
}

#[googletest::test]
fn test_fixture_statistics() {
    let catalog = parse_catalog(PIANO_TUNER_PT).unwrap().catalog;
    let statistics = CatalogStatistics::from_catalog(&catalog);

    expect_that!(catalog.language.as_deref(), some(eq("pt_BR")));
    expect_that!(catalog.contexts, len(eq(18)));
    expect_that!(statistics.total.messages, eq(199));
    expect_that!(statistics.total.finished, eq(161));
    expect_that!(statistics.total.unfinished, eq(26));
    expect_that!(statistics.total.vanished, eq(12));
    expect_that!(statistics.total.obsolete, eq(0));
    // 161 / 187
    expect_that!(statistics.completion_percent, eq(86));
}

#[googletest::test]
fn test_fixture_keys_are_unique() {
    let catalog = parse_catalog(PIANO_TUNER_PT).unwrap().catalog;

    let keys: HashSet<(&str, &str, Option<&str>)> = catalog
        .messages()
        .map(|(_, context, message)| {
            (context.name.as_str(), message.source.as_str(), message.disambiguation())
        })
        .collect();

    expect_that!(keys.len(), eq(catalog.message_count()));
    expect_that!(
        validate_catalog(&catalog)
            .iter()
            .filter(|finding| finding.kind == FindingKind::DuplicateMessage)
            .count(),
        eq(0)
    );
}

#[rstest]
#[case::finished("MainWindow", "Entropy piano tuner", "Afinador de piano por entropia")]
#[case::unfinished_falls_back("AlgorithmDialog", "Algorithm:", "Algorithm:")]
#[case::missing_key("MainWindow", "Nonexistent", "Nonexistent")]
#[case::missing_context("NoSuchDialog", "Entropy piano tuner", "Entropy piano tuner")]
fn test_fixture_translate(#[case] context: &str, #[case] source: &str, #[case] expected: &str) {
    let catalog = parse_catalog(PIANO_TUNER_PT).unwrap().catalog;
    let translator = Translator::from_catalog(&catalog);

    assert_that!(catalog.translate(context, source), eq(expected));
    assert_that!(translator.translate(context, source), eq(expected));
}

#[googletest::test]
fn test_fixture_reports_unfinished_entries_with_text() {
    let catalog = parse_catalog(PIANO_TUNER_PT).unwrap().catalog;

    let unfinished: Vec<String> = validate_catalog(&catalog)
        .into_iter()
        .filter(|finding| finding.kind == FindingKind::UnfinishedWithText)
        .filter_map(|finding| catalog.message(finding.message_ref))
        .map(|(_, message)| message.source.clone())
        .collect();

    expect_that!(unfinished, len(eq(9)));
    expect_that!(unfinished, contains(eq("Algorithm:")));
}
