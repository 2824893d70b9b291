//! Hover implementation

use std::fmt::Write as _;

use crate::catalog::{
    Message,
    MessageRef,
    TranslationStatus,
};
use crate::db::LinguistDatabase;
use crate::input::catalog_file::CatalogFile;
use crate::syntax::{
    catalog_language,
    parse_catalog_file,
};

/// 他言語の翻訳を表示する際の最大長
const MAX_TRANSLATION_LENGTH: usize = 80;

/// Generates the hover for the message at `message_ref` in `file`.
///
/// The same (context, source, disambiguation) key is looked up in every
/// catalog and the translations are listed per language.
///
/// # ソート順
/// 1. `current_language`（設定されている場合）
/// 2. `primary_languages`（設定順）
/// 3. その他（アルファベット順）
pub fn generate_hover_content(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
    message_ref: MessageRef,
    catalogs: &[CatalogFile],
    current_language: Option<&str>,
    primary_languages: Option<&[String]>,
) -> Option<String> {
    let parsed = parse_catalog_file(db, file).as_ref().ok()?;
    let (context, message) = parsed.catalog.message(message_ref)?;

    let mut content = format!("**Context:** `{}`\n\n", context.name);
    let _ = writeln!(content, "**Source:** {}\n", truncate_string(&message.source, MAX_TRANSLATION_LENGTH));
    if let Some(disambiguation) = message.disambiguation() {
        let _ = writeln!(content, "**Disambiguation:** {disambiguation}\n");
    }
    if let Some(extra) = message.extra_comment.as_deref().filter(|c| !c.is_empty()) {
        let _ = writeln!(content, "**Developer note:** {extra}\n");
    }
    if let Some(note) = message.translator_comment.as_deref().filter(|c| !c.is_empty()) {
        let _ = writeln!(content, "**Translator note:** {note}\n");
    }
    let _ = writeln!(content, "**Status:** {}\n", message.status());

    let mut translations_found = Vec::new();
    for catalog in catalogs {
        let Ok(other) = parse_catalog_file(db, *catalog) else {
            continue;
        };
        if let Some(found) =
            other.catalog.find_message(&context.name, &message.source, message.disambiguation())
        {
            translations_found.push((catalog_language(db, *catalog), format_translation(found)));
        }
    }

    if !translations_found.is_empty() {
        sort_translations_by_priority(&mut translations_found, current_language, primary_languages);
        content.push_str("---\n\n");
        for (language, value) in translations_found {
            let _ = writeln!(content, "**{language}**: {value}  ");
        }
    }

    let locations = parsed
        .catalog
        .resolved_locations()
        .into_iter()
        .find(|(candidate, _)| *candidate == message_ref)
        .map(|(_, locations)| locations)
        .unwrap_or_default();
    if !locations.is_empty() {
        let formatted: Vec<String> = locations
            .iter()
            .map(|location| match location.line {
                Some(line) => format!("`{}:{line}`", location.filename),
                None => format!("`{}`", location.filename),
            })
            .collect();
        let _ = write!(content, "\n**Locations:** {}", formatted.join(", "));
    }

    Some(content.trim_end().to_string())
}

/// 翻訳を表示用文字列にする
fn format_translation(message: &Message) -> String {
    let text = if message.numerus {
        message
            .translation
            .numerus_forms
            .iter()
            .map(|form| truncate_string(form, MAX_TRANSLATION_LENGTH))
            .collect::<Vec<_>>()
            .join(" | ")
    } else {
        truncate_string(&message.translation.text, MAX_TRANSLATION_LENGTH)
    };

    let text = if text.trim().is_empty() { "*(empty)*".to_string() } else { text };
    match message.status() {
        TranslationStatus::Finished => text,
        status => format!("{text} *({status})*"),
    }
}

/// 文字列を指定した長さに切り詰める
fn truncate_string(s: &str, max_len: usize) -> String {
    let single_line = s.replace('\n', " ");
    if single_line.chars().count() <= max_len {
        single_line
    } else {
        let truncated: String = single_line.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}

/// 翻訳結果を優先度順にソート
fn sort_translations_by_priority(
    translations: &mut [(String, String)],
    current_language: Option<&str>,
    primary_languages: Option<&[String]>,
) {
    translations.sort_by(|a, b| {
        let priority_a = get_language_priority(&a.0, current_language, primary_languages);
        let priority_b = get_language_priority(&b.0, current_language, primary_languages);
        priority_a.cmp(&priority_b)
    });
}

/// Language priority for sorting. Variant order is the sort order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LanguagePriority<'a> {
    /// Current language (highest priority)
    Current,
    /// Primary language with its position index
    Primary(usize),
    /// Other language (sorted alphabetically)
    Other(&'a str),
}

/// 言語の優先度を計算
#[must_use]
pub fn get_language_priority<'a>(
    lang: &'a str,
    current_language: Option<&str>,
    primary_languages: Option<&[String]>,
) -> LanguagePriority<'a> {
    if current_language.is_some_and(|c| c == lang) {
        return LanguagePriority::Current;
    }

    if let Some(primaries) = primary_languages
        && let Some(pos) = primaries.iter().position(|p| p == lang)
    {
        return LanguagePriority::Primary(pos);
    }

    LanguagePriority::Other(lang)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::db::LinguistDatabaseImpl;
    use crate::test_utils::{
        SAMPLE_CATALOG,
        create_catalog_file,
    };

    const GERMAN_CATALOG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="de">
<context>
    <name>MainWindow</name>
    <message>
        <source>&amp;File</source>
        <translation>&amp;Datei</translation>
    </message>
    <message>
        <source>Open</source>
        <comment>menu entry</comment>
        <translation>Öffnen</translation>
    </message>
</context>
</TS>
"#;

    const FILE_REF: MessageRef = MessageRef { context: 0, message: 0 };
    const OPEN_REF: MessageRef = MessageRef { context: 0, message: 1 };

    fn setup(db: &LinguistDatabaseImpl) -> (CatalogFile, Vec<CatalogFile>) {
        let pt = create_catalog_file(db, "/project/translations/app_pt_BR.ts", SAMPLE_CATALOG);
        let de = create_catalog_file(db, "/project/translations/app_de.ts", GERMAN_CATALOG);
        (pt, vec![pt, de])
    }

    #[rstest]
    fn generate_hover_content_lists_all_languages_alphabetically() {
        let db = LinguistDatabaseImpl::default();
        let (pt, catalogs) = setup(&db);

        let content = generate_hover_content(&db, pt, FILE_REF, &catalogs, None, None).unwrap();

        assert_that!(content, starts_with("**Context:** `MainWindow`"));
        assert_that!(content, contains_substring("**Source:** &File"));
        assert_that!(content, contains_substring("**Status:** finished"));
        assert_that!(content, contains_substring("**de**: &Datei  \n**pt_BR**: &Arquivo"));
        assert_that!(content, not(contains_substring("**Locations:**")));
    }

    #[rstest]
    fn generate_hover_content_shows_comments_status_and_locations() {
        let db = LinguistDatabaseImpl::default();
        let (pt, catalogs) = setup(&db);

        let content = generate_hover_content(&db, pt, OPEN_REF, &catalogs, None, None).unwrap();

        assert_that!(content, contains_substring("**Disambiguation:** menu entry"));
        assert_that!(content, contains_substring("**Translator note:** check wording"));
        assert_that!(content, contains_substring("**Status:** unfinished"));
        assert_that!(content, contains_substring("**pt_BR**: Abrir *(unfinished)*"));
        assert_that!(content, contains_substring("**de**: Öffnen"));
        assert_that!(
            content,
            ends_with("**Locations:** `../mainwindow.cpp:120`, `../mainwindow.cpp:124`")
        );
    }

    #[rstest]
    fn generate_hover_content_with_current_language_priority() {
        let db = LinguistDatabaseImpl::default();
        let (pt, catalogs) = setup(&db);

        let content =
            generate_hover_content(&db, pt, FILE_REF, &catalogs, Some("pt_BR"), None).unwrap();

        assert_that!(content, contains_substring("**pt_BR**: &Arquivo  \n**de**: &Datei"));
    }

    #[rstest]
    fn generate_hover_content_current_overrides_primary() {
        let db = LinguistDatabaseImpl::default();
        let (pt, catalogs) = setup(&db);
        let primary = vec!["pt_BR".to_string(), "de".to_string()];

        let by_primary =
            generate_hover_content(&db, pt, FILE_REF, &catalogs, None, Some(&primary)).unwrap();
        let by_current =
            generate_hover_content(&db, pt, FILE_REF, &catalogs, Some("de"), Some(&primary))
                .unwrap();

        assert_that!(by_primary, contains_substring("**pt_BR**: &Arquivo  \n**de**: &Datei"));
        assert_that!(by_current, contains_substring("**de**: &Datei  \n**pt_BR**: &Arquivo"));
    }

    #[rstest]
    fn generate_hover_content_numerus_forms() {
        let db = LinguistDatabaseImpl::default();
        let (pt, catalogs) = setup(&db);
        let numerus = MessageRef { context: 1, message: 1 };

        let content = generate_hover_content(&db, pt, numerus, &catalogs, None, None).unwrap();

        assert_that!(
            content,
            contains_substring("**pt_BR**: %n dispositivo | %n dispositivos *(unfinished)*")
        );
        assert_that!(content, not(contains_substring("**de**")));
    }

    #[rstest]
    fn generate_hover_content_out_of_range() {
        let db = LinguistDatabaseImpl::default();
        let (pt, catalogs) = setup(&db);

        let content = generate_hover_content(
            &db,
            pt,
            MessageRef { context: 9, message: 0 },
            &catalogs,
            None,
            None,
        );

        assert_that!(content, none());
    }

    #[rstest]
    #[case::short("Hello", 10, "Hello")]
    #[case::exact("0123456789", 10, "0123456789")]
    #[case::long("0123456789ABC", 10, "0123456...")]
    #[case::newline("a\nb", 10, "a b")]
    fn test_truncate_string(#[case] input: &str, #[case] max: usize, #[case] expected: &str) {
        assert_that!(truncate_string(input, max), eq(expected));
    }

    #[rstest]
    fn language_priority_order() {
        let primary = vec!["ja".to_string(), "de".to_string()];
        let mut translations: Vec<(String, String)> = ["fr", "de", "pt_BR", "ja", "ar"]
            .into_iter()
            .map(|lang| (lang.to_string(), String::new()))
            .collect();

        sort_translations_by_priority(&mut translations, Some("pt_BR"), Some(&primary));

        let languages: Vec<String> = translations.into_iter().map(|(lang, _)| lang).collect();
        assert_that!(languages, elements_are![eq("pt_BR"), eq("ja"), eq("de"), eq("ar"), eq("fr")]);
    }
}
