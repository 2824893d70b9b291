//! Catalog file input definitions

use std::path::Path;

use crate::db::LinguistDatabase;

/// Salsa input representing one `.ts` catalog on disk (or in the editor).
#[salsa::input(debug)]
pub struct CatalogFile {
    #[returns(ref)]
    pub file_path: String,

    #[returns(ref)]
    pub text: String,
}

/// Skipped when sniffing the document.
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Tells a Qt Linguist document apart from a TypeScript file sharing the `.ts` extension.
///
/// # Examples
/// ```
/// use qt_linguist_language_server::input::catalog_file::is_linguist_document;
///
/// assert!(is_linguist_document("<?xml version=\"1.0\"?>\n<!DOCTYPE TS>\n<TS version=\"2.1\">"));
/// assert!(!is_linguist_document("export const answer = 42;\n"));
/// ```
#[must_use]
pub fn is_linguist_document(text: &str) -> bool {
    let text = text.trim_start_matches(BYTE_ORDER_MARK).trim_start();
    if !text.starts_with('<') {
        return false;
    }
    if text.contains("<!DOCTYPE TS>") {
        return true;
    }

    text.match_indices("<TS").any(|(index, _)| {
        text.get(index + 3..)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|next| next.is_whitespace() || next == '>' || next == '/')
    })
}

/// Looks like an ISO 639 language code (`pt`, `fil`).
fn is_language_code(part: &str) -> bool {
    (2..=3).contains(&part.len()) && part.chars().all(|ch| ch.is_ascii_lowercase())
}

/// Looks like an ISO 3166 country code (`BR`) or a script subtag (`Hans`).
fn is_region_code(part: &str) -> bool {
    (part.len() == 2 && part.chars().all(|ch| ch.is_ascii_uppercase()))
        || (part.len() == 4
            && part.chars().next().is_some_and(|ch| ch.is_ascii_uppercase())
            && part.chars().skip(1).all(|ch| ch.is_ascii_lowercase()))
}

/// Picks the language code out of the trailing parts of a name.
fn language_from_parts(parts: &[&str]) -> Option<String> {
    match parts {
        [.., language, region] if is_language_code(language) && is_region_code(region) => {
            Some(format!("{language}_{region}"))
        }
        [.., language] if is_language_code(language) => Some((*language).to_string()),
        _ => None,
    }
}

/// Detect language from file path heuristically
///
/// Qt projects name catalogs `<app>_<language>[_<COUNTRY>].ts`, so the
/// file stem is split on `_` and `-` and its tail is checked first. The
/// parent directory is used as a fallback.
///
/// # Examples
/// - `translations/piano_tuner_pt.ts` → `pt`
/// - `i18n/myapp_pt_BR.ts` → `pt_BR`
/// - `translations/de/strings.ts` → `de`
///
/// # Returns
/// Detected language code or "unknown"
#[must_use]
pub fn detect_language_from_path(file_path: &Path) -> String {
    let stem = file_path.file_stem().map(|stem| stem.to_string_lossy().into_owned());
    let parent = file_path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned());

    [stem, parent]
        .into_iter()
        .flatten()
        .find_map(|name| {
            let parts: Vec<&str> = name.split(['_', '-']).collect();
            language_from_parts(&parts)
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Load a catalog file and create a `CatalogFile` input.
///
/// Returns `Ok(None)` for files that are not Qt Linguist documents.
///
/// # Errors
/// Returns error if the file cannot be read.
pub fn load_catalog_file(
    db: &dyn LinguistDatabase,
    file_path: &Path,
) -> std::io::Result<Option<CatalogFile>> {
    let content = std::fs::read_to_string(file_path)?;

    if !is_linguist_document(&content) {
        tracing::trace!(path = %file_path.display(), "Not a Qt Linguist document, skipping");
        return Ok(None);
    }

    Ok(Some(CatalogFile::new(db, file_path.to_string_lossy().to_string(), content)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::db::LinguistDatabaseImpl;

    #[rstest]
    #[case::with_doctype("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n<TS version=\"2.1\">", true)]
    #[case::root_only("<TS version=\"2.1\" language=\"de\"></TS>", true)]
    #[case::empty_root("<TS/>", true)]
    #[case::bom("\u{feff}<?xml version=\"1.0\"?><TS>", true)]
    #[case::typescript("import { x } from './x';\nexport const y = x;", false)]
    #[case::tsx_like_generic("const a = <TSomething>b;", false)]
    #[case::other_xml("<?xml version=\"1.0\"?><project/>", false)]
    #[case::empty("", false)]
    fn test_is_linguist_document(#[case] text: &str, #[case] expected: bool) {
        assert_that!(is_linguist_document(text), eq(expected));
    }

    #[rstest]
    #[case::app_and_language("translations/piano_tuner_pt.ts", "pt")]
    #[case::with_region("i18n/myapp_pt_BR.ts", "pt_BR")]
    #[case::with_script("i18n/myapp_zh_Hans.ts", "zh_Hans")]
    #[case::hyphen("i18n/app-de.ts", "de")]
    #[case::language_only("translations/fr.ts", "fr")]
    #[case::parent_directory("translations/de/strings.ts", "de")]
    #[case::unknown("translations/application.ts", "unknown")]
    fn test_detect_language_from_path(#[case] path: &str, #[case] expected: &str) {
        assert_that!(detect_language_from_path(Path::new(path)), eq(expected));
    }

    #[googletest::test]
    fn test_load_catalog_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let catalog_path = temp_dir.path().join("app_de.ts");
        let script_path = temp_dir.path().join("main.ts");
        std::fs::write(&catalog_path, "<!DOCTYPE TS>\n<TS version=\"2.1\" language=\"de\"></TS>\n")
            .unwrap();
        std::fs::write(&script_path, "export {};\n").unwrap();
        let db = LinguistDatabaseImpl::default();

        let catalog = load_catalog_file(&db, &catalog_path).unwrap();
        let script = load_catalog_file(&db, &script_path).unwrap();

        let catalog = catalog.unwrap();
        expect_that!(catalog.file_path(&db).as_str(), ends_with("app_de.ts"));
        expect_that!(catalog.text(&db).as_str(), contains_substring("language=\"de\""));
        expect_that!(script, none());
        expect_that!(load_catalog_file(&db, &temp_dir.path().join("missing.ts")).is_err(), eq(true));
    }
}
