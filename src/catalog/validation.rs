//! Consistency checks between source texts and their translations.
//!
//! The checks mirror the ones translators know from Qt Linguist's phrase
//! validation: place markers, accelerators and ending punctuation. On top of
//! that the catalog-level rules (unique keys, unfinished entries) are checked.

use std::collections::{
    BTreeSet,
    HashMap,
};

use super::model::{
    Catalog,
    Message,
    MessageRef,
    TranslationStatus,
};

/// What a [`Finding`] is about. Each kind maps to a diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindingKind {
    /// The (context, source, disambiguation) key is not unique.
    DuplicateMessage,
    /// An unfinished entry already carries a real translation.
    UnfinishedWithText,
    /// A finished entry has no translated text.
    EmptyTranslation,
    PlaceMarkerMismatch,
    AcceleratorMismatch,
    PunctuationMismatch,
}

impl FindingKind {
    pub const ALL: [Self; 6] = [
        Self::DuplicateMessage,
        Self::UnfinishedWithText,
        Self::EmptyTranslation,
        Self::PlaceMarkerMismatch,
        Self::AcceleratorMismatch,
        Self::PunctuationMismatch,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::DuplicateMessage => "duplicate-message",
            Self::UnfinishedWithText => "unfinished-with-text",
            Self::EmptyTranslation => "empty-translation",
            Self::PlaceMarkerMismatch => "place-marker-mismatch",
            Self::AcceleratorMismatch => "accelerator-mismatch",
            Self::PunctuationMismatch => "punctuation-mismatch",
        }
    }
}

/// A problem found in one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub kind: FindingKind,
    pub message_ref: MessageRef,
    pub message: String,
    /// Another message involved, e.g. the first occurrence of a duplicate.
    pub related: Option<MessageRef>,
}

/// Runs every check over the catalog, in document order per check.
#[must_use]
pub fn validate_catalog(catalog: &Catalog) -> Vec<Finding> {
    let mut findings = find_duplicates(catalog);

    for (message_ref, _, message) in catalog.messages() {
        findings.extend(check_message(message_ref, message));
    }

    findings
}

/// Reports every message whose lookup key was already used earlier in the same context.
#[must_use]
pub fn find_duplicates(catalog: &Catalog) -> Vec<Finding> {
    let mut seen: HashMap<(&str, &str, Option<&str>), MessageRef> = HashMap::new();
    let mut findings = Vec::new();

    for (message_ref, context, message) in catalog.messages() {
        let key = (context.name.as_str(), message.source.as_str(), message.disambiguation());
        match seen.get(&key) {
            Some(&first) => findings.push(Finding {
                kind: FindingKind::DuplicateMessage,
                message_ref,
                message: format!(
                    "Duplicate message '{}' in context '{}'",
                    message.source, context.name
                ),
                related: Some(first),
            }),
            None => {
                seen.insert(key, message_ref);
            }
        }
    }

    findings
}

/// True if the translation is empty or just a copy of the source.
#[must_use]
pub fn is_placeholder(message: &Message) -> bool {
    let translation = &message.translation;
    if message.numerus {
        translation.numerus_forms.iter().all(|form| form.is_empty() || *form == message.source)
    } else {
        translation.text.is_empty() || translation.text == message.source
    }
}

/// Finding with the standard message for `kind`.
const fn finding(message_ref: MessageRef, kind: FindingKind, message: String) -> Finding {
    Finding { kind, message_ref, message, related: None }
}

/// Checks a single message.
#[must_use]
pub fn check_message(message_ref: MessageRef, message: &Message) -> Vec<Finding> {
    let mut findings = Vec::new();

    match message.status() {
        TranslationStatus::Unfinished if !is_placeholder(message) => {
            findings.push(finding(
                message_ref,
                FindingKind::UnfinishedWithText,
                "Translation is marked unfinished but already has text".to_string(),
            ));
        }
        TranslationStatus::Finished if message.translation.is_empty() => {
            findings.push(finding(
                message_ref,
                FindingKind::EmptyTranslation,
                "Finished translation is empty".to_string(),
            ));
        }
        TranslationStatus::Finished
            if message.numerus && message.translation.numerus_forms.iter().any(String::is_empty) =>
        {
            findings.push(finding(
                message_ref,
                FindingKind::EmptyTranslation,
                "A plural form is empty".to_string(),
            ));
        }
        _ => {}
    }

    if !message.status().is_active() {
        return findings;
    }

    let translations: Vec<&str> = if message.numerus {
        message.translation.numerus_forms.iter().map(String::as_str).collect()
    } else {
        vec![message.translation.text.as_str()]
    };

    for translation in translations.into_iter().filter(|text| !text.is_empty()) {
        let source_markers = place_markers(&message.source);
        let translation_markers = place_markers(translation);
        if source_markers != translation_markers {
            let missing: Vec<_> = source_markers.difference(&translation_markers).cloned().collect();
            let extra: Vec<_> = translation_markers.difference(&source_markers).cloned().collect();
            findings.push(finding(
                message_ref,
                FindingKind::PlaceMarkerMismatch,
                describe_marker_mismatch(&missing, &extra),
            ));
        }

        let source_accelerator = accelerator(&message.source).is_some();
        if source_accelerator != accelerator(translation).is_some() {
            let text = if source_accelerator {
                "Accelerator is missing in the translation"
            } else {
                "Translation has an accelerator the source lacks"
            };
            findings.push(finding(message_ref, FindingKind::AcceleratorMismatch, text.to_string()));
        }

        if !is_rich_text(&message.source) {
            let expected = ending_punctuation(&message.source);
            let actual = ending_punctuation(translation);
            if expected != actual {
                findings.push(finding(
                    message_ref,
                    FindingKind::PunctuationMismatch,
                    format!(
                        "Translation ends with {} but the source ends with {}",
                        describe_punctuation(actual),
                        describe_punctuation(expected)
                    ),
                ));
            }
        }
    }

    findings
}

/// e.g. `missing %2; unexpected %3`
fn describe_marker_mismatch(missing: &[String], extra: &[String]) -> String {
    match (missing.is_empty(), extra.is_empty()) {
        (false, true) => format!("Place markers missing in translation: {}", missing.join(", ")),
        (true, false) => format!("Unexpected place markers in translation: {}", extra.join(", ")),
        _ => format!(
            "Place markers differ: missing {}, unexpected {}",
            missing.join(", "),
            extra.join(", ")
        ),
    }
}

/// `'.'` or `no punctuation`
fn describe_punctuation(punctuation: Option<char>) -> String {
    punctuation.map_or_else(|| "no punctuation".to_string(), |ch| format!("'{ch}'"))
}

/// Collects `%1`..`%99`, `%L1` and `%n` style markers.
#[must_use]
pub fn place_markers(text: &str) -> BTreeSet<String> {
    let mut markers = BTreeSet::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            continue;
        }
        if chars.next_if_eq(&'%').is_some() {
            continue;
        }
        let prefix = if chars.next_if_eq(&'L').is_some() { "%L" } else { "%" };

        if chars.next_if_eq(&'n').is_some() {
            markers.insert(format!("{prefix}n"));
            continue;
        }

        let mut digits = String::new();
        while digits.len() < 2
            && let Some(digit) = chars.next_if(char::is_ascii_digit)
        {
            digits.push(digit);
        }
        if digits.parse::<u8>().is_ok_and(|number| (1..=99).contains(&number)) {
            markers.insert(format!("{prefix}{}", digits.trim_start_matches('0')));
        }
    }

    markers
}

/// The accelerator key of a text, i.e. the character after a single `&`.
///
/// `&&` is a literal ampersand and `& ` is not an accelerator.
#[must_use]
pub fn accelerator(text: &str) -> Option<char> {
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '&' {
            continue;
        }
        match chars.peek() {
            Some('&') => {
                chars.next();
            }
            Some(&next) if !next.is_whitespace() => return Some(next),
            _ => {}
        }
    }
    None
}

/// The punctuation character a text ends with, normalized to ASCII.
#[must_use]
pub fn ending_punctuation(text: &str) -> Option<char> {
    let last = text.trim_end().chars().next_back()?;
    let normalized = match last {
        '…' | '。' | '．' => '.',
        '：' => ':',
        '；' => ';',
        '！' => '!',
        '？' => '?',
        other => other,
    };
    matches!(normalized, '.' | ':' | ';' | '!' | '?').then_some(normalized)
}

/// Qt::mightBeRichText に近い簡易判定
fn is_rich_text(text: &str) -> bool {
    text.trim_start().starts_with("<html>") || text.trim_start().starts_with("<!DOCTYPE")
}
