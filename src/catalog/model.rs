//! In-memory representation of a Qt Linguist `.ts` catalog.

use std::collections::HashMap;
use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

/// State of a single translation, encoded in the `type` attribute of `<translation>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    /// No `type` attribute.
    #[default]
    Finished,
    Unfinished,
    /// The source string disappeared from the application.
    Vanished,
    /// Legacy spelling of `Vanished` written by older lupdate versions.
    Obsolete,
}

impl TranslationStatus {
    /// Parses the value of the `type` attribute. `None` means the attribute is absent.
    #[must_use]
    pub fn from_type_attribute(value: Option<&str>) -> Option<Self> {
        match value {
            None => Some(Self::Finished),
            Some("unfinished") => Some(Self::Unfinished),
            Some("vanished") => Some(Self::Vanished),
            Some("obsolete") => Some(Self::Obsolete),
            Some(_) => None,
        }
    }

    #[must_use]
    pub const fn type_attribute(self) -> Option<&'static str> {
        match self {
            Self::Finished => None,
            Self::Unfinished => Some("unfinished"),
            Self::Vanished => Some("vanished"),
            Self::Obsolete => Some("obsolete"),
        }
    }

    /// Whether the source string is still referenced by the application.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Finished | Self::Unfinished)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::Unfinished => "unfinished",
            Self::Vanished => "vanished",
            Self::Obsolete => "obsolete",
        }
    }
}

impl fmt::Display for TranslationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translated text of a message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Translation {
    pub status: TranslationStatus,
    /// Singular text. Empty for numerus messages.
    ///
    /// With length variants this is the first (longest) variant.
    pub text: String,
    /// `<lengthvariant>` texts of a `variants="yes"` translation, longest first.
    pub length_variants: Vec<String>,
    /// One entry per plural form for numerus messages.
    pub numerus_forms: Vec<String>,
    /// Length variants per plural form, aligned with `numerus_forms`.
    ///
    /// Empty when no form has variants.
    pub numerus_length_variants: Vec<Vec<String>>,
}

impl Translation {
    #[must_use]
    pub fn new(status: TranslationStatus, text: impl Into<String>) -> Self {
        Self { status, text: text.into(), ..Self::default() }
    }

    /// True if neither the text nor any numerus form carries content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.numerus_forms.iter().all(String::is_empty)
    }
}

/// Line reference of a `<location>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineNumber {
    Absolute(u32),
    /// Offset from the previous location in the same file (`+3`, `-2`).
    Relative(i64),
}

impl LineNumber {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if value.starts_with('+') || value.starts_with('-') {
            value.parse::<i64>().ok().map(Self::Relative)
        } else {
            value.parse::<u32>().ok().map(Self::Absolute)
        }
    }
}

impl fmt::Display for LineNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(line) => write!(f, "{line}"),
            Self::Relative(delta) => write!(f, "{delta:+}"),
        }
    }
}

/// A `<location filename=".." line=".."/>` reference into the application sources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub filename: Option<String>,
    pub line: Option<LineNumber>,
}

/// One translatable string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub id: Option<String>,
    pub numerus: bool,
    pub locations: Vec<SourceLocation>,
    pub source: String,
    pub old_source: Option<String>,
    /// Disambiguation comment. Part of the lookup key.
    pub comment: Option<String>,
    pub old_comment: Option<String>,
    pub extra_comment: Option<String>,
    pub translator_comment: Option<String>,
    pub translation: Translation,
    /// `<extra-NAME>` elements as `(NAME, value)`, in document order.
    pub extras: Vec<(String, String)>,
    pub user_data: Option<String>,
}

impl Message {
    #[must_use]
    pub fn new(source: impl Into<String>, translation: Translation) -> Self {
        Self { source: source.into(), translation, ..Self::default() }
    }

    #[must_use]
    pub const fn status(&self) -> TranslationStatus {
        self.translation.status
    }

    /// Disambiguation comment, treating an empty `<comment>` as absent.
    #[must_use]
    pub fn disambiguation(&self) -> Option<&str> {
        self.comment.as_deref().filter(|comment| !comment.is_empty())
    }
}

/// A named group of messages, usually one UI class.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Context {
    pub name: String,
    pub comment: Option<String>,
    pub messages: Vec<Message>,
}

impl Context {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }
}

/// The `<TS>` document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    pub version: Option<String>,
    /// Target language, e.g. `pt_BR`.
    pub language: Option<String>,
    pub source_language: Option<String>,
    /// Catalogs named in `<dependencies>`, e.g. `qtbase_pt`.
    pub dependencies: Vec<String>,
    pub contexts: Vec<Context>,
}

/// Position of a message inside a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub context: usize,
    pub message: usize,
}

impl Catalog {
    /// Every `<context>` called `name`. lupdate merges them, and so do lookups.
    pub fn contexts_named(&self, name: &str) -> impl Iterator<Item = &Context> {
        self.contexts.iter().filter(move |context| context.name == name)
    }

    #[must_use]
    pub fn message(&self, message_ref: MessageRef) -> Option<(&Context, &Message)> {
        let context = self.contexts.get(message_ref.context)?;
        let message = context.messages.get(message_ref.message)?;
        Some((context, message))
    }

    pub fn message_mut(&mut self, message_ref: MessageRef) -> Option<&mut Message> {
        self.contexts.get_mut(message_ref.context)?.messages.get_mut(message_ref.message)
    }

    /// All messages in document order together with their position.
    pub fn messages(&self) -> impl Iterator<Item = (MessageRef, &Context, &Message)> {
        self.contexts.iter().enumerate().flat_map(|(context_index, context)| {
            context.messages.iter().enumerate().map(move |(message_index, message)| {
                (MessageRef { context: context_index, message: message_index }, context, message)
            })
        })
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.contexts.iter().map(|context| context.messages.len()).sum()
    }
}

/// A `<location>` with the inherited file name and the absolute line filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub filename: String,
    /// 1-based line, if known.
    pub line: Option<u32>,
}

impl Catalog {
    /// Resolves every `<location>` of every message.
    ///
    /// lupdate omits `filename` when it repeats the previous one and writes
    /// `line` relative to the previous line seen for the same file, so the
    /// walk has to cover the whole document in order.
    #[must_use]
    pub fn resolved_locations(&self) -> Vec<(MessageRef, Vec<ResolvedLocation>)> {
        let mut current_file: Option<&str> = None;
        let mut last_lines: HashMap<&str, i64> = HashMap::new();
        let mut resolved = Vec::new();

        for (message_ref, _, message) in self.messages() {
            let mut locations = Vec::with_capacity(message.locations.len());
            for location in &message.locations {
                if let Some(filename) = location.filename.as_deref() {
                    current_file = Some(filename);
                }
                let Some(filename) = current_file else {
                    continue;
                };

                let last_line = last_lines.entry(filename).or_insert(0);
                let line = match location.line {
                    Some(LineNumber::Absolute(line)) => {
                        *last_line = i64::from(line);
                        Some(line)
                    }
                    Some(LineNumber::Relative(delta)) => {
                        *last_line += delta;
                        u32::try_from(*last_line).ok()
                    }
                    None => None,
                };

                locations.push(ResolvedLocation { filename: filename.to_string(), line });
            }
            resolved.push((message_ref, locations));
        }

        resolved
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::absent(None, Some(TranslationStatus::Finished))]
    #[case::unfinished(Some("unfinished"), Some(TranslationStatus::Unfinished))]
    #[case::vanished(Some("vanished"), Some(TranslationStatus::Vanished))]
    #[case::obsolete(Some("obsolete"), Some(TranslationStatus::Obsolete))]
    #[case::unknown(Some("done"), None)]
    fn test_status_from_type_attribute(
        #[case] value: Option<&str>,
        #[case] expected: Option<TranslationStatus>,
    ) {
        assert_that!(TranslationStatus::from_type_attribute(value), eq(expected));
    }

    #[rstest]
    #[case::absolute("42", Some(LineNumber::Absolute(42)))]
    #[case::plus("+3", Some(LineNumber::Relative(3)))]
    #[case::minus("-12", Some(LineNumber::Relative(-12)))]
    #[case::garbage("abc", None)]
    #[case::empty("", None)]
    fn test_line_number_parse(#[case] value: &str, #[case] expected: Option<LineNumber>) {
        assert_that!(LineNumber::parse(value), eq(expected));
    }

    #[rstest]
    #[case::absolute(LineNumber::Absolute(42), "42")]
    #[case::plus(LineNumber::Relative(3), "+3")]
    #[case::minus(LineNumber::Relative(-2), "-2")]
    fn test_line_number_display(#[case] line: LineNumber, #[case] expected: &str) {
        assert_that!(line.to_string(), eq(expected));
    }

    #[googletest::test]
    fn test_is_active() {
        expect_that!(TranslationStatus::Finished.is_active(), eq(true));
        expect_that!(TranslationStatus::Unfinished.is_active(), eq(true));
        expect_that!(TranslationStatus::Vanished.is_active(), eq(false));
        expect_that!(TranslationStatus::Obsolete.is_active(), eq(false));
    }

    #[googletest::test]
    fn test_messages_iterates_in_document_order() {
        let mut first = Context::new("First");
        first.messages.push(Message::new("a", Translation::default()));
        first.messages.push(Message::new("b", Translation::default()));
        let mut second = Context::new("Second");
        second.messages.push(Message::new("c", Translation::default()));
        let catalog = Catalog { contexts: vec![first, second], ..Catalog::default() };

        let sources: Vec<_> = catalog.messages().map(|(_, _, m)| m.source.as_str()).collect();

        expect_that!(sources, elements_are![eq(&"a"), eq(&"b"), eq(&"c")]);
        expect_that!(catalog.message_count(), eq(3));
        let (context, message) = catalog.message(MessageRef { context: 1, message: 0 }).unwrap();
        expect_that!(context.name, eq("Second"));
        expect_that!(message.source, eq("c"));
    }

    #[googletest::test]
    fn test_empty_comment_is_not_a_disambiguation() {
        let mut message = Message::new("Open", Translation::default());
        message.comment = Some(String::new());

        expect_that!(message.disambiguation(), none());
    }

    #[googletest::test]
    fn test_resolved_locations_follow_relative_lines() {
        let location = |filename: Option<&str>, line: LineNumber| SourceLocation {
            filename: filename.map(str::to_string),
            line: Some(line),
        };
        let mut context = Context::new("MainWindow");
        let mut first = Message::new("a", Translation::default());
        first.locations = vec![
            location(Some("../mainwindow.cpp"), LineNumber::Absolute(120)),
            location(None, LineNumber::Relative(4)),
        ];
        let mut second = Message::new("b", Translation::default());
        second.locations = vec![
            location(Some("../dialog.cpp"), LineNumber::Absolute(10)),
            location(Some("../mainwindow.cpp"), LineNumber::Relative(-20)),
        ];
        context.messages = vec![first, second];
        let catalog = Catalog { contexts: vec![context], ..Catalog::default() };

        let resolved = catalog.resolved_locations();

        let lines: Vec<Vec<(String, Option<u32>)>> = resolved
            .into_iter()
            .map(|(_, locations)| locations.into_iter().map(|l| (l.filename, l.line)).collect())
            .collect();
        expect_that!(
            lines,
            eq(&vec![
                vec![
                    ("../mainwindow.cpp".to_string(), Some(120)),
                    ("../mainwindow.cpp".to_string(), Some(124)),
                ],
                vec![
                    ("../dialog.cpp".to_string(), Some(10)),
                    ("../mainwindow.cpp".to_string(), Some(104)),
                ],
            ])
        );
    }
}
