//! Serializes a [`Catalog`] back to `.ts` XML in the layout lupdate produces.

use quick_xml::escape::escape;

use super::model::{
    Catalog,
    Context,
    Message,
    SourceLocation,
    TranslationStatus,
};

/// lupdate always writes this prolog.
const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n";
/// Indentation of `<name>` and `<message>`.
const CONTEXT_INDENT: &str = "    ";
/// Indentation of the children of `<message>`.
const MESSAGE_INDENT: &str = "        ";
/// Indentation of `<numerusform>`.
const NUMERUS_INDENT: &str = "            ";
/// Extra indentation of `<lengthvariant>` relative to its parent.
const VARIANT_INDENT: &str = "    ";

/// Writes the whole document, including the XML declaration and doctype.
#[must_use]
pub fn write_catalog(catalog: &Catalog) -> String {
    let mut out = String::from(XML_DECLARATION);

    out.push_str("<TS");
    push_attribute(&mut out, "version", catalog.version.as_deref());
    push_attribute(&mut out, "language", catalog.language.as_deref());
    push_attribute(&mut out, "sourcelanguage", catalog.source_language.as_deref());
    out.push_str(">\n");

    if !catalog.dependencies.is_empty() {
        out.push_str("<dependencies>\n");
        for dependency in &catalog.dependencies {
            out.push_str("<dependency");
            push_attribute(&mut out, "catalog", Some(dependency));
            out.push_str("/>\n");
        }
        out.push_str("</dependencies>\n");
    }

    for context in &catalog.contexts {
        write_context(&mut out, context);
    }

    out.push_str("</TS>\n");
    out
}

/// The `<translation …>` start tag for a status, e.g. `<translation type="unfinished">`.
///
/// `variants` adds `variants="yes"` for translations made of `<lengthvariant>`s.
#[must_use]
pub fn translation_start_tag(status: TranslationStatus, variants: bool) -> String {
    let mut tag = String::from("<translation");
    push_attribute(&mut tag, "type", status.type_attribute());
    if variants {
        push_attribute(&mut tag, "variants", Some("yes"));
    }
    tag.push('>');
    tag
}

/// Escapes character data the way lupdate does.
///
/// Markup characters become entities and control characters other than tab
/// and newline become numeric references.
#[must_use]
pub fn escape_text(text: &str) -> String {
    let escaped = escape(text);
    if !escaped.chars().any(is_escaped_control) {
        return escaped.into_owned();
    }

    let mut out = String::with_capacity(escaped.len() + 8);
    for ch in escaped.chars() {
        if is_escaped_control(ch) {
            out.push_str(&format!("&#x{:x};", u32::from(ch)));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Control characters lupdate writes as numeric references.
fn is_escaped_control(ch: char) -> bool {
    ch.is_control() && u32::from(ch) < 0x20 && ch != '\n' && ch != '\t'
}

/// Appends ` name="value"` when there is a value.
fn push_attribute(out: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_text(value));
        out.push('"');
    }
}

/// Appends one `<name>text</name>` line.
fn push_element(out: &mut String, indent: &str, name: &str, text: &str) {
    out.push_str(indent);
    out.push('<');
    out.push_str(name);
    out.push('>');
    out.push_str(&escape_text(text));
    out.push_str("</");
    out.push_str(name);
    out.push_str(">\n");
}

/// `<context>` 要素を書き出す
fn write_context(out: &mut String, context: &Context) {
    out.push_str("<context>\n");
    push_element(out, CONTEXT_INDENT, "name", &context.name);
    if let Some(comment) = &context.comment {
        push_element(out, CONTEXT_INDENT, "comment", comment);
    }
    for message in &context.messages {
        write_message(out, message);
    }
    out.push_str("</context>\n");
}

/// `<location/>`, omitting absent attributes.
fn write_location(out: &mut String, location: &SourceLocation) {
    out.push_str(MESSAGE_INDENT);
    out.push_str("<location");
    push_attribute(out, "filename", location.filename.as_deref());
    if let Some(line) = location.line {
        push_attribute(out, "line", Some(&line.to_string()));
    }
    out.push_str("/>\n");
}

/// Children in lupdate order: locations, texts, comments, translation, extras.
fn write_message(out: &mut String, message: &Message) {
    out.push_str(CONTEXT_INDENT);
    out.push_str("<message");
    push_attribute(out, "id", message.id.as_deref());
    if message.numerus {
        push_attribute(out, "numerus", Some("yes"));
    }
    out.push_str(">\n");

    for location in &message.locations {
        write_location(out, location);
    }

    push_element(out, MESSAGE_INDENT, "source", &message.source);

    let optional = [
        ("oldsource", &message.old_source),
        ("comment", &message.comment),
        ("oldcomment", &message.old_comment),
        ("extracomment", &message.extra_comment),
        ("translatorcomment", &message.translator_comment),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            push_element(out, MESSAGE_INDENT, name, value);
        }
    }

    write_translation(out, message);

    // lupdate はソート済みで書き出す
    let mut extras: Vec<_> = message
        .extras
        .iter()
        .map(|(name, value)| format!("<extra-{name}>{}</extra-{name}>", escape_text(value)))
        .collect();
    extras.sort();
    for extra in extras {
        out.push_str(MESSAGE_INDENT);
        out.push_str(&extra);
        out.push('\n');
    }

    if let Some(user_data) = &message.user_data {
        push_element(out, MESSAGE_INDENT, "userdata", user_data);
    }

    out.push_str(CONTEXT_INDENT);
    out.push_str("</message>\n");
}

/// The `<translation>` line(s) of a message, numerus forms and variants included.
fn write_translation(out: &mut String, message: &Message) {
    let translation = &message.translation;
    let has_variants = !message.numerus && !translation.length_variants.is_empty();

    out.push_str(MESSAGE_INDENT);
    out.push_str(&translation_start_tag(message.status(), has_variants));
    if message.numerus {
        for (index, form) in translation.numerus_forms.iter().enumerate() {
            out.push('\n');
            out.push_str(NUMERUS_INDENT);
            out.push_str("<numerusform");
            match translation.numerus_length_variants.get(index).filter(|v| !v.is_empty()) {
                Some(variants) => {
                    out.push_str(" variants=\"yes\">");
                    push_length_variants(out, NUMERUS_INDENT, variants);
                }
                None => {
                    out.push('>');
                    out.push_str(&escape_text(form));
                }
            }
            out.push_str("</numerusform>");
        }
        out.push('\n');
        out.push_str(MESSAGE_INDENT);
    } else if has_variants {
        push_length_variants(out, MESSAGE_INDENT, &translation.length_variants);
    } else {
        out.push_str(&escape_text(&translation.text));
    }
    out.push_str("</translation>\n");
}

/// Writes `<lengthvariant>` lines one level below `indent`, leaving the
/// cursor where the parent's end tag goes.
fn push_length_variants(out: &mut String, indent: &str, variants: &[String]) {
    for variant in variants {
        out.push('\n');
        out.push_str(indent);
        out.push_str(VARIANT_INDENT);
        out.push_str("<lengthvariant>");
        out.push_str(&escape_text(variant));
        out.push_str("</lengthvariant>");
    }
    out.push('\n');
    out.push_str(indent);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::catalog::model::Translation;
    use crate::catalog::parse_catalog;
    use crate::test_utils::SAMPLE_CATALOG;

    #[test]
    fn test_round_trip_is_byte_exact() {
        let parsed = parse_catalog(SAMPLE_CATALOG).unwrap();

        assert_eq!(write_catalog(&parsed.catalog), SAMPLE_CATALOG);
    }

    #[googletest::test]
    fn test_write_parse_write_is_stable() {
        let text = "<TS version=\"2.1\"><context><name>A</name><message>\
                    <source>x</source><translation type=\"unfinished\"/></message></context></TS>";

        let first = write_catalog(&parse_catalog(text).unwrap().catalog);
        let second = write_catalog(&parse_catalog(&first).unwrap().catalog);

        expect_that!(second, eq(first.as_str()));
        expect_that!(first, contains_substring("<translation type=\"unfinished\"></translation>"));
    }

    #[rstest]
    #[case::plain("Save", "Save")]
    #[case::ampersand("&File", "&amp;File")]
    #[case::apostrophe("keys' tones", "keys&apos; tones")]
    #[case::quote("\"Off\"", "&quot;Off&quot;")]
    #[case::markup("<b>x</b>", "&lt;b&gt;x&lt;/b&gt;")]
    #[case::newline_kept("a\nb", "a\nb")]
    #[case::carriage_return("a\rb", "a&#xd;b")]
    fn test_escape_text(#[case] text: &str, #[case] expected: &str) {
        assert_that!(escape_text(text), eq(expected));
    }

    #[rstest]
    #[case::finished(TranslationStatus::Finished, false, "<translation>")]
    #[case::unfinished(TranslationStatus::Unfinished, false, "<translation type=\"unfinished\">")]
    #[case::vanished(TranslationStatus::Vanished, false, "<translation type=\"vanished\">")]
    #[case::variants(
        TranslationStatus::Unfinished,
        true,
        "<translation type=\"unfinished\" variants=\"yes\">"
    )]
    fn test_translation_start_tag(
        #[case] status: TranslationStatus,
        #[case] variants: bool,
        #[case] expected: &str,
    ) {
        assert_that!(translation_start_tag(status, variants), eq(expected));
    }

    #[test]
    fn test_round_trip_keeps_variants_dependencies_and_extras() {
        let text = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="pt_BR">
<dependencies>
<dependency catalog="qtbase_pt"/>
</dependencies>
<context>
    <name>MainWindow</name>
    <message>
        <source>Open file</source>
        <oldcomment>toolbar</oldcomment>
        <translation variants="yes">
            <lengthvariant>Abrir arquivo</lengthvariant>
            <lengthvariant>Abrir</lengthvariant>
        </translation>
        <extra-po-flags>no-c-format</extra-po-flags>
        <extra-po-msgid_plural>x</extra-po-msgid_plural>
        <userdata>42</userdata>
    </message>
    <message numerus="yes">
        <source>%n file(s)</source>
        <translation type="unfinished">
            <numerusform variants="yes">
                <lengthvariant>%n arquivo</lengthvariant>
                <lengthvariant>%n arq.</lengthvariant>
            </numerusform>
            <numerusform>%n arquivos</numerusform>
        </translation>
    </message>
</context>
</TS>
"#;
        let parsed = parse_catalog(text).unwrap();

        assert_eq!(write_catalog(&parsed.catalog), text);
    }

    #[googletest::test]
    fn test_write_empty_catalog() {
        let catalog = Catalog { version: Some("2.1".to_string()), ..Catalog::default() };

        expect_that!(
            write_catalog(&catalog),
            eq("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n<TS version=\"2.1\">\n</TS>\n")
        );
    }

    #[googletest::test]
    fn test_write_control_characters_survive_parse() {
        let mut context = Context::new("C");
        context.messages.push(Message::new("line\r\nbreak", Translation::new(TranslationStatus::Finished, "x")));
        let catalog = Catalog { contexts: vec![context], ..Catalog::default() };

        let reparsed = parse_catalog(&write_catalog(&catalog)).unwrap().catalog;

        expect_that!(reparsed.contexts[0].messages[0].source, eq("line\r\nbreak"));
    }
}
