//! `.ts` reader built on `quick-xml`.
//!
//! Besides the [`Catalog`] itself the reader records where every context and
//! message lives in the document, so the IDE layer can map entries to ranges.

use quick_xml::Reader;
use quick_xml::events::{
    BytesStart,
    BytesText,
    Event,
};

use super::error::CatalogError;
use super::model::{
    Catalog,
    Context,
    LineNumber,
    Message,
    MessageRef,
    SourceLocation,
    TranslationStatus,
};
use crate::types::ByteSpan;

/// Stripped before parsing. Offsets still count it.
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Byte spans of the interesting parts of one `<message>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageSpans {
    /// Whole `<message>…</message>` element.
    pub element: ByteSpan,
    /// Text content of `<source>`.
    pub source: Option<ByteSpan>,
    /// The `<translation …>` start tag (or the whole empty-element tag).
    pub translation_tag: Option<ByteSpan>,
    /// Text content of `<translation>`.
    pub translation: Option<ByteSpan>,
    /// Each `<location/>` element.
    pub locations: Vec<ByteSpan>,
}

/// Byte spans of one `<context>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContextSpans {
    /// Whole `<context>…</context>` element.
    pub element: ByteSpan,
    /// Text content of `<name>`.
    pub name: Option<ByteSpan>,
    /// One entry per `<message>`, aligned with [`Context::messages`].
    pub messages: Vec<MessageSpans>,
}

/// Spans of a whole catalog, aligned index by index with [`Catalog::contexts`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogSpans {
    /// One entry per `<context>`.
    pub contexts: Vec<ContextSpans>,
}

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCatalog {
    /// The catalog model.
    pub catalog: Catalog,
    /// Where each context and message lives in the source text.
    pub spans: CatalogSpans,
    /// The reader skipped XML comments or elements the model does not keep.
    ///
    /// Writing such a catalog back would lose them.
    pub skipped_content: bool,
}

impl ParsedCatalog {
    #[must_use]
    pub fn message_spans(&self, message_ref: MessageRef) -> Option<&MessageSpans> {
        self.spans.contexts.get(message_ref.context)?.messages.get(message_ref.message)
    }

    /// Finds the message whose element contains the byte offset.
    #[must_use]
    pub fn message_at_offset(&self, offset: usize) -> Option<MessageRef> {
        self.spans.contexts.iter().enumerate().find_map(|(context_index, context)| {
            if !context.element.contains(offset) {
                return None;
            }
            context.messages.iter().position(|message| message.element.contains(offset)).map(
                |message_index| MessageRef { context: context_index, message: message_index },
            )
        })
    }
}

/// Parses a `.ts` document.
///
/// # Examples
/// ```
/// use qt_linguist_language_server::catalog::parse_catalog;
///
/// let text = r#"<?xml version="1.0" encoding="utf-8"?>
/// <!DOCTYPE TS>
/// <TS version="2.1" language="pt_BR">
/// <context>
///     <name>MainWindow</name>
///     <message>
///         <source>&amp;File</source>
///         <translation>&amp;Arquivo</translation>
///     </message>
/// </context>
/// </TS>
/// "#;
///
/// let parsed = parse_catalog(text).unwrap();
/// assert_eq!(parsed.catalog.language.as_deref(), Some("pt_BR"));
/// assert_eq!(parsed.catalog.translate("MainWindow", "&File"), "&Arquivo");
/// ```
pub fn parse_catalog(text: &str) -> Result<ParsedCatalog, CatalogError> {
    let (body, base) = text
        .strip_prefix(BYTE_ORDER_MARK)
        .map_or((text, 0), |rest| (rest, BYTE_ORDER_MARK.len_utf8()));

    CatalogReader::new(body, base).read_document()
}

/// Content of `<translation>` or `<numerusform>`.
#[derive(Debug, Default)]
struct VariantText {
    /// Character data, or the first length variant.
    text: String,
    /// `<lengthvariant>` children.
    length_variants: Vec<String>,
}

/// Thin wrapper over `quick_xml::Reader` that reports absolute byte spans.
struct CatalogReader<'a> {
    /// Underlying event reader.
    reader: Reader<&'a [u8]>,
    /// Bytes stripped before the reader's input (the BOM).
    base: usize,
    /// Set once anything is dropped on the floor.
    skipped_content: bool,
}

impl<'a> CatalogReader<'a> {
    /// Reader over `body`, which starts `base` bytes into the document.
    fn new(body: &'a str, base: usize) -> Self {
        let mut reader = Reader::from_str(body);
        reader.trim_text(false);
        reader.expand_empty_elements(false);
        reader.check_end_names(true);
        Self { reader, base, skipped_content: false }
    }

    /// Absolute byte offset of the next event.
    fn position(&self) -> usize {
        self.base + usize::try_from(self.reader.buffer_position()).unwrap_or(usize::MAX)
    }

    /// Next event together with its span. Comments are noted as skipped.
    fn next(&mut self) -> Result<(Event<'a>, ByteSpan), CatalogError> {
        let start = self.position();
        let event = self
            .reader
            .read_event()
            .map_err(|error| CatalogError::Xml { offset: self.position(), message: error.to_string() })?;
        if matches!(event, Event::Comment(_) | Event::PI(_)) {
            self.skipped_content = true;
        }
        Ok((event, ByteSpan::new(start, self.position())))
    }

    /// Skips an element the model has no place for.
    fn skip_unknown(&mut self, element: &BytesStart<'_>) -> Result<(), CatalogError> {
        self.note_unknown(element);
        self.skip_element(element)
    }

    /// Records an element the model has no place for.
    fn note_unknown(&mut self, element: &BytesStart<'_>) {
        tracing::trace!(element = %element_name(element), "Skipping unknown element");
        self.skipped_content = true;
    }

    /// Reads up to and including the `<TS>` root.
    fn read_document(mut self) -> Result<ParsedCatalog, CatalogError> {
        loop {
            let (event, span) = self.next()?;
            match event {
                Event::Start(root) if root.name().as_ref() == b"TS" => {
                    let catalog = read_root_attributes(&root, span)?;
                    return self.read_root(catalog);
                }
                Event::Empty(root) if root.name().as_ref() == b"TS" => {
                    let catalog = read_root_attributes(&root, span)?;
                    return Ok(ParsedCatalog {
                        catalog,
                        spans: CatalogSpans::default(),
                        skipped_content: self.skipped_content,
                    });
                }
                Event::Start(other) | Event::Empty(other) => {
                    return Err(CatalogError::UnexpectedRoot {
                        found: element_name(&other),
                        offset: span.start,
                    });
                }
                Event::Text(text) if !text.iter().all(u8::is_ascii_whitespace) => {
                    return Err(CatalogError::Xml {
                        offset: span.start,
                        message: "text outside of the root element".to_string(),
                    });
                }
                Event::Eof => return Err(CatalogError::MissingRoot),
                _ => {}
            }
        }
    }

    /// Reads the children of `<TS>`.
    fn read_root(&mut self, catalog: Catalog) -> Result<ParsedCatalog, CatalogError> {
        let mut parsed =
            ParsedCatalog { catalog, spans: CatalogSpans::default(), skipped_content: false };

        loop {
            let (event, span) = self.next()?;
            match event {
                Event::Start(element) => match element.name().as_ref() {
                    b"context" => {
                        let (context, spans) = self.read_context(span)?;
                        parsed.catalog.contexts.push(context);
                        parsed.spans.contexts.push(spans);
                    }
                    b"dependencies" => {
                        let dependencies = self.read_dependencies(&element)?;
                        parsed.catalog.dependencies.extend(dependencies);
                    }
                    _ => self.skip_unknown(&element)?,
                },
                Event::Empty(element) if element.name().as_ref() == b"dependencies" => {}
                Event::Empty(element) => self.note_unknown(&element),
                Event::End(_) => {
                    parsed.skipped_content = self.skipped_content;
                    return Ok(parsed);
                }
                Event::Eof => return Err(unexpected_eof("TS", span)),
                _ => {}
            }
        }
    }

    /// Reads `<dependency catalog=".."/>` children of `<dependencies>`.
    fn read_dependencies(&mut self, start: &BytesStart<'_>) -> Result<Vec<String>, CatalogError> {
        let mut dependencies = Vec::new();

        loop {
            let (event, span) = self.next()?;
            match event {
                Event::Empty(element) if element.name().as_ref() == b"dependency" => {
                    dependencies.extend(attribute(&element, "catalog", span)?);
                }
                Event::Start(element) if element.name().as_ref() == b"dependency" => {
                    dependencies.extend(attribute(&element, "catalog", span)?);
                    self.skip_element(&element)?;
                }
                Event::Start(element) => self.skip_unknown(&element)?,
                Event::Empty(element) => self.note_unknown(&element),
                Event::End(_) => return Ok(dependencies),
                Event::Eof => return Err(unexpected_eof(&element_name(start), span)),
                _ => {}
            }
        }
    }

    /// Reads one `<context>` after its start tag.
    fn read_context(&mut self, start: ByteSpan) -> Result<(Context, ContextSpans), CatalogError> {
        let mut context = Context::default();
        let mut spans = ContextSpans { element: start, ..ContextSpans::default() };

        loop {
            let (event, span) = self.next()?;
            match event {
                Event::Start(element) => match element.name().as_ref() {
                    b"name" => {
                        let (name, name_span) = self.read_text()?;
                        context.name = name;
                        spans.name = Some(name_span);
                    }
                    b"comment" => context.comment = Some(self.read_text()?.0),
                    b"message" => {
                        let (message, message_spans) = self.read_message(&element, span)?;
                        context.messages.push(message);
                        spans.messages.push(message_spans);
                    }
                    _ => self.skip_unknown(&element)?,
                },
                Event::Empty(element) => match element.name().as_ref() {
                    b"name" => spans.name = Some(ByteSpan::new(span.end, span.end)),
                    b"comment" => context.comment = Some(String::new()),
                    _ => self.note_unknown(&element),
                },
                Event::End(_) => {
                    spans.element.end = span.end;
                    return Ok((context, spans));
                }
                Event::Eof => return Err(unexpected_eof("context", span)),
                _ => {}
            }
        }
    }

    /// Reads one `<message>` after its start tag.
    fn read_message(
        &mut self,
        start: &BytesStart<'_>,
        start_span: ByteSpan,
    ) -> Result<(Message, MessageSpans), CatalogError> {
        let mut message = Message {
            id: attribute(start, "id", start_span)?,
            numerus: attribute(start, "numerus", start_span)?.is_some_and(|value| value == "yes"),
            ..Message::default()
        };
        let mut spans = MessageSpans { element: start_span, ..MessageSpans::default() };

        loop {
            let (event, span) = self.next()?;
            match event {
                Event::Start(element) => match element.name().as_ref() {
                    b"location" => {
                        message.locations.push(read_location(&element, span)?);
                        self.skip_element(&element)?;
                        spans.locations.push(ByteSpan::new(span.start, self.position()));
                    }
                    b"source" => {
                        let (source, source_span) = self.read_text()?;
                        message.source = source;
                        spans.source = Some(source_span);
                    }
                    b"oldsource" => message.old_source = Some(self.read_text()?.0),
                    b"comment" => message.comment = Some(self.read_text()?.0),
                    b"oldcomment" => message.old_comment = Some(self.read_text()?.0),
                    b"extracomment" => message.extra_comment = Some(self.read_text()?.0),
                    b"translatorcomment" => {
                        message.translator_comment = Some(self.read_text()?.0);
                    }
                    b"userdata" => message.user_data = Some(self.read_text()?.0),
                    b"translation" => {
                        message.translation.status = read_status(&element, span)?;
                        spans.translation_tag = Some(span);
                        let content_span = if message.numerus {
                            self.read_numerus_forms(&mut message)?
                        } else {
                            let (content, content_span) = self.read_variant_text()?;
                            message.translation.text = content.text;
                            message.translation.length_variants = content.length_variants;
                            content_span
                        };
                        spans.translation = Some(content_span);
                    }
                    name => match extra_name(name) {
                        Some(extra) => {
                            let value = self.read_text()?.0;
                            message.extras.push((extra, value));
                        }
                        None => self.skip_unknown(&element)?,
                    },
                },
                Event::Empty(element) => match element.name().as_ref() {
                    b"location" => {
                        message.locations.push(read_location(&element, span)?);
                        spans.locations.push(span);
                    }
                    b"translation" => {
                        message.translation.status = read_status(&element, span)?;
                        spans.translation_tag = Some(span);
                    }
                    b"source" => spans.source = Some(ByteSpan::new(span.end, span.end)),
                    b"oldsource" => message.old_source = Some(String::new()),
                    b"comment" => message.comment = Some(String::new()),
                    b"oldcomment" => message.old_comment = Some(String::new()),
                    b"extracomment" => message.extra_comment = Some(String::new()),
                    b"translatorcomment" => message.translator_comment = Some(String::new()),
                    b"userdata" => message.user_data = Some(String::new()),
                    name => match extra_name(name) {
                        Some(extra) => message.extras.push((extra, String::new())),
                        None => self.note_unknown(&element),
                    },
                },
                Event::End(_) => {
                    spans.element.end = span.end;
                    return Ok((message, spans));
                }
                Event::Eof => return Err(unexpected_eof("message", span)),
                _ => {}
            }
        }
    }

    /// Reads `<numerusform>` children up to the closing `</translation>`.
    fn read_numerus_forms(&mut self, message: &mut Message) -> Result<ByteSpan, CatalogError> {
        let content_start = self.position();
        let mut forms = Vec::new();
        let mut variants = Vec::new();

        loop {
            let (event, span) = self.next()?;
            match event {
                Event::Start(element) if element.name().as_ref() == b"numerusform" => {
                    let content = self.read_variant_text()?.0;
                    forms.push(content.text);
                    variants.push(content.length_variants);
                }
                Event::Empty(element) if element.name().as_ref() == b"numerusform" => {
                    forms.push(String::new());
                    variants.push(Vec::new());
                }
                Event::Start(element) => self.skip_unknown(&element)?,
                Event::Empty(element) => self.note_unknown(&element),
                Event::End(_) => {
                    message.translation.numerus_forms = forms;
                    if variants.iter().any(|form| !form.is_empty()) {
                        message.translation.numerus_length_variants = variants;
                    }
                    return Ok(ByteSpan::new(content_start, span.start));
                }
                Event::Eof => return Err(unexpected_eof("translation", span)),
                _ => {}
            }
        }
    }

    /// Reads a translation text that may be split into `<lengthvariant>`s.
    ///
    /// The whitespace between variants is not part of any text.
    fn read_variant_text(&mut self) -> Result<(VariantText, ByteSpan), CatalogError> {
        let content_start = self.position();
        let mut content = VariantText::default();

        loop {
            let (event, span) = self.next()?;
            match event {
                Event::Text(text) => content.text.push_str(&unescape(&text, span)?),
                Event::CData(text) => content.text.push_str(&String::from_utf8_lossy(&text)),
                Event::Start(element) if element.name().as_ref() == b"lengthvariant" => {
                    content.length_variants.push(self.read_text()?.0);
                }
                Event::Empty(element) if element.name().as_ref() == b"lengthvariant" => {
                    content.length_variants.push(String::new());
                }
                Event::Start(element) => self.skip_unknown(&element)?,
                Event::Empty(element) => self.note_unknown(&element),
                Event::End(_) => {
                    if let Some(first) = content.length_variants.first() {
                        if !content.text.trim().is_empty() {
                            // 変種と地の文が混在している
                            self.skipped_content = true;
                        }
                        content.text.clone_from(first);
                    }
                    return Ok((content, ByteSpan::new(content_start, span.start)));
                }
                Event::Eof => return Err(unexpected_eof("translation", span)),
                _ => {}
            }
        }
    }

    /// Reads character data up to the closing tag of the current element.
    fn read_text(&mut self) -> Result<(String, ByteSpan), CatalogError> {
        let content_start = self.position();
        let mut text = String::new();

        loop {
            let (event, span) = self.next()?;
            match event {
                Event::Text(content) => text.push_str(&unescape(&content, span)?),
                Event::CData(content) => text.push_str(&String::from_utf8_lossy(&content)),
                Event::Start(element) => self.skip_unknown(&element)?,
                Event::Empty(element) => self.note_unknown(&element),
                Event::End(_) => return Ok((text, ByteSpan::new(content_start, span.start))),
                Event::Eof => return Err(unexpected_eof("text", span)),
                _ => {}
            }
        }
    }

    /// Consumes everything up to the matching end tag of `start`.
    fn skip_element(&mut self, start: &BytesStart<'_>) -> Result<(), CatalogError> {
        let mut depth = 0_usize;
        loop {
            let (event, span) = self.next()?;
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) if depth == 0 => return Ok(()),
                Event::End(_) => depth -= 1,
                Event::Eof => return Err(unexpected_eof(&element_name(start), span)),
                _ => {}
            }
        }
    }
}

/// `NAME` of an `<extra-NAME>` element.
fn extra_name(element: &[u8]) -> Option<String> {
    element
        .strip_prefix(b"extra-")
        .filter(|name| !name.is_empty())
        .map(|name| String::from_utf8_lossy(name).into_owned())
}

/// Tag name for error messages.
fn element_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

/// Character data with entities resolved.
fn unescape(text: &BytesText<'_>, span: ByteSpan) -> Result<String, CatalogError> {
    text.unescape()
        .map(std::borrow::Cow::into_owned)
        .map_err(|error| CatalogError::Xml { offset: span.start, message: error.to_string() })
}

/// The document ended inside `element`.
fn unexpected_eof(element: &str, span: ByteSpan) -> CatalogError {
    CatalogError::UnexpectedEof { element: element.to_string(), offset: span.start }
}

/// Unescaped value of attribute `name`, if present.
fn attribute(
    element: &BytesStart<'_>,
    name: &str,
    span: ByteSpan,
) -> Result<Option<String>, CatalogError> {
    let to_error =
        |message: String| CatalogError::Xml { offset: span.start, message };

    let Some(attribute) =
        element.try_get_attribute(name).map_err(|error| to_error(error.to_string()))?
    else {
        return Ok(None);
    };

    let value = attribute.unescape_value().map_err(|error| to_error(error.to_string()))?;
    Ok(Some(value.into_owned()))
}

/// `version`, `language` and `sourcelanguage` of `<TS>`.
fn read_root_attributes(root: &BytesStart<'_>, span: ByteSpan) -> Result<Catalog, CatalogError> {
    Ok(Catalog {
        version: attribute(root, "version", span)?,
        language: attribute(root, "language", span)?,
        source_language: attribute(root, "sourcelanguage", span)?,
        dependencies: Vec::new(),
        contexts: Vec::new(),
    })
}

/// Status from the `type` attribute of `<translation>`.
fn read_status(element: &BytesStart<'_>, span: ByteSpan) -> Result<TranslationStatus, CatalogError> {
    let value = attribute(element, "type", span)?;
    TranslationStatus::from_type_attribute(value.as_deref()).ok_or_else(|| {
        CatalogError::InvalidAttribute {
            attribute: "type".to_string(),
            value: value.unwrap_or_default(),
            offset: span.start,
        }
    })
}

/// Attributes of a `<location>` element.
fn read_location(element: &BytesStart<'_>, span: ByteSpan) -> Result<SourceLocation, CatalogError> {
    let filename = attribute(element, "filename", span)?;
    let line = match attribute(element, "line", span)? {
        Some(value) => Some(LineNumber::parse(&value).ok_or_else(|| {
            CatalogError::InvalidAttribute {
                attribute: "line".to_string(),
                value: value.clone(),
                offset: span.start,
            }
        })?),
        None => None,
    };

    Ok(SourceLocation { filename, line })
}
