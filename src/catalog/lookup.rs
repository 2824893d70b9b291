//! Runtime lookup of translated strings.
//!
//! Only finished, non-empty translations are ever returned. Everything else
//! falls back to the source text, so an untranslated UI still shows English.

use std::collections::HashMap;

use super::model::{
    Catalog,
    Message,
    TranslationStatus,
};

/// Text a message contributes at runtime, if any.
fn usable_translation(message: &Message) -> Option<&str> {
    if message.status() != TranslationStatus::Finished {
        return None;
    }
    let text = if message.numerus {
        message.translation.numerus_forms.first().map(String::as_str)?
    } else {
        message.translation.text.as_str()
    };
    (!text.is_empty()).then_some(text)
}

impl Catalog {
    /// Finds the message for a lookup key. `disambiguation` must match exactly.
    ///
    /// All contexts with that name are searched. Among duplicates the first
    /// one with a usable translation wins, otherwise the first one.
    #[must_use]
    pub fn find_message(
        &self,
        context: &str,
        source: &str,
        disambiguation: Option<&str>,
    ) -> Option<&Message> {
        let mut candidates = self
            .contexts_named(context)
            .flat_map(|context| context.messages.iter())
            .filter(|message| message.source == source && message.disambiguation() == disambiguation);

        let first = candidates.next()?;
        if usable_translation(first).is_some() {
            return Some(first);
        }
        Some(candidates.find(|message| usable_translation(message).is_some()).unwrap_or(first))
    }

    /// Translates `source` within `context`, returning `source` itself when
    /// there is no finished translation.
    #[must_use]
    pub fn translate<'a>(&'a self, context: &str, source: &'a str) -> &'a str {
        self.find_message(context, source, None).and_then(usable_translation).unwrap_or(source)
    }
}

/// A single indexed entry: the disambiguation comment plus the usable text(s).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    /// Disambiguation comment, `None` when absent or empty.
    disambiguation: Option<String>,
    /// Singular text, or the first numerus form.
    text: String,
    numerus_forms: Vec<String>,
}

/// Hash index over the finished translations of one catalog.
///
/// Build it once per catalog and query it as often as needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translator {
    /// `<TS language>` of the source catalog.
    language: Option<String>,
    /// context -> source -> variants by disambiguation
    entries: HashMap<String, HashMap<String, Vec<Entry>>>,
}

impl Translator {
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut translator = Self { language: catalog.language.clone(), entries: HashMap::new() };

        for (_, context, message) in catalog.messages() {
            let Some(text) = usable_translation(message) else {
                continue;
            };

            let variants = translator
                .entries
                .entry(context.name.clone())
                .or_default()
                .entry(message.source.clone())
                .or_default();

            // 重複エントリは先勝ち
            if variants.iter().any(|entry| entry.disambiguation.as_deref() == message.disambiguation())
            {
                continue;
            }

            variants.push(Entry {
                disambiguation: message.disambiguation().map(str::to_string),
                text: text.to_string(),
                numerus_forms: message.translation.numerus_forms.clone(),
            });
        }

        translator
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Number of translatable keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().flat_map(HashMap::values).map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 曖昧性解消コメントを考慮してエントリを探す
    fn entry(&self, context: &str, source: &str, disambiguation: Option<&str>) -> Option<&Entry> {
        let variants = self.entries.get(context)?.get(source)?;
        variants
            .iter()
            .find(|entry| entry.disambiguation.as_deref() == disambiguation)
            .or_else(|| {
                // 曖昧性解消コメント付きで見つからなければコメントなしを試す
                disambiguation.and_then(|_| variants.iter().find(|entry| entry.disambiguation.is_none()))
            })
    }

    /// Translates `source` within `context`, falling back to `source`.
    #[must_use]
    pub fn translate<'a>(&'a self, context: &str, source: &'a str) -> &'a str {
        self.translate_disambiguated(context, source, None)
    }

    /// Like [`Self::translate`] with a disambiguation comment. When no entry
    /// carries that comment the entry without one is used.
    #[must_use]
    pub fn translate_disambiguated<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        disambiguation: Option<&str>,
    ) -> &'a str {
        self.entry(context, source, disambiguation).map_or(source, |entry| entry.text.as_str())
    }

    /// Returns plural form `form` of a numerus message.
    ///
    /// Missing or empty forms fall back to the first form, then to `source`.
    #[must_use]
    pub fn translate_numerus<'a>(&'a self, context: &str, source: &'a str, form: usize) -> &'a str {
        let Some(entry) = self.entry(context, source, None) else {
            return source;
        };
        entry
            .numerus_forms
            .get(form)
            .filter(|text| !text.is_empty())
            .map_or(entry.text.as_str(), String::as_str)
    }
}
