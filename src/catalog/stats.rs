//! Translation progress numbers.

use serde::Serialize;

use super::model::{
    Catalog,
    Context,
    TranslationStatus,
};

/// Message counts grouped by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub messages: usize,
    pub finished: usize,
    pub unfinished: usize,
    pub vanished: usize,
    pub obsolete: usize,
}

impl StatusCounts {
    /// Counts of one context.
    fn of_context(context: &Context) -> Self {
        let mut counts = Self::default();
        for message in &context.messages {
            counts.add(message.status());
        }
        counts
    }

    /// Counts one more message.
    const fn add(&mut self, status: TranslationStatus) {
        self.messages += 1;
        match status {
            TranslationStatus::Finished => self.finished += 1,
            TranslationStatus::Unfinished => self.unfinished += 1,
            TranslationStatus::Vanished => self.vanished += 1,
            TranslationStatus::Obsolete => self.obsolete += 1,
        }
    }

    /// Adds another set of counts.
    const fn merge(&mut self, other: Self) {
        self.messages += other.messages;
        self.finished += other.finished;
        self.unfinished += other.unfinished;
        self.vanished += other.vanished;
        self.obsolete += other.obsolete;
    }

    /// Messages still referenced by the application.
    #[must_use]
    pub const fn active(&self) -> usize {
        self.finished + self.unfinished
    }

    /// Finished share of the active messages, rounded down.
    ///
    /// Nothing left to translate counts as complete.
    #[must_use]
    pub fn completion_percent(&self) -> u32 {
        let active = self.active();
        if active == 0 {
            return 100;
        }
        u32::try_from(self.finished.saturating_mul(100) / active).unwrap_or(100)
    }
}

/// Numbers for one `<context>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextStatistics {
    pub name: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub completion_percent: u32,
}

/// Numbers for a whole catalog, plus the per-context breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatistics {
    pub language: Option<String>,
    #[serde(flatten)]
    pub total: StatusCounts,
    pub completion_percent: u32,
    pub contexts: Vec<ContextStatistics>,
}

impl CatalogStatistics {
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut total = StatusCounts::default();
        let contexts = catalog
            .contexts
            .iter()
            .map(|context| {
                let counts = StatusCounts::of_context(context);
                total.merge(counts);
                ContextStatistics {
                    name: context.name.clone(),
                    counts,
                    completion_percent: counts.completion_percent(),
                }
            })
            .collect();

        Self {
            language: catalog.language.clone(),
            total,
            completion_percent: total.completion_percent(),
            contexts,
        }
    }

    #[must_use]
    pub fn context(&self, name: &str) -> Option<&ContextStatistics> {
        self.contexts.iter().find(|context| context.name == name)
    }
}

impl Catalog {
    #[must_use]
    pub fn statistics(&self) -> CatalogStatistics {
        CatalogStatistics::from_catalog(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::catalog::parse_catalog;
    use crate::test_utils::SAMPLE_CATALOG;

    #[googletest::test]
    fn test_sample_statistics() {
        let stats = parse_catalog(SAMPLE_CATALOG).unwrap().catalog.statistics();

        expect_that!(
            stats.total,
            eq(StatusCounts { messages: 5, finished: 2, unfinished: 2, vanished: 1, obsolete: 0 })
        );
        expect_that!(stats.total.active(), eq(4));
        expect_that!(stats.completion_percent, eq(50));
        expect_that!(stats.language.as_deref(), some(eq("pt_BR")));
    }

    #[googletest::test]
    fn test_per_context_statistics() {
        let stats = parse_catalog(SAMPLE_CATALOG).unwrap().catalog.statistics();

        expect_that!(stats.contexts.len(), eq(2));
        let main_window = stats.context("MainWindow").unwrap();
        expect_that!(main_window.counts.messages, eq(3));
        expect_that!(main_window.counts.vanished, eq(1));
        expect_that!(main_window.completion_percent, eq(50));
        expect_that!(stats.context("Missing"), none());
    }

    #[rstest]
    #[case::nothing_active(0, 0, 100)]
    #[case::none_done(0, 5, 0)]
    #[case::rounds_down(161, 26, 86)]
    #[case::all_done(7, 0, 100)]
    fn test_completion_percent(
        #[case] finished: usize,
        #[case] unfinished: usize,
        #[case] expected: u32,
    ) {
        let counts = StatusCounts { finished, unfinished, ..StatusCounts::default() };

        assert_that!(counts.completion_percent(), eq(expected));
    }

    #[googletest::test]
    fn test_serializes_flat_camel_case() {
        let stats = parse_catalog(SAMPLE_CATALOG).unwrap().catalog.statistics();

        let json = serde_json::to_value(&stats).unwrap();

        expect_that!(json["completionPercent"].as_u64(), some(eq(50)));
        expect_that!(json["finished"].as_u64(), some(eq(2)));
        expect_that!(json["contexts"][1]["name"].as_str(), some(eq("options::PageAudio")));
    }
}
