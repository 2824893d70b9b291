//! Core types used throughout the project.

use tower_lsp::lsp_types;

/// A range in source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl From<lsp_types::Range> for SourceRange {
    fn from(range: lsp_types::Range) -> Self {
        Self { start: range.start.into(), end: range.end.into() }
    }
}

impl From<SourceRange> for lsp_types::Range {
    fn from(range: SourceRange) -> Self {
        Self { start: range.start.into(), end: range.end.into() }
    }
}

/// A position in source code (0-indexed, UTF-16 columns as LSP expects).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub line: u32,
    pub character: u32,
}

impl From<lsp_types::Position> for SourcePosition {
    fn from(position: lsp_types::Position) -> Self {
        Self { line: position.line, character: position.character }
    }
}

impl From<SourcePosition> for lsp_types::Position {
    fn from(position: SourcePosition) -> Self {
        Self { line: position.line, character: position.character }
    }
}

impl SourceRange {
    /// Checks if a position is within this range.
    #[must_use]
    pub const fn contains(&self, position: SourcePosition) -> bool {
        if position.line < self.start.line {
            return false;
        }
        if position.line == self.start.line && position.character < self.start.character {
            return false;
        }
        if position.line > self.end.line {
            return false;
        }
        if position.line == self.end.line && position.character > self.end.character {
            return false;
        }
        true
    }
}

/// Half-open byte range `[start, end)` into a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ByteSpan {
    pub start: usize,
    pub end: usize,
}

impl ByteSpan {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Inclusive on both ends so a cursor right after a closing tag still matches.
    #[must_use]
    pub const fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// Maps byte offsets to LSP positions and back.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    /// Indexed document.
    text: &'a str,
    /// Byte offset of the first character of every line.
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(offset, _)| offset + 1));
        Self { text, line_starts }
    }

    /// Converts a byte offset to a position. Offsets past the end clamp to the end.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn position(&self, offset: usize) -> SourcePosition {
        let offset = self.clamp_to_boundary(offset);
        let line = self.line_starts.partition_point(|&start| start <= offset).saturating_sub(1);
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        let character = self
            .text
            .get(line_start..offset)
            .map_or(0, |prefix| prefix.encode_utf16().count());

        SourcePosition { line: line as u32, character: character as u32 }
    }

    /// Converts a byte span to a range.
    #[must_use]
    pub fn range(&self, span: ByteSpan) -> SourceRange {
        SourceRange { start: self.position(span.start), end: self.position(span.end) }
    }

    /// Converts a position to a byte offset. Columns past the line end clamp to the line end.
    #[must_use]
    pub fn offset(&self, position: SourcePosition) -> usize {
        let Some(&line_start) = self.line_starts.get(position.line as usize) else {
            return self.text.len();
        };
        let line_end = self
            .line_starts
            .get(position.line as usize + 1)
            .map_or(self.text.len(), |next| next.saturating_sub(1));
        let line_text = self.text.get(line_start..line_end).unwrap_or("");

        let mut utf16_column = 0;
        for (byte_index, ch) in line_text.char_indices() {
            if utf16_column >= position.character as usize {
                return line_start + byte_index;
            }
            utf16_column += ch.len_utf16();
        }
        line_end
    }

    /// Position just past the last character of the document.
    #[must_use]
    pub fn end_position(&self) -> SourcePosition {
        self.position(self.text.len())
    }

    /// Moves `offset` back to the nearest char boundary.
    fn clamp_to_boundary(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    const fn pos(line: u32, character: u32) -> SourcePosition {
        SourcePosition { line, character }
    }

    const fn range(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> SourceRange {
        SourceRange { start: pos(start_line, start_char), end: pos(end_line, end_char) }
    }

    #[rstest]
    #[case::before_start_line(pos(0, 5), range(1, 5, 2, 10), false)]
    #[case::before_start_char(pos(1, 4), range(1, 5, 2, 10), false)]
    #[case::at_start(pos(1, 5), range(1, 5, 2, 10), true)]
    #[case::middle_line(pos(1, 10), range(1, 5, 2, 10), true)]
    #[case::at_end(pos(2, 10), range(1, 5, 2, 10), true)]
    #[case::after_end_char(pos(2, 11), range(1, 5, 2, 10), false)]
    #[case::after_end_line(pos(3, 0), range(1, 5, 2, 10), false)]
    fn test_contains(
        #[case] position: SourcePosition,
        #[case] range: SourceRange,
        #[case] expected: bool,
    ) {
        assert_that!(range.contains(position), eq(expected));
    }

    #[rstest]
    #[case::start_of_document(0, pos(0, 0))]
    #[case::middle_of_first_line(3, pos(0, 3))]
    #[case::start_of_second_line(6, pos(1, 0))]
    #[case::end_of_document(11, pos(1, 5))]
    #[case::past_end_clamps(100, pos(1, 5))]
    fn test_position_ascii(#[case] offset: usize, #[case] expected: SourcePosition) {
        let index = LineIndex::new("hello\nworld");

        assert_that!(index.position(offset), eq(expected));
    }

    #[googletest::test]
    fn test_position_counts_utf16_units() {
        // "ç" は UTF-8 で 2 バイト、UTF-16 で 1 ユニット
        let text = "<s>Cálculo</s>";
        let index = LineIndex::new(text);
        let offset = text.find("</s>").unwrap();

        expect_that!(index.position(offset), eq(pos(0, 10)));
    }

    #[googletest::test]
    fn test_offset_round_trips_position() {
        let text = "<a>\n  <b>Informação</b>\n</a>\n";
        let index = LineIndex::new(text);
        let offset = text.find("</b>").unwrap();
        let position = index.position(offset);

        expect_that!(index.offset(position), eq(offset));
    }

    #[rstest]
    #[case::column_past_line_end(pos(0, 99), 5)]
    #[case::line_past_document_end(pos(9, 0), 11)]
    fn test_offset_clamps(#[case] position: SourcePosition, #[case] expected: usize) {
        let index = LineIndex::new("hello\nworld");

        assert_that!(index.offset(position), eq(expected));
    }

    #[googletest::test]
    fn test_byte_span_contains_is_inclusive() {
        let span = ByteSpan::new(4, 8);

        expect_that!(span.contains(3), eq(false));
        expect_that!(span.contains(4), eq(true));
        expect_that!(span.contains(8), eq(true));
        expect_that!(span.contains(9), eq(false));
    }
}
