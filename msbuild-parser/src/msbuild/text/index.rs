//! Conversion between positions and flat character offsets
//!
//! [`PositionIndex`] is built once per text snapshot and never changes afterwards. Offsets
//! count characters (Unicode scalar values), which is what the expression grammar and the
//! semantic model work in; byte offsets from tokenizers are bridged through
//! [`PositionIndex::byte_to_offset`].
//!
//! Line lookups are a binary search over the recorded line starts, so every conversion is
//! O(log lines) plus a walk within a single line for byte bridging.

use super::error::PositionError;
use super::position::Position;
use super::range::Range;
use serde::Serialize;
use std::ops;
use std::sync::Arc;

/// The line terminator a document predominantly uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PositionIndex {
    text: Arc<str>,
    /// Character offset of the first character of each line
    line_starts: Vec<usize>,
    /// Byte offset of the first character of each line
    line_byte_starts: Vec<usize>,
    length: usize,
    line_ending: LineEnding,
}

impl PositionIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let mut line_byte_starts = vec![0];
        let mut length = 0;

        for (byte, ch) in text.char_indices() {
            length += 1;
            if ch == '\n' {
                line_starts.push(length);
                line_byte_starts.push(byte + 1);
            }
        }

        let line_ending = if text.contains("\r\n") || !text.contains('\n') {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        };

        Self {
            text: Arc::from(text),
            line_starts,
            line_byte_starts,
            length,
            line_ending,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in characters.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// The character offset of `position`, which may be in either basis.
    ///
    /// Line terminators are addressable on every line but the last; on the last line the
    /// column just past the final character is addressable.
    pub fn to_offset(&self, position: Position) -> Result<usize, PositionError> {
        let zero = position.to_zero_based();
        let line_count = self.line_count();

        let start = *self
            .line_starts
            .get(zero.line)
            .ok_or(PositionError::LineOutOfRange {
                line: position.line,
                line_count,
            })?;
        let is_last = zero.line + 1 == line_count;
        let end = self
            .line_starts
            .get(zero.line + 1)
            .copied()
            .unwrap_or(self.length);
        let length = end - start;

        let addressable = if is_last {
            zero.column <= length
        } else {
            zero.column < length
        };
        if !addressable {
            return Err(PositionError::ColumnOutOfRange {
                line: position.line,
                column: position.column,
                length,
            });
        }

        Ok(start + zero.column)
    }

    /// The one-based position of a character offset. `offset == len()` is the end of text.
    pub fn to_position(&self, offset: usize) -> Result<Position, PositionError> {
        if offset > self.length {
            return Err(PositionError::OffsetOutOfRange {
                offset,
                length: self.length,
            });
        }
        Ok(self.position_at(offset))
    }

    /// Like [`PositionIndex::to_position`], clamping offsets past the end of the text.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.length);
        let line = self.line_of(offset);
        Position::zero_based(line, offset - self.line_starts[line]).to_one_based()
    }

    /// Map a half-open character span onto a closed range.
    ///
    /// The range ends at the position of the exclusive end offset, so a cursor placed right
    /// after the last character of the span is still contained.
    pub fn span_to_range(&self, span: ops::Range<usize>) -> Range {
        let start = self.position_at(span.start);
        let end = self.position_at(span.end.max(span.start));
        Range::new(start, end)
    }

    /// Convert a byte offset into the text into a character offset.
    pub fn byte_to_offset(&self, byte: usize) -> usize {
        let byte = byte.min(self.text.len());
        let line = match self.line_byte_starts.binary_search(&byte) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_byte = self.line_byte_starts[line];
        let column = self.text[line_byte..]
            .char_indices()
            .take_while(|(index, _)| line_byte + index < byte)
            .count();
        self.line_starts[line] + column
    }

    /// Convert a character offset into a byte offset, clamping at the end of the text.
    pub fn offset_to_byte(&self, offset: usize) -> usize {
        let offset = offset.min(self.length);
        let line = self.line_of(offset);
        let line_byte = self.line_byte_starts[line];
        self.text[line_byte..]
            .char_indices()
            .nth(offset - self.line_starts[line])
            .map(|(index, _)| line_byte + index)
            .unwrap_or(self.text.len())
    }

    /// The text covered by a character span.
    pub fn slice(&self, span: ops::Range<usize>) -> &str {
        let start = self.offset_to_byte(span.start);
        let end = self.offset_to_byte(span.end.max(span.start));
        &self.text[start..end]
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_offsets_on_multiple_lines() {
        let index = PositionIndex::new("Hello\nworld\ntest");

        assert_eq!(index.line_count(), 3);
        assert_eq!(index.to_offset(Position::one_based(1, 1)), Ok(0));
        assert_eq!(index.to_offset(Position::one_based(2, 1)), Ok(6));
        assert_eq!(index.to_offset(Position::zero_based(2, 3)), Ok(15));
        assert_eq!(index.to_position(10), Ok(Position::one_based(2, 5)));
    }

    #[test]
    fn test_line_terminator_is_addressable() {
        let index = PositionIndex::new("ab\ncd");

        assert_eq!(index.to_offset(Position::one_based(1, 3)), Ok(2));
        assert_eq!(
            index.to_offset(Position::one_based(1, 4)),
            Err(PositionError::ColumnOutOfRange {
                line: 1,
                column: 4,
                length: 3
            })
        );
        // end of text on the last line
        assert_eq!(index.to_offset(Position::one_based(2, 3)), Ok(5));
        assert_eq!(index.to_position(5), Ok(Position::one_based(2, 3)));
    }

    #[test]
    fn test_out_of_range() {
        let index = PositionIndex::new("abc");

        assert_eq!(
            index.to_offset(Position::one_based(2, 1)),
            Err(PositionError::LineOutOfRange {
                line: 2,
                line_count: 1
            })
        );
        assert_eq!(
            index.to_position(4),
            Err(PositionError::OffsetOutOfRange {
                offset: 4,
                length: 3
            })
        );
    }

    #[test]
    fn test_trailing_newline_opens_a_line() {
        let index = PositionIndex::new("a\n");

        assert_eq!(index.line_count(), 2);
        assert_eq!(index.to_position(2), Ok(Position::one_based(2, 1)));
    }

    #[test]
    fn test_line_ending_detection() {
        assert_eq!(PositionIndex::new("a\r\nb").line_ending(), LineEnding::CrLf);
        assert_eq!(PositionIndex::new("a\nb").line_ending(), LineEnding::Lf);
        assert_eq!(PositionIndex::new("ab").line_ending(), LineEnding::CrLf);
    }

    #[test]
    fn test_crlf_columns_count_carriage_return() {
        let index = PositionIndex::new("ab\r\ncd");

        assert_eq!(index.to_offset(Position::one_based(1, 3)), Ok(2));
        assert_eq!(index.to_offset(Position::one_based(2, 1)), Ok(4));
    }

    #[test]
    fn test_byte_bridging_with_unicode() {
        let index = PositionIndex::new("wö\nrld");

        // 'ö' is two bytes wide
        assert_eq!(index.byte_to_offset(3), 2);
        assert_eq!(index.byte_to_offset(4), 3);
        assert_eq!(index.offset_to_byte(3), 4);
        assert_eq!(index.slice(1..3), "ö\n");
        assert_eq!(index.to_position(3), Ok(Position::one_based(2, 1)));
    }

    #[test]
    fn test_span_to_range_ends_after_last_character() {
        let index = PositionIndex::new("<a/>");
        let range = index.span_to_range(0..4);

        assert_eq!(range.start, Position::one_based(1, 1));
        assert_eq!(range.end, Position::one_based(1, 5));
    }

    fn text_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec(prop_oneof!["[a-z]{0,6}", Just("\n".to_string()), Just("\r\n".to_string()), Just("é".to_string())], 0..20)
            .prop_map(|parts| parts.concat())
    }

    proptest! {
        #[test]
        fn offset_round_trip(text in text_strategy()) {
            let index = PositionIndex::new(&text);
            for offset in 0..=index.len() {
                let position = index.to_position(offset).unwrap();
                prop_assert_eq!(index.to_offset(position), Ok(offset));
            }
        }

        #[test]
        fn position_round_trip(text in text_strategy(), line in 0usize..8, column in 0usize..8) {
            let index = PositionIndex::new(&text);
            let position = Position::zero_based(line, column);
            if let Ok(offset) = index.to_offset(position) {
                prop_assert_eq!(index.to_position(offset), Ok(position.to_one_based()));
            }
        }

        #[test]
        fn byte_bridging_round_trip(text in text_strategy()) {
            let index = PositionIndex::new(&text);
            for offset in 0..=index.len() {
                prop_assert_eq!(index.byte_to_offset(index.offset_to_byte(offset)), offset);
            }
        }
    }
}
