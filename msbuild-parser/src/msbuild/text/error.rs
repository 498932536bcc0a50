//! Errors raised when positions and offsets fall outside a text snapshot

use super::position::Position;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("line {line} is past the last line ({line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },

    #[error("column {column} is past the end of line {line} ({length} characters)")]
    ColumnOutOfRange {
        line: usize,
        column: usize,
        length: usize,
    },

    #[error("offset {offset} is past the end of the text ({length} characters)")]
    OffsetOutOfRange { offset: usize, length: usize },

    #[error("range start {start} is after its end {end}")]
    InvertedRange { start: Position, end: Position },
}
