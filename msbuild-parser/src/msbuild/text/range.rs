//! Closed source ranges
//!
//! A [`Range`] is inclusive on both ends. Containment therefore still works for the
//! single-character and zero-width spans that show up around empty elements and empty
//! attribute values, and a cursor sitting just after a construct still counts as "on" it.

use super::error::PositionError;
use super::position::Position;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A closed interval `[start, end]` of positions in one basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a range.
    ///
    /// # Panics
    ///
    /// Panics when `start` is after `end`. Use [`Range::try_new`] for untrusted input.
    pub fn new(start: Position, end: Position) -> Self {
        assert!(start <= end, "range start {start} is after its end {end}");
        Self { start, end }
    }

    pub fn try_new(start: Position, end: Position) -> Result<Self, PositionError> {
        if start > end {
            return Err(PositionError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A zero-width range at `position`.
    pub fn empty_at(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn with_start(self, start: Position) -> Self {
        Self::new(start, self.end)
    }

    pub fn with_end(self, end: Position) -> Self {
        Self::new(self.start, end)
    }

    /// Move the start and end independently.
    pub fn transform(
        self,
        start_lines: isize,
        start_columns: isize,
        end_lines: isize,
        end_columns: isize,
    ) -> Self {
        Self::new(
            self.start.move_by(start_lines, start_columns),
            self.end.move_by(end_lines, end_columns),
        )
    }

    pub fn to_one_based(self) -> Self {
        Self {
            start: self.start.to_one_based(),
            end: self.end.to_one_based(),
        }
    }

    pub fn to_zero_based(self) -> Self {
        Self {
            start: self.start.to_zero_based(),
            end: self.end.to_zero_based(),
        }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    /// Inclusive on both ends.
    pub fn contains_range(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Where `position` lies relative to this range: `Less` before it, `Equal` within it,
    /// `Greater` after it.
    pub fn compare_position(&self, position: Position) -> Ordering {
        if position < self.start {
            Ordering::Less
        } else if position > self.end {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

impl From<Position> for Range {
    fn from(position: Position) -> Self {
        Range::empty_at(position)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
