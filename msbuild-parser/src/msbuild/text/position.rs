//! Line/column positions with an explicit basis
//!
//! Editors speak zero-based positions, the document model stores one-based ones. A
//! [`Position`] always carries its [`Basis`] so that conversions are explicit and
//! idempotent, and so that two positions in different bases never compare equal by accident.

use serde::Serialize;
use std::fmt;

/// Numbering basis for the line and column of a [`Position`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Basis {
    ZeroBased,
    OneBased,
}

impl Basis {
    fn minimum(self) -> usize {
        match self {
            Basis::ZeroBased => 0,
            Basis::OneBased => 1,
        }
    }
}

/// A (line, column) pair in a specific [`Basis`].
///
/// Ordering is line major, column minor. Positions are only comparable within one basis;
/// normalise with [`Position::to_one_based`] or [`Position::to_zero_based`] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub basis: Basis,
}

impl Position {
    /// The first character of a document, one-based.
    pub const ORIGIN: Position = Position::one_based(1, 1);

    /// The first character of a document, zero-based.
    pub const ZERO: Position = Position::zero_based(0, 0);

    pub const fn one_based(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            basis: Basis::OneBased,
        }
    }

    pub const fn zero_based(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            basis: Basis::ZeroBased,
        }
    }

    pub fn is_zero_based(&self) -> bool {
        self.basis == Basis::ZeroBased
    }

    pub fn is_one_based(&self) -> bool {
        self.basis == Basis::OneBased
    }

    /// Convert to one-based numbering. A position that is already one-based is returned as is.
    pub fn to_one_based(self) -> Self {
        match self.basis {
            Basis::OneBased => self,
            Basis::ZeroBased => Self::one_based(self.line + 1, self.column + 1),
        }
    }

    /// Convert to zero-based numbering, saturating at zero.
    pub fn to_zero_based(self) -> Self {
        match self.basis {
            Basis::ZeroBased => self,
            Basis::OneBased => {
                Self::zero_based(self.line.saturating_sub(1), self.column.saturating_sub(1))
            }
        }
    }

    pub fn to_basis(self, basis: Basis) -> Self {
        match basis {
            Basis::ZeroBased => self.to_zero_based(),
            Basis::OneBased => self.to_one_based(),
        }
    }

    /// Shift by signed line and column deltas, clamping at the first line/column of the basis.
    pub fn move_by(self, lines: isize, columns: isize) -> Self {
        let floor = self.basis.minimum();
        let shift = |value: usize, delta: isize| {
            let moved = if delta.is_negative() {
                value.saturating_sub(delta.unsigned_abs())
            } else {
                value.saturating_add(delta.unsigned_abs())
            };
            moved.max(floor)
        };

        Self {
            line: shift(self.line, lines),
            column: shift(self.column, columns),
            basis: self.basis,
        }
    }

    pub fn with_line(self, line: usize) -> Self {
        Self { line, ..self }
    }

    pub fn with_column(self, column: usize) -> Self {
        Self { column, ..self }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.line, self.column)
    }
}
