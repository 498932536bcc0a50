//! Positions, ranges and the per-snapshot position index
//!
//! ## Types
//!
//! - [`Position`] - a line/column pair that knows whether it is zero- or one-based
//! - [`Range`] - a closed interval of positions
//! - [`PositionIndex`] - converts between positions and character offsets for one text snapshot

pub mod error;
pub mod index;
pub mod position;
pub mod range;

pub use error::PositionError;
pub use index::{LineEnding, PositionIndex};
pub use position::{Basis, Position};
pub use range::Range;
