//! Byte store, rune cursor, and line index backing the lexer.
//!
//! Tracks a mark stack and width stack for backtracking over decoded
//! runes, an O(log n) line index, and returns errors from every
//! bounds-checked accessor rather than panicking.

mod buffer;
mod location;
mod rune;

pub use buffer::SourceBuffer;
pub use location::{Position, SourceLocation};
pub use rune::Rune;
