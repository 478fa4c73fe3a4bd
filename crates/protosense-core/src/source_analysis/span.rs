// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source location tracking.
//!
//! Two coordinate systems coexist:
//!
//! - [`Span`] is a byte-offset range, used by tokens internally and by
//!   error reporting (miette labels, raw-text slicing).
//! - [`Range`] is a line/character range (0-based, half-open), the unit
//!   stored on every AST node. Editor features address documents by
//!   line/character, so this is the coordinate system the index exposes.

use std::ops::Range as StdRange;

/// A span of source code, represented as a byte offset range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: u32,
    end: u32,
}

impl Span {
    /// Creates a new span from start and end byte offsets.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Returns the start byte offset.
    #[must_use]
    pub const fn start(self) -> u32 {
        self.start
    }

    /// Returns the end byte offset (exclusive).
    #[must_use]
    pub const fn end(self) -> u32 {
        self.end
    }

    /// Returns the length of the span in bytes.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end - self.start
    }

    /// Returns true if the span is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Creates a span that covers both `self` and `other`.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        let start = if self.start < other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end > other.end {
            self.end
        } else {
            other.end
        };
        Self { start, end }
    }

    /// Converts to a `Range<usize>` for indexing into source text.
    #[must_use]
    pub const fn as_range(self) -> StdRange<usize> {
        self.start as usize..self.end as usize
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start as usize, span.len() as usize).into()
    }
}

/// A position in a source document: line and character, both 0-based.
///
/// `character` counts Unicode scalar values from the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Position {
    /// Line number (0-based).
    pub line: u32,
    /// Character offset within the line (0-based).
    pub character: u32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Converts a byte offset into a position for the given source text.
    ///
    /// Returns `None` if the offset is out of bounds or not on a
    /// character boundary.
    #[must_use]
    pub fn from_byte_offset(source: &str, offset: usize) -> Option<Self> {
        if offset > source.len() || !source.is_char_boundary(offset) {
            return None;
        }
        let mut line = 0u32;
        let mut character = 0u32;
        for (i, ch) in source.char_indices() {
            if i >= offset {
                return Some(Self::new(line, character));
            }
            if ch == '\n' {
                line += 1;
                character = 0;
            } else {
                character += 1;
            }
        }
        Some(Self::new(line, character))
    }

    /// Converts a position into a byte offset for the given source text.
    ///
    /// Returns `None` if the position does not exist in the text.
    #[must_use]
    pub fn to_byte_offset(self, source: &str) -> Option<usize> {
        let mut line = 0u32;
        let mut character = 0u32;
        for (i, ch) in source.char_indices() {
            if line == self.line && character == self.character {
                return Some(i);
            }
            if ch == '\n' {
                if line == self.line {
                    // Went past the end of the requested line.
                    return None;
                }
                line += 1;
                character = 0;
            } else {
                character += 1;
            }
        }
        (line == self.line && character == self.character).then_some(source.len())
    }
}

/// A line/character range, half-open: `[start, end)`.
///
/// Every AST node carries one of these. Named constructs additionally
/// carry narrower ranges (name, type token) so rename and hover can
/// target the exact sub-span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    /// The start position (inclusive).
    pub start: Position,
    /// The end position (exclusive).
    pub end: Position,
}

impl Range {
    /// Creates a new range.
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Creates a range that covers both `self` and `other`.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns true if the position falls inside this range.
    #[must_use]
    pub fn contains(self, position: Position) -> bool {
        self.start <= position && position < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_accessors_and_merge() {
        let a = Span::new(5, 10);
        let b = Span::new(15, 20);
        assert_eq!(a.len(), 5);
        assert!(!a.is_empty());
        let merged = a.merge(b);
        assert_eq!(merged.start(), 5);
        assert_eq!(merged.end(), 20);
    }

    #[test]
    fn position_from_byte_offset() {
        let source = "hello\nworld";
        assert_eq!(
            Position::from_byte_offset(source, 0),
            Some(Position::new(0, 0))
        );
        assert_eq!(
            Position::from_byte_offset(source, 6),
            Some(Position::new(1, 0))
        );
        assert_eq!(
            Position::from_byte_offset(source, 11),
            Some(Position::new(1, 5))
        );
        assert_eq!(Position::from_byte_offset(source, 100), None);
    }

    #[test]
    fn position_roundtrip_multibyte() {
        // é is 2 bytes but 1 character
        let source = "héllo\nx";
        let pos = Position::from_byte_offset(source, 3).unwrap();
        assert_eq!(pos, Position::new(0, 2));
        assert_eq!(pos.to_byte_offset(source), Some(3));
        assert_eq!(Position::new(1, 0).to_byte_offset(source), Some(7));
    }

    #[test]
    fn range_contains_is_half_open() {
        let range = Range::new(Position::new(0, 2), Position::new(0, 5));
        assert!(!range.contains(Position::new(0, 1)));
        assert!(range.contains(Position::new(0, 2)));
        assert!(range.contains(Position::new(0, 4)));
        assert!(!range.contains(Position::new(0, 5)));
    }

    #[test]
    fn range_merge_spans_lines() {
        let a = Range::new(Position::new(0, 0), Position::new(0, 7));
        let b = Range::new(Position::new(3, 0), Position::new(3, 1));
        let merged = a.merge(b);
        assert_eq!(merged.start, Position::new(0, 0));
        assert_eq!(merged.end, Position::new(3, 1));
    }
}
