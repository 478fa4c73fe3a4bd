// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fatal error types for parsing.
//!
//! Errors carry byte-offset [`Span`]s and integrate with [`miette`] for
//! rendering. Only conditions that make the whole document unparseable
//! live here; recoverable syntax errors are
//! [`Diagnostic`](super::Diagnostic) values accumulated by the parser.
//!
//! Callers receiving a [`ParseError`] must treat the document as
//! unparsed (e.g. keep the previous good AST) — the error is local to
//! one document and never affects index state for other documents.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

use super::Span;

/// A fatal lexical error: the remainder of the input was consumed by an
/// unterminated construct, leaving no boundary to resynchronize at.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{kind}")]
#[diagnostic()]
pub struct LexError {
    /// The kind of lexical error.
    #[source]
    pub kind: LexErrorKind,
    /// The source location of the error.
    #[label("starts here")]
    pub span: Span,
}

impl LexError {
    /// Creates a new lexical error.
    #[must_use]
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Creates an "unterminated string" error.
    #[must_use]
    pub fn unterminated_string(span: Span) -> Self {
        Self::new(LexErrorKind::UnterminatedString, span)
    }

    /// Creates an "unterminated comment" error.
    #[must_use]
    pub fn unterminated_comment(span: Span) -> Self {
        Self::new(LexErrorKind::UnterminatedComment, span)
    }
}

/// The kind of fatal lexical error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    /// A string literal ran to the end of input without a closing quote.
    #[error("unterminated string literal at end of input")]
    UnterminatedString,

    /// A block comment ran to the end of input without `*/`.
    #[error("unterminated block comment at end of input")]
    UnterminatedComment,
}

/// A fatal parse error.
///
/// [`parse`](super::parse) returns this instead of an AST when the
/// document cannot be meaningfully parsed at all. Local malformed
/// constructs never produce this — the parser recovers and records a
/// [`Diagnostic`](super::Diagnostic) instead.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ParseError {
    /// Tokenization failed fatally.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    /// Nesting exceeded the configured limit.
    ///
    /// This protects the host process from stack exhaustion on
    /// adversarial or corrupted input. It aborts rather than silently
    /// truncating the tree.
    #[error("nesting is too deep (maximum {limit} levels)")]
    NestingTooDeep {
        /// The depth limit that was exceeded.
        limit: usize,
        /// Where the limit was exceeded.
        #[label("nesting exceeds the limit here")]
        span: Span,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_display() {
        let err = LexError::unterminated_string(Span::new(0, 10));
        assert_eq!(err.to_string(), "unterminated string literal at end of input");

        let err = LexError::unterminated_comment(Span::new(5, 15));
        assert_eq!(err.to_string(), "unterminated block comment at end of input");
        assert_eq!(err.span.start(), 5);
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::NestingTooDeep {
            limit: 64,
            span: Span::new(100, 101),
        };
        assert_eq!(err.to_string(), "nesting is too deep (maximum 64 levels)");

        let err: ParseError = LexError::unterminated_string(Span::new(0, 1)).into();
        assert!(matches!(err, ParseError::Lex(_)));
    }
}
