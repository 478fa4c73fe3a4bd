// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token types for Protocol Buffers lexical analysis.
//!
//! Each token carries:
//!
//! - A [`TokenKind`] classifying it
//! - A byte-offset [`Span`] and a line/character [`Range`]
//! - Leading [`Trivia`] (whitespace and comments), preserved so comments
//!   can be attached to the following declaration
//!
//! Protobuf keywords (`message`, `enum`, `option`, ...) are **not**
//! distinct token kinds: they are contextual and remain valid
//! identifiers (a field may legally be named `message`). The parser
//! matches keyword text where the grammar calls for it.

use ecow::EcoString;

use super::{Range, Span};

/// The kind of token, not including source location or trivia.
///
/// Tokens are cheap to clone (string data uses [`EcoString`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// An identifier or contextual keyword: `message`, `foo`, `int32`.
    Identifier(EcoString),

    /// An integer literal, kept as raw text: `123`, `0x5678`, `010`.
    ///
    /// The base is decided when the value is consumed; see
    /// `parse_integer` in the parser.
    IntLiteral(EcoString),

    /// A float literal, kept as raw text: `1.5`, `2e8`, `.25`.
    FloatLiteral(EcoString),

    /// A string literal with escapes already decoded. Source may use
    /// double or single quotes.
    StringLiteral(EcoString),

    /// Left brace: `{`
    LeftBrace,
    /// Right brace: `}`
    RightBrace,
    /// Left parenthesis: `(`
    LeftParen,
    /// Right parenthesis: `)`
    RightParen,
    /// Left bracket (field options): `[`
    LeftBracket,
    /// Right bracket: `]`
    RightBracket,
    /// Left angle bracket (map types): `<`
    LeftAngle,
    /// Right angle bracket: `>`
    RightAngle,
    /// Statement terminator: `;`
    Semicolon,
    /// Separator in ranges, options, and map types: `,`
    Comma,
    /// Name separator: `.`
    Dot,
    /// Assignment: `=`
    Equals,
    /// Numeric sign: `+`
    Plus,
    /// Numeric sign: `-`
    Minus,
    /// Aggregate field separator: `:`
    Colon,
    /// Message-literal value separator inside aggregates: `/` (rare,
    /// used by `Any` type URLs)
    Slash,

    /// End of file.
    Eof,

    /// Invalid input (preserves the unparseable text for recovery).
    Error(EcoString),
}

impl TokenKind {
    /// Returns `true` if this token is an identifier.
    #[must_use]
    pub const fn is_identifier(&self) -> bool {
        matches!(self, Self::Identifier(_))
    }

    /// Returns `true` if this is the end-of-file marker.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns `true` if this is an error token.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns the string content if this token carries one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Identifier(s)
            | Self::IntLiteral(s)
            | Self::FloatLiteral(s)
            | Self::StringLiteral(s)
            | Self::Error(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier(s) | Self::IntLiteral(s) | Self::FloatLiteral(s) => {
                write!(f, "{s}")
            }
            Self::StringLiteral(s) => write!(f, "\"{s}\""),
            Self::LeftBrace => write!(f, "{{"),
            Self::RightBrace => write!(f, "}}"),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::LeftBracket => write!(f, "["),
            Self::RightBracket => write!(f, "]"),
            Self::LeftAngle => write!(f, "<"),
            Self::RightAngle => write!(f, ">"),
            Self::Semicolon => write!(f, ";"),
            Self::Comma => write!(f, ","),
            Self::Dot => write!(f, "."),
            Self::Equals => write!(f, "="),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Colon => write!(f, ":"),
            Self::Slash => write!(f, "/"),
            Self::Eof => write!(f, "<eof>"),
            Self::Error(s) => write!(f, "<error: {s}>"),
        }
    }
}

/// Trivia: source content that carries no syntactic meaning but is
/// preserved for comment attachment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Trivia {
    /// Whitespace between tokens (kept to detect blank lines, which
    /// break comment attachment).
    Whitespace(EcoString),
    /// A line comment: `// ...` (text includes the delimiters).
    LineComment(EcoString),
    /// A block comment: `/* ... */` (text includes the delimiters).
    BlockComment(EcoString),
}

impl Trivia {
    /// Returns `true` if this trivia is a comment of either kind.
    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::LineComment(_) | Self::BlockComment(_))
    }
}

/// A token: a kind plus source coordinates and leading trivia.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    kind: TokenKind,
    span: Span,
    range: Range,
    leading_trivia: Vec<Trivia>,
}

impl Token {
    /// Creates a token without trivia.
    #[must_use]
    pub fn new(kind: TokenKind, span: Span, range: Range) -> Self {
        Self {
            kind,
            span,
            range,
            leading_trivia: Vec::new(),
        }
    }

    /// Creates a token with leading trivia.
    #[must_use]
    pub fn with_trivia(kind: TokenKind, span: Span, range: Range, leading: Vec<Trivia>) -> Self {
        Self {
            kind,
            span,
            range,
            leading_trivia: leading,
        }
    }

    /// The token kind.
    #[must_use]
    pub const fn kind(&self) -> &TokenKind {
        &self.kind
    }

    /// The byte-offset span.
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }

    /// The line/character range.
    #[must_use]
    pub const fn range(&self) -> Range {
        self.range
    }

    /// The trivia preceding this token.
    #[must_use]
    pub fn leading_trivia(&self) -> &[Trivia] {
        &self.leading_trivia
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::Position;

    #[test]
    fn token_kind_as_str() {
        assert_eq!(TokenKind::Identifier("foo".into()).as_str(), Some("foo"));
        assert_eq!(TokenKind::IntLiteral("0xFF".into()).as_str(), Some("0xFF"));
        assert_eq!(TokenKind::Semicolon.as_str(), None);
        assert_eq!(TokenKind::Eof.as_str(), None);
    }

    #[test]
    fn token_kind_display() {
        assert_eq!(TokenKind::LeftBrace.to_string(), "{");
        assert_eq!(TokenKind::StringLiteral("hi".into()).to_string(), "\"hi\"");
        assert_eq!(TokenKind::Identifier("enum".into()).to_string(), "enum");
    }

    #[test]
    fn token_accessors() {
        let token = Token::new(
            TokenKind::Identifier("syntax".into()),
            Span::new(0, 6),
            Range::new(Position::new(0, 0), Position::new(0, 6)),
        );
        assert!(token.kind().is_identifier());
        assert_eq!(token.span().len(), 6);
        assert_eq!(token.range().end.character, 6);
        assert!(token.leading_trivia().is_empty());
    }

    #[test]
    fn trivia_is_comment() {
        assert!(Trivia::LineComment("// x".into()).is_comment());
        assert!(Trivia::BlockComment("/* x */".into()).is_comment());
        assert!(!Trivia::Whitespace("  ".into()).is_comment());
    }
}
