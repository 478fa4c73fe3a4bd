// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for Protocol Buffers source text.
//!
//! This module converts source text into a stream of [`Token`]s. The
//! lexer is hand-written for maximum control over error recovery and
//! position tracking.
//!
//! # Design Principles
//!
//! - **Error recovery**: unknown characters and strings broken by a
//!   newline become [`TokenKind::Error`] tokens; parsing continues
//! - **Fatal only at end of input**: a string or block comment still
//!   open when the input ends makes resynchronization impossible and
//!   aborts tokenization with a [`LexError`]
//! - **Trivia preservation**: comments are attached as leading trivia so
//!   the parser can hang them on the following declaration
//! - **Dual coordinates**: every token carries a byte [`Span`] and a
//!   line/character [`Range`](super::Range)

use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use super::error::LexError;
use super::{Position, Range, Span, Token, TokenKind, Trivia};

/// Tokenizes an entire document, ending with an [`TokenKind::Eof`] token.
///
/// Returns `Err` only for conditions that make resynchronization
/// impossible: an unterminated string literal or block comment running
/// to the end of input.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.lex_token()?;
        let done = token.kind().is_eof();
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

/// A lexer that tokenizes Protocol Buffers source text.
///
/// Keywords are contextual in protobuf, so the lexer emits plain
/// [`TokenKind::Identifier`] tokens for all words; the parser matches
/// keyword text where the grammar requires it.
pub struct Lexer<'src> {
    /// The source text being lexed.
    source: &'src str,
    /// Character iterator with byte positions.
    chars: Peekable<CharIndices<'src>>,
    /// Current byte position in source.
    position: usize,
    /// Current line (0-based).
    line: u32,
    /// Current character within the line (0-based, Unicode scalars).
    character: u32,
    /// Pending trivia to attach to the next token.
    pending_trivia: Vec<Trivia>,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("remaining", &self.source.get(self.position..).unwrap_or(""))
            .finish()
    }
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source text.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            line: 0,
            character: 0,
            pending_trivia: Vec::new(),
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks `n+1` characters ahead without consuming.
    fn peek_char_n(&self, n: usize) -> Option<char> {
        let mut iter = self.chars.clone();
        for _ in 0..n {
            iter.next();
        }
        iter.next().map(|(_, c)| c)
    }

    /// Consumes the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.character = 0;
        } else {
            self.character += 1;
        }
        Some(c)
    }

    /// Consumes characters while the predicate is true.
    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// Returns the current byte position.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    fn byte_position(&self) -> u32 {
        self.position as u32
    }

    /// Returns the current line/character position.
    fn current_position(&self) -> Position {
        Position::new(self.line, self.character)
    }

    /// Creates a byte span from start to current position.
    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.byte_position())
    }

    /// Extracts source text for a span.
    fn text_for(&self, span: Span) -> &'src str {
        &self.source[span.as_range()]
    }

    /// Skips whitespace and comments, collecting them as trivia.
    ///
    /// A block comment still open at end of input is fatal: the whole
    /// remainder of the document has been swallowed and there is no
    /// boundary to resynchronize at.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek_char() {
                Some(' ' | '\t' | '\r' | '\n') => {
                    let start = self.byte_position();
                    self.advance_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
                    let text = self.text_for(self.span_from(start));
                    self.pending_trivia
                        .push(Trivia::Whitespace(EcoString::from(text)));
                }
                Some('/') if self.peek_char_n(1) == Some('/') => {
                    self.lex_line_comment();
                }
                Some('/') if self.peek_char_n(1) == Some('*') => {
                    self.lex_block_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Lexes a line comment: `// ...`
    fn lex_line_comment(&mut self) {
        let start = self.byte_position();
        self.advance(); // /
        self.advance(); // /
        self.advance_while(|c| c != '\n');
        let text = self.text_for(self.span_from(start));
        self.pending_trivia
            .push(Trivia::LineComment(EcoString::from(text)));
    }

    /// Lexes a block comment: `/* ... */`, possibly spanning lines.
    fn lex_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.byte_position();
        self.advance(); // /
        self.advance(); // *

        loop {
            match self.peek_char() {
                None => {
                    return Err(LexError::unterminated_comment(self.span_from(start)));
                }
                Some('*') if self.peek_char_n(1) == Some('/') => {
                    self.advance(); // *
                    self.advance(); // /
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }

        let text = self.text_for(self.span_from(start));
        self.pending_trivia
            .push(Trivia::BlockComment(EcoString::from(text)));
        Ok(())
    }

    /// Lexes the next token.
    fn lex_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;
        let leading_trivia = std::mem::take(&mut self.pending_trivia);

        let start = self.byte_position();
        let start_pos = self.current_position();

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) => self.lex_token_kind(c, start)?,
        };

        let span = self.span_from(start);
        let range = Range::new(start_pos, self.current_position());
        Ok(Token::with_trivia(kind, span, range, leading_trivia))
    }

    /// Lexes a token kind based on the first character.
    fn lex_token_kind(&mut self, c: char, start: u32) -> Result<TokenKind, LexError> {
        let kind = match c {
            'a'..='z' | 'A'..='Z' | '_' => self.lex_identifier(),

            '0'..='9' => self.lex_number(),

            // A dot directly followed by a digit is a float like `.5`;
            // anywhere else it separates name segments.
            '.' => {
                if self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.lex_number()
                } else {
                    self.advance();
                    TokenKind::Dot
                }
            }

            '"' | '\'' => self.lex_string(c, start)?,

            '{' => self.single(TokenKind::LeftBrace),
            '}' => self.single(TokenKind::RightBrace),
            '(' => self.single(TokenKind::LeftParen),
            ')' => self.single(TokenKind::RightParen),
            '[' => self.single(TokenKind::LeftBracket),
            ']' => self.single(TokenKind::RightBracket),
            '<' => self.single(TokenKind::LeftAngle),
            '>' => self.single(TokenKind::RightAngle),
            ';' => self.single(TokenKind::Semicolon),
            ',' => self.single(TokenKind::Comma),
            '=' => self.single(TokenKind::Equals),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            ':' => self.single(TokenKind::Colon),
            '/' => self.single(TokenKind::Slash),

            // Unknown character - error recovery
            _ => {
                self.advance();
                let text = self.text_for(self.span_from(start));
                TokenKind::Error(EcoString::from(text))
            }
        };
        Ok(kind)
    }

    /// Consumes one character and returns the given kind.
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Lexes an identifier (or contextual keyword).
    fn lex_identifier(&mut self) -> TokenKind {
        let start = self.byte_position();
        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let text = self.text_for(self.span_from(start));
        TokenKind::Identifier(EcoString::from(text))
    }

    /// Lexes an integer or float literal, keeping the raw text.
    ///
    /// Base classification (decimal/hex/octal) happens when the value is
    /// consumed, so `0x5678` and `010` survive here verbatim.
    fn lex_number(&mut self) -> TokenKind {
        let start = self.byte_position();
        let mut is_float = false;

        if self.peek_char() == Some('0')
            && matches!(self.peek_char_n(1), Some('x' | 'X'))
            && self.peek_char_n(2).is_some_and(|c| c.is_ascii_hexdigit())
        {
            self.advance(); // 0
            self.advance(); // x
            self.advance_while(|c| c.is_ascii_hexdigit());
            let text = self.text_for(self.span_from(start));
            return TokenKind::IntLiteral(EcoString::from(text));
        }

        self.advance_while(|c| c.is_ascii_digit());

        if self.peek_char() == Some('.') {
            is_float = true;
            self.advance(); // .
            self.advance_while(|c| c.is_ascii_digit());
        }

        if matches!(self.peek_char(), Some('e' | 'E'))
            && (self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
                || (matches!(self.peek_char_n(1), Some('+' | '-'))
                    && self.peek_char_n(2).is_some_and(|c| c.is_ascii_digit())))
        {
            is_float = true;
            self.advance(); // e
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.advance();
            }
            self.advance_while(|c| c.is_ascii_digit());
        }

        let text = self.text_for(self.span_from(start));
        if is_float {
            TokenKind::FloatLiteral(EcoString::from(text))
        } else {
            TokenKind::IntLiteral(EcoString::from(text))
        }
    }

    /// Lexes a string literal delimited by `quote` (either `"` or `'`).
    ///
    /// Escapes are decoded in place. A newline before the closing quote
    /// produces a recoverable [`TokenKind::Error`]; end of input before
    /// the closing quote is fatal.
    fn lex_string(&mut self, quote: char, start: u32) -> Result<TokenKind, LexError> {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.peek_char() {
                None => {
                    return Err(LexError::unterminated_string(self.span_from(start)));
                }
                Some('\n') => {
                    // Strings cannot span physical lines; leave the
                    // newline for trivia and recover.
                    let text = self.text_for(self.span_from(start));
                    return Ok(TokenKind::Error(EcoString::from(text)));
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(TokenKind::StringLiteral(EcoString::from(value)));
                }
                Some('\\') => {
                    self.advance();
                    self.lex_escape(&mut value);
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }
    }

    /// Decodes one escape sequence after the backslash has been consumed.
    ///
    /// Unknown escapes are preserved verbatim (backslash included) so no
    /// information is lost for diagnostics.
    fn lex_escape(&mut self, value: &mut String) {
        let Some(c) = self.peek_char() else {
            value.push('\\');
            return;
        };
        match c {
            'n' => {
                self.advance();
                value.push('\n');
            }
            'r' => {
                self.advance();
                value.push('\r');
            }
            't' => {
                self.advance();
                value.push('\t');
            }
            '\\' | '\'' | '"' => {
                self.advance();
                value.push(c);
            }
            'x' | 'X' => {
                self.advance();
                let mut code = 0u32;
                let mut digits = 0;
                while digits < 2 {
                    let Some(d) = self.peek_char().and_then(|c| c.to_digit(16)) else {
                        break;
                    };
                    code = code * 16 + d;
                    digits += 1;
                    self.advance();
                }
                if digits == 0 {
                    value.push('\\');
                    value.push(c);
                } else if let Some(decoded) = char::from_u32(code) {
                    value.push(decoded);
                }
            }
            '0'..='7' => {
                let mut code = 0u32;
                let mut digits = 0;
                while digits < 3 {
                    let Some(d) = self.peek_char().and_then(|c| c.to_digit(8)) else {
                        break;
                    };
                    code = code * 8 + d;
                    digits += 1;
                    self.advance();
                }
                if let Some(decoded) = char::from_u32(code) {
                    value.push(decoded);
                }
            }
            _ => {
                self.advance();
                value.push('\\');
                value.push(c);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("tokenize failed")
            .into_iter()
            .map(|t| t.kind().clone())
            .collect()
    }

    #[test]
    fn lexes_syntax_declaration() {
        assert_eq!(
            kinds("syntax = \"proto3\";"),
            vec![
                TokenKind::Identifier("syntax".into()),
                TokenKind::Equals,
                TokenKind::StringLiteral("proto3".into()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_are_plain_identifiers() {
        // `message` is contextual: it can name a field.
        assert_eq!(
            kinds("message message"),
            vec![
                TokenKind::Identifier("message".into()),
                TokenKind::Identifier("message".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_numeric_literal_forms_verbatim() {
        assert_eq!(
            kinds("123 0x5678 0X1234 010 0777"),
            vec![
                TokenKind::IntLiteral("123".into()),
                TokenKind::IntLiteral("0x5678".into()),
                TokenKind::IntLiteral("0X1234".into()),
                TokenKind::IntLiteral("010".into()),
                TokenKind::IntLiteral("0777".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_signs_as_separate_tokens() {
        assert_eq!(
            kinds("-1 +2"),
            vec![
                TokenKind::Minus,
                TokenKind::IntLiteral("1".into()),
                TokenKind::Plus,
                TokenKind::IntLiteral("2".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_floats() {
        assert_eq!(
            kinds("1.5 2e8 .25 3.0e-2"),
            vec![
                TokenKind::FloatLiteral("1.5".into()),
                TokenKind::FloatLiteral("2e8".into()),
                TokenKind::FloatLiteral(".25".into()),
                TokenKind::FloatLiteral("3.0e-2".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_single_and_double_quoted_strings() {
        assert_eq!(
            kinds("\"a\" 'b'"),
            vec![
                TokenKind::StringLiteral("a".into()),
                TokenKind::StringLiteral("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn decodes_string_escapes() {
        assert_eq!(
            kinds(r#""a\nb\t\"c\\" "\x41" "\101""#),
            vec![
                TokenKind::StringLiteral("a\nb\t\"c\\".into()),
                TokenKind::StringLiteral("A".into()),
                TokenKind::StringLiteral("A".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_become_leading_trivia() {
        let tokens = tokenize("// header\n/* block */ message").unwrap();
        let trivia = tokens[0].leading_trivia();
        assert!(
            trivia
                .iter()
                .any(|t| matches!(t, Trivia::LineComment(c) if c == "// header"))
        );
        assert!(
            trivia
                .iter()
                .any(|t| matches!(t, Trivia::BlockComment(c) if c == "/* block */"))
        );
    }

    #[test]
    fn unterminated_string_at_eof_is_fatal() {
        assert!(tokenize("option a = \"oops").is_err());
    }

    #[test]
    fn unterminated_block_comment_is_fatal() {
        assert!(tokenize("/* never closed").is_err());
    }

    #[test]
    fn string_broken_by_newline_recovers() {
        let tokens = tokenize("\"oops\nmessage M {}").unwrap();
        assert!(tokens[0].kind().is_error());
        // Lexing continued past the newline.
        assert!(
            tokens
                .iter()
                .any(|t| t.kind() == &TokenKind::Identifier("message".into()))
        );
    }

    #[test]
    fn unknown_character_recovers() {
        let tokens = tokenize("€ message").unwrap();
        assert!(tokens[0].kind().is_error());
        assert_eq!(tokens[1].kind(), &TokenKind::Identifier("message".into()));
    }

    #[test]
    fn tracks_line_and_character_positions() {
        let tokens = tokenize("message M {\n  int32 x = 1;\n}").unwrap();
        // `int32` starts at line 1, character 2.
        let int32 = tokens
            .iter()
            .find(|t| t.kind() == &TokenKind::Identifier("int32".into()))
            .unwrap();
        assert_eq!(int32.range().start, Position::new(1, 2));
        assert_eq!(int32.range().end, Position::new(1, 7));
    }

    #[test]
    fn dot_before_digit_is_float_elsewhere_separator() {
        assert_eq!(
            kinds("a.b .5"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Dot,
                TokenKind::Identifier("b".into()),
                TokenKind::FloatLiteral(".5".into()),
                TokenKind::Eof,
            ]
        );
    }
}
