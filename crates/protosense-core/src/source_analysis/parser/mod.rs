// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for Protocol Buffers source text.
//!
//! This parser builds a [`ProtoFile`] AST from a stream of tokens. It is
//! designed for IDE use: input arrives character-by-character and is
//! malformed most of the time, so error recovery is mandatory.
//!
//! # Design Philosophy
//!
//! - **Error recovery is mandatory** — a local malformed construct is
//!   skipped to the next statement boundary (next `;` at the current
//!   nesting depth, or the matching `}`) and its siblings keep parsing
//! - **Multiple errors** — all recoverable errors are reported as
//!   [`Diagnostic`]s, never as `Err`
//! - **Fatal only when unavoidable** — nesting beyond
//!   [`MAX_NESTING_DEPTH`] and unterminated strings/comments at end of
//!   input abort with [`ParseError`]; callers substitute a previous good
//!   AST rather than crashing
//! - **Dialect union** — proto2, proto3, and editions constructs all
//!   parse under any dialect; per-dialect legality is left to the
//!   diagnostics collaborator
//! - **Precise ranges** — every node records its full range, plus
//!   narrower name/type ranges for rename and hover
//!
//! # Usage
//!
//! ```
//! use protosense_core::source_analysis::parse;
//!
//! let (file, diagnostics) = parse("syntax = \"proto3\";", "file:///a.proto").unwrap();
//! assert!(diagnostics.is_empty());
//! assert_eq!(file.syntax.unwrap().version, "proto3");
//! ```

use ecow::EcoString;

use crate::ast::{
    EditionDeclaration, ImportDeclaration, ImportModifier, PackageDeclaration, ProtoFile,
    SyntaxDeclaration,
};
use crate::source_analysis::{
    ParseError, Range, Token, TokenKind, Trivia, lexer::tokenize,
};

// Submodules with additional impl blocks for Parser
mod declarations;
mod options;


/// Maximum nesting depth before the parser bails out.
///
/// Prevents stack overflow on deeply nested input (e.g. thousands of
/// nested message bodies). Each level uses several stack frames through
/// the parser call chain. 64 is generous for any realistic schema.
///
/// As a second line of defence, `stacker::maybe_grow` is used at the
/// recursive entry point so the stack is extended on the heap if needed.
const MAX_NESTING_DEPTH: usize = 64;

/// Parses a document into a [`ProtoFile`] plus recoverable diagnostics.
///
/// This is the single public entry point. It is pure: no state is
/// shared between calls, so different documents may be parsed
/// concurrently before results are handed to the (serialized) index.
///
/// # Errors
///
/// Returns [`ParseError`] only for fatal conditions: nesting beyond
/// [`MAX_NESTING_DEPTH`], or a string literal / block comment left open
/// at end of input. Every other malformed construct is recovered from
/// and reported in the returned diagnostics.
///
/// # Examples
///
/// ```
/// use protosense_core::source_analysis::parse;
///
/// let source = "syntax = \"proto3\";\nmessage User { int32 id = 1; }";
/// let (file, diagnostics) = parse(source, "file:///user.proto").unwrap();
/// assert!(diagnostics.is_empty());
/// assert_eq!(file.messages[0].name, "User");
/// ```
pub fn parse(
    source: &str,
    uri: impl Into<EcoString>,
) -> Result<(ProtoFile, Vec<Diagnostic>), ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(source, tokens);
    let file = parser.parse_file(uri.into())?;
    Ok((file, parser.diagnostics))
}

/// A recoverable diagnostic (error, warning, or hint).
///
/// Severity interpretation and user-facing presentation belong to the
/// diagnostics collaborator; the parser only records what it saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: Severity,
    /// The error message.
    pub message: EcoString,
    /// The source location.
    pub range: Range,
    /// Optional hint for how to fix the issue.
    pub hint: Option<EcoString>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    #[must_use]
    pub fn error(message: impl Into<EcoString>, range: Range) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            range,
            hint: None,
        }
    }

    /// Creates a new warning diagnostic.
    #[must_use]
    pub fn warning(message: impl Into<EcoString>, range: Range) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            range,
            hint: None,
        }
    }

    /// Attaches a fix-it hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<EcoString>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A syntax error the parser recovered from.
    Error,
    /// A warning that should be addressed.
    Warning,
    /// A hint or informational note.
    Hint,
}

/// The parser state.
pub(super) struct Parser<'src> {
    /// The original source text (for raw aggregate-value slicing).
    source: &'src str,
    /// The tokens being parsed.
    tokens: Vec<Token>,
    /// Current token index.
    current: usize,
    /// Accumulated diagnostics.
    diagnostics: Vec<Diagnostic>,
    /// Current nesting depth (guards against stack overflow).
    nesting_depth: usize,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given tokens.
    fn new(source: &'src str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            current: 0,
            diagnostics: Vec::new(),
            nesting_depth: 0,
        }
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Returns the current token.
    pub(super) fn current_token(&self) -> &Token {
        if self.current < self.tokens.len() {
            &self.tokens[self.current]
        } else {
            // Past the end of the stream: fall back to the EOF token
            // rather than panicking.
            self.tokens
                .last()
                .expect("parser has no tokens; expected at least an EOF token")
        }
    }

    /// Returns the current token kind.
    pub(super) fn current_kind(&self) -> &TokenKind {
        self.current_token().kind()
    }

    /// Peeks `n` tokens ahead (0 is the current token).
    pub(super) fn peek_at(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.current + n).map(Token::kind)
    }

    /// Checks if we're at the end of input.
    pub(super) fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Advances to the next token and returns the previous one.
    pub(super) fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.tokens[self.current.saturating_sub(1)].clone()
    }

    /// Checks if the current token matches the given kind (by
    /// discriminant, ignoring carried text).
    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    /// Consumes the current token if it matches the given kind.
    pub(super) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects the current token to match, advancing if it does.
    ///
    /// If the token doesn't match, reports an error and returns `None`.
    pub(super) fn expect(&mut self, kind: &TokenKind, message: &str) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.error(message);
            None
        }
    }

    /// Returns `true` if the current token is the identifier `keyword`.
    ///
    /// Protobuf keywords are contextual, so this is a text comparison on
    /// identifier tokens, not a token kind.
    pub(super) fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.current_kind(), TokenKind::Identifier(s) if s == keyword)
    }

    /// Consumes the current token if it is the identifier `keyword`.
    pub(super) fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects an identifier, returning its text and range.
    pub(super) fn expect_identifier(&mut self, message: &str) -> Option<(EcoString, Range)> {
        if let TokenKind::Identifier(name) = self.current_kind() {
            let name = name.clone();
            let range = self.current_token().range();
            self.advance();
            Some((name, range))
        } else {
            self.error(message);
            None
        }
    }

    /// The range of the most recently consumed token.
    pub(super) fn prev_range(&self) -> Range {
        if self.current == 0 {
            self.current_token().range()
        } else {
            self.tokens[self.current - 1].range()
        }
    }

    // ========================================================================
    // Error Handling & Recovery
    // ========================================================================

    /// Reports an error at the current token.
    pub(super) fn error(&mut self, message: impl Into<EcoString>) {
        let range = self.current_token().range();
        self.diagnostics.push(Diagnostic::error(message, range));
    }

    /// Synchronizes to the next statement boundary.
    ///
    /// Skips forward to the next `;` at the current nesting depth
    /// (consuming it), or stops before a `}` that closes the enclosing
    /// body, so the caller's loop regains control with the rest of the
    /// document intact.
    pub(super) fn synchronize(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.current_kind().clone() {
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::LeftBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RightBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        return;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Increments the nesting depth, failing fatally past the limit.
    ///
    /// Call [`leave_nesting`](Self::leave_nesting) on every exit path
    /// when this returns `Ok(())`.
    pub(super) fn enter_nesting(&mut self) -> Result<(), ParseError> {
        self.nesting_depth += 1;
        if self.nesting_depth > MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
                span: self.current_token().span(),
            });
        }
        Ok(())
    }

    /// Decrements the nesting depth (pair with [`enter_nesting`](Self::enter_nesting)).
    pub(super) fn leave_nesting(&mut self) {
        debug_assert!(
            self.nesting_depth > 0,
            "leave_nesting called without matching enter_nesting"
        );
        self.nesting_depth = self.nesting_depth.saturating_sub(1);
    }

    // ========================================================================
    // Comment Attachment
    // ========================================================================

    /// Collects the comment block immediately preceding the current
    /// token, stripped of delimiters and joined with newlines.
    ///
    /// A blank line (two or more newlines) between a comment and the
    /// token breaks attachment, so only the last contiguous block is
    /// returned.
    pub(super) fn collect_comment(&self) -> Option<EcoString> {
        let mut lines: Vec<String> = Vec::new();
        for trivia in self.current_token().leading_trivia() {
            match trivia {
                Trivia::LineComment(text) => {
                    let text = text.as_str();
                    let stripped = text
                        .strip_prefix("// ")
                        .unwrap_or_else(|| text.strip_prefix("//").unwrap_or(text));
                    lines.push(stripped.to_string());
                }
                Trivia::BlockComment(text) => {
                    let text = text.as_str();
                    let stripped = text
                        .strip_prefix("/*")
                        .and_then(|t| t.strip_suffix("*/"))
                        .unwrap_or(text)
                        .trim();
                    lines.push(stripped.to_string());
                }
                Trivia::Whitespace(ws) => {
                    // A blank line breaks attachment.
                    if ws.chars().filter(|&c| c == '\n').count() > 1 {
                        lines.clear();
                    }
                }
            }
        }
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n").into())
        }
    }

    /// Slices the raw source text covered by the given byte offsets.
    pub(super) fn source_slice(&self, start: u32, end: u32) -> &'src str {
        self.source.get(start as usize..end as usize).unwrap_or("")
    }

    // ========================================================================
    // File-Level Parsing
    // ========================================================================

    /// Parses a complete document.
    fn parse_file(&mut self, uri: EcoString) -> Result<ProtoFile, ParseError> {
        let mut file = ProtoFile::new(uri);
        let start = self.current_token().range();

        while !self.is_at_end() {
            match self.current_kind().clone() {
                TokenKind::Identifier(word) => match word.as_str() {
                    "syntax" => {
                        if let Some(decl) = self.parse_syntax() {
                            // First declaration wins; a duplicate is a
                            // diagnostics concern, not a parse failure.
                            file.syntax.get_or_insert(decl);
                        }
                    }
                    "edition" => {
                        if let Some(decl) = self.parse_edition() {
                            file.edition.get_or_insert(decl);
                        }
                    }
                    "package" => {
                        if let Some(decl) = self.parse_package() {
                            file.package.get_or_insert(decl);
                        }
                    }
                    "import" => {
                        if let Some(decl) = self.parse_import() {
                            file.imports.push(decl);
                        }
                    }
                    "option" => {
                        if let Some(stmt) = self.parse_option_statement() {
                            file.options.push(stmt);
                        }
                    }
                    "message" => {
                        if let Some(message) = self.parse_message()? {
                            file.messages.push(message);
                        }
                    }
                    "enum" => {
                        if let Some(definition) = self.parse_enum() {
                            file.enums.push(definition);
                        }
                    }
                    "service" => {
                        if let Some(service) = self.parse_service() {
                            file.services.push(service);
                        }
                    }
                    "extend" => {
                        if let Some(extend) = self.parse_extend()? {
                            file.extends.push(extend);
                        }
                    }
                    _ => {
                        self.error(format!("unexpected '{word}'; expected a top-level declaration"));
                        self.synchronize();
                    }
                },
                // Stray empty statement.
                TokenKind::Semicolon => {
                    self.advance();
                }
                // An unmatched `}` must be consumed here: synchronize()
                // stops before closing braces so enclosing bodies can
                // see them, and at top level nothing else would.
                TokenKind::RightBrace => {
                    self.error("unmatched '}'");
                    self.advance();
                }
                _ => {
                    self.error(format!(
                        "unexpected '{}'; expected a top-level declaration",
                        self.current_kind()
                    ));
                    self.synchronize();
                }
            }
        }

        file.range = start.merge(self.prev_range());
        Ok(file)
    }

    /// Parses `syntax = "proto2"|"proto3";`
    fn parse_syntax(&mut self) -> Option<SyntaxDeclaration> {
        let start = self.current_token().range();
        self.advance(); // syntax

        if self.expect(&TokenKind::Equals, "expected '=' after 'syntax'").is_none() {
            self.synchronize();
            return None;
        }
        let Some((version, version_range)) = self.parse_string_value() else {
            self.error("expected a version string, e.g. \"proto3\"");
            self.synchronize();
            return None;
        };
        self.expect(&TokenKind::Semicolon, "expected ';' after syntax declaration");

        Some(SyntaxDeclaration {
            version,
            version_range,
            range: start.merge(self.prev_range()),
        })
    }

    /// Parses `edition = "2023";`
    fn parse_edition(&mut self) -> Option<EditionDeclaration> {
        let start = self.current_token().range();
        self.advance(); // edition

        if self.expect(&TokenKind::Equals, "expected '=' after 'edition'").is_none() {
            self.synchronize();
            return None;
        }
        let Some((edition, edition_range)) = self.parse_string_value() else {
            self.error("expected an edition string, e.g. \"2023\"");
            self.synchronize();
            return None;
        };
        self.expect(&TokenKind::Semicolon, "expected ';' after edition declaration");

        Some(EditionDeclaration {
            edition,
            edition_range,
            range: start.merge(self.prev_range()),
        })
    }

    /// Parses `package a.b.c;`
    fn parse_package(&mut self) -> Option<PackageDeclaration> {
        let start = self.current_token().range();
        self.advance(); // package

        let Some((first, first_range)) = self.expect_identifier("expected a package name") else {
            self.synchronize();
            return None;
        };
        let mut name = String::from(first.as_str());
        let mut name_range = first_range;
        while self.match_token(&TokenKind::Dot) {
            let Some((segment, segment_range)) =
                self.expect_identifier("expected an identifier after '.'")
            else {
                break;
            };
            name.push('.');
            name.push_str(&segment);
            name_range = name_range.merge(segment_range);
        }
        self.expect(&TokenKind::Semicolon, "expected ';' after package declaration");

        Some(PackageDeclaration {
            name: name.into(),
            name_range,
            range: start.merge(self.prev_range()),
        })
    }

    /// Parses `import ["weak"|"public"] "path";`
    fn parse_import(&mut self) -> Option<ImportDeclaration> {
        let start = self.current_token().range();
        self.advance(); // import

        let modifier = if self.match_keyword("weak") {
            Some(ImportModifier::Weak)
        } else if self.match_keyword("public") {
            Some(ImportModifier::Public)
        } else {
            None
        };

        let Some((path, path_range)) = self.parse_string_value() else {
            self.error("expected an import path string");
            self.synchronize();
            return None;
        };
        self.expect(&TokenKind::Semicolon, "expected ';' after import");

        Some(ImportDeclaration {
            modifier,
            path,
            path_range,
            range: start.merge(self.prev_range()),
        })
    }

    /// Parses a possibly-qualified type name: `Foo`, `foo.bar.Baz`,
    /// `.absolute.Name`.
    ///
    /// Returns the name as written and the range of the whole dotted
    /// token run (the rename/hover target for type references).
    pub(super) fn parse_type_name(&mut self, message: &str) -> Option<(EcoString, Range)> {
        let mut name = String::new();
        let mut range: Option<Range> = None;

        if self.check(&TokenKind::Dot) {
            let dot = self.advance();
            name.push('.');
            range = Some(dot.range());
        }

        let Some((first, first_range)) = self.expect_identifier(message) else {
            return None;
        };
        name.push_str(&first);
        range = Some(range.map_or(first_range, |r| r.merge(first_range)));

        while self.check(&TokenKind::Dot)
            && matches!(self.peek_at(1), Some(TokenKind::Identifier(_)))
        {
            self.advance(); // .
            let Some((segment, segment_range)) =
                self.expect_identifier("expected an identifier after '.'")
            else {
                break;
            };
            name.push('.');
            name.push_str(&segment);
            range = Some(range.map_or(segment_range, |r| r.merge(segment_range)));
        }

        Some((name.into(), range.unwrap_or_default()))
    }
}
