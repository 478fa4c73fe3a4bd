// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source analysis: lexing and parsing of Protocol Buffers documents.
//!
//! The pipeline is hand-written end to end: [`tokenize`] turns source
//! text into [`Token`]s (keywords stay contextual identifiers),
//! [`parse`] builds a [`ProtoFile`](crate::ast::ProtoFile) with error
//! recovery, reporting recoverable problems as [`Diagnostic`]s and
//! reserving [`ParseError`] for the few fatal conditions.

mod error;
mod lexer;
mod parser;
mod span;
mod token;

pub use error::{LexError, LexErrorKind, ParseError};
pub use lexer::{Lexer, tokenize};
pub use parser::{Diagnostic, Severity, parse};
pub use span::{Position, Range, Span};
pub use token::{Token, TokenKind, Trivia};
