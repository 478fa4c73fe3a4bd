// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Core parsing and semantic analysis for Protocol Buffers schemas.
//!
//! This crate is the engine behind editor tooling for `.proto` files:
//! a hand-written lexer and recursive descent parser with error
//! recovery, a pure-data AST with precise source ranges, and a
//! cross-file workspace index providing symbol lookup, type
//! resolution, and the import graph.
//!
//! # Architecture
//!
//! ```text
//! source text
//!     |
//!     v
//! [source_analysis]  tokenize() -> parse() -> (ProtoFile, Vec<Diagnostic>)
//!     |
//!     v
//! [workspace_index]  update_file() -> symbols, resolve_type(), references
//! ```
//!
//! Parsing is pure and per-document; the [`WorkspaceIndex`] owns all
//! cross-file state and is updated wholesale, one document at a time.
//! All three protobuf dialects (proto2, proto3, editions) parse under a
//! single permissive grammar; dialect legality is left to a diagnostics
//! layer built on top of this crate.
//!
//! # Example
//!
//! ```
//! use protosense_core::source_analysis::parse;
//! use protosense_core::workspace_index::WorkspaceIndex;
//!
//! let source = "package demo;\nmessage Greeting { string text = 1; }";
//! let (file, diagnostics) = parse(source, "file:///demo.proto").unwrap();
//! assert!(diagnostics.is_empty());
//!
//! let mut index = WorkspaceIndex::new();
//! index.update_file(file);
//! let info = index
//!     .resolve_type("Greeting", "file:///demo.proto", "demo")
//!     .unwrap();
//! assert_eq!(info.full_name, "demo.Greeting");
//! ```

pub mod ast;
pub mod builtins;
pub mod source_analysis;
pub mod workspace_index;

pub use ast::ProtoFile;
pub use source_analysis::{Diagnostic, ParseError, Position, Range, Severity, parse};
pub use workspace_index::{Location, SymbolInfo, SymbolKind, WorkspaceIndex};
