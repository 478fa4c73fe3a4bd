// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Abstract Syntax Tree (AST) definitions for Protocol Buffers.
//!
//! The AST represents a single `.proto` document after parsing. Every
//! node carries a line/character [`Range`]; named constructs carry an
//! additional `name_range`, and typed constructs (fields, rpcs) carry a
//! range for the type token alone — rename and hover operate on those
//! narrower sub-spans, not the whole statement.
//!
//! # Design Philosophy
//!
//! - **Pure data** — no behavior beyond small accessors; all analysis
//!   lives in the workspace index
//! - **Owned tree** — no parent back-references; traversals pass context
//!   down explicitly
//! - **Permissive union of dialects** — proto2, proto3, and editions
//!   constructs all appear here. Dialect legality (e.g. `required`
//!   under editions) is a diagnostics concern, recorded faithfully but
//!   never rejected by the parser
//! - **Immutable after parse** — a [`ProtoFile`] is never mutated once
//!   `parse()` returns; the index replaces files wholesale

use ecow::EcoString;

use crate::source_analysis::Range;

/// Root node: one parsed `.proto` document.
///
/// Constructed once per `parse()` call and owned exclusively by the
/// caller (typically handed to the workspace index, which replaces it
/// wholesale on each update). The `syntax` and `edition` declarations
/// are mutually exclusive in a valid document, but the parser records
/// whatever is present — flagging the conflict is diagnostics' job.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProtoFile {
    /// The document URI this file was parsed from.
    pub uri: EcoString,
    /// The `syntax = "proto2"|"proto3";` declaration, if present.
    pub syntax: Option<SyntaxDeclaration>,
    /// The `edition = "...";` declaration, if present.
    pub edition: Option<EditionDeclaration>,
    /// The `package a.b.c;` declaration, if present.
    pub package: Option<PackageDeclaration>,
    /// Imports, in document order.
    pub imports: Vec<ImportDeclaration>,
    /// File-level options, in document order.
    pub options: Vec<OptionStatement>,
    /// Top-level messages, in document order.
    pub messages: Vec<MessageDefinition>,
    /// Top-level enums, in document order.
    pub enums: Vec<EnumDefinition>,
    /// Services, in document order.
    pub services: Vec<ServiceDefinition>,
    /// Top-level extend blocks, in document order.
    pub extends: Vec<ExtendDefinition>,
    /// The whole document's range.
    pub range: Range,
}

impl ProtoFile {
    /// Creates an empty file for the given URI.
    #[must_use]
    pub fn new(uri: impl Into<EcoString>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    /// Returns the declared package name, or `""` when absent.
    #[must_use]
    pub fn package_name(&self) -> &str {
        self.package.as_ref().map_or("", |p| p.name.as_str())
    }
}

/// A `syntax = "proto2"|"proto3";` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxDeclaration {
    /// The declared version string, e.g. `proto3`.
    pub version: EcoString,
    /// Range of the version string literal.
    pub version_range: Range,
    /// Range of the whole statement.
    pub range: Range,
}

/// An `edition = "2023";` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditionDeclaration {
    /// The declared edition string, e.g. `2023`.
    pub edition: EcoString,
    /// Range of the edition string literal.
    pub edition_range: Range,
    /// Range of the whole statement.
    pub range: Range,
}

/// A `package a.b.c;` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDeclaration {
    /// The dotted package name.
    pub name: EcoString,
    /// Range of the dotted name only.
    pub name_range: Range,
    /// Range of the whole statement.
    pub range: Range,
}

/// Modifier on an import: `import weak|public "path";`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportModifier {
    /// `import weak "...";`
    Weak,
    /// `import public "...";` — re-exports the import to dependents.
    Public,
}

/// An `import "path";` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDeclaration {
    /// Optional `weak` / `public` modifier.
    pub modifier: Option<ImportModifier>,
    /// The import path as written (forward slashes).
    pub path: EcoString,
    /// Range of the path string literal.
    pub path_range: Range,
    /// Range of the whole statement.
    pub range: Range,
}

/// The value of an option, as a tagged union.
///
/// Aggregate (message-typed) option bodies keep the raw text of the
/// `{ ... }` content; consumers that care re-parse it.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// A string value. Adjacent literals are already concatenated, and
    /// bare-identifier values (e.g. `SPEED`) are recorded here too.
    String(EcoString),
    /// A numeric value, including `inf` and `nan`.
    Number(f64),
    /// `true` or `false`.
    Bool(bool),
    /// The raw text between the braces of an aggregate value.
    Aggregate(EcoString),
}

impl OptionValue {
    /// Returns the string content, if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric content, if this is a number value.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// An `option name = value;` statement (file, message, enum, service,
/// or rpc level).
///
/// The name may be dotted (`features.field_presence`) or carry
/// parenthesized extension segments (`(buf.validate.field).string.email`);
/// it is recorded verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionStatement {
    /// The option name as written.
    pub name: EcoString,
    /// Range of the name only.
    pub name_range: Range,
    /// The option value.
    pub value: OptionValue,
    /// Range of the whole statement.
    pub range: Range,
}

/// A single `name = value` entry inside `[...]` field options.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOption {
    /// The option name as written (may be parenthesized/dotted).
    pub name: EcoString,
    /// The option value.
    pub value: OptionValue,
    /// Range of this entry.
    pub range: Range,
}

/// Field label: `optional`, `required`, or `repeated`.
///
/// Parsed under every dialect; legality per dialect is a diagnostics
/// concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldModifier {
    /// `optional` (proto2, and proto3 explicit presence).
    Optional,
    /// `required` (proto2 only, but recorded under any dialect).
    Required,
    /// `repeated`.
    Repeated,
}

/// A regular field: `[modifier] Type name = number [options];`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    /// Optional label.
    pub modifier: Option<FieldModifier>,
    /// The type as written, possibly dotted or leading-dot qualified.
    pub field_type: EcoString,
    /// Range of the type token(s) only — hover/rename target.
    pub field_type_range: Range,
    /// The field name (bare identifier).
    pub name: EcoString,
    /// Range of the name only.
    pub name_range: Range,
    /// The field number, exactly as the literal's mathematical value.
    pub number: i64,
    /// Options from the `[...]` list, if any.
    pub options: Vec<FieldOption>,
    /// Comment block attached to this field, if any.
    pub comment: Option<EcoString>,
    /// Range of the whole field, including the trailing `;`.
    pub range: Range,
}

/// A map field: `map<Key, Value> name = number [options];`
#[derive(Debug, Clone, PartialEq)]
pub struct MapFieldDefinition {
    /// The key type (must be one of the map-key-eligible scalars for a
    /// valid document; recorded verbatim regardless).
    pub key_type: EcoString,
    /// The value type, possibly a named message/enum type.
    pub value_type: EcoString,
    /// Range of the value type token only.
    pub value_type_range: Range,
    /// The field name.
    pub name: EcoString,
    /// Range of the name only.
    pub name_range: Range,
    /// The field number.
    pub number: i64,
    /// Options from the `[...]` list, if any.
    pub options: Vec<FieldOption>,
    /// Comment block attached to this field, if any.
    pub comment: Option<EcoString>,
    /// Range of the whole field.
    pub range: Range,
}

/// A proto2 group field: `[modifier] group Name = number { ... }`
///
/// A group declares both a field and a nested message type; the body is
/// recorded as a message definition named after the group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFieldDefinition {
    /// Optional label.
    pub modifier: Option<FieldModifier>,
    /// The group name (also the nested type name; capitalized by
    /// convention).
    pub name: EcoString,
    /// Range of the name only.
    pub name_range: Range,
    /// The field number.
    pub number: i64,
    /// The group body, as a message definition sharing the group name.
    pub body: MessageDefinition,
    /// Range of the whole group.
    pub range: Range,
}

/// A `oneof name { fields }` block.
///
/// Fields inside a oneof share the parent message's field-number space;
/// the oneof itself introduces no new number namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct OneofDefinition {
    /// The oneof name.
    pub name: EcoString,
    /// Range of the name only.
    pub name_range: Range,
    /// The member fields.
    pub fields: Vec<FieldDefinition>,
    /// Options declared inside the oneof.
    pub options: Vec<OptionStatement>,
    /// Range of the whole block.
    pub range: Range,
}

/// One inclusive numeric range in a `reserved` or `extensions`
/// statement. A single number `N` is recorded as `N..N`; `to max` uses
/// [`FIELD_NUMBER_MAX`](crate::builtins::FIELD_NUMBER_MAX) as the end
/// sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReservedRange {
    /// The first reserved number (inclusive).
    pub start: i64,
    /// The last reserved number (inclusive).
    pub end: i64,
}

/// A `reserved ...;` statement: either field names or numeric ranges.
///
/// Typical use populates exactly one of the two lists, but the type
/// does not forbid both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReservedStatement {
    /// Reserved field names.
    pub names: Vec<EcoString>,
    /// Reserved numeric ranges (inclusive).
    pub ranges: Vec<ReservedRange>,
    /// Range of the whole statement.
    pub range: Range,
}

/// An `extensions N to M;` statement (proto2).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtensionRangeStatement {
    /// Extension number ranges (inclusive).
    pub ranges: Vec<ReservedRange>,
    /// Range of the whole statement.
    pub range: Range,
}

/// A `message Name { ... }` definition.
///
/// Nested containers form a tree rooted at file scope; `name` is always
/// a bare identifier (qualification happens in the symbol table).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageDefinition {
    /// The message name (bare identifier, no dots).
    pub name: EcoString,
    /// Range of the name only.
    pub name_range: Range,
    /// Regular fields, in document order.
    pub fields: Vec<FieldDefinition>,
    /// Map fields, in document order.
    pub maps: Vec<MapFieldDefinition>,
    /// Proto2 groups, in document order.
    pub groups: Vec<GroupFieldDefinition>,
    /// Oneof blocks, in document order.
    pub oneofs: Vec<OneofDefinition>,
    /// Nested messages.
    pub messages: Vec<MessageDefinition>,
    /// Nested enums.
    pub enums: Vec<EnumDefinition>,
    /// Message-level options.
    pub options: Vec<OptionStatement>,
    /// Reserved statements.
    pub reserved: Vec<ReservedStatement>,
    /// Extension range statements.
    pub extensions: Vec<ExtensionRangeStatement>,
    /// Nested extend blocks (proto2).
    pub extends: Vec<ExtendDefinition>,
    /// Comment block attached to this message, if any.
    pub comment: Option<EcoString>,
    /// Range of the whole definition, including the closing `}`.
    pub range: Range,
}

/// An `enum Name { ... }` definition.
///
/// Values may repeat a number only under `allow_alias`; the parser
/// records whatever is written and leaves enforcement to diagnostics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumDefinition {
    /// The enum name.
    pub name: EcoString,
    /// Range of the name only.
    pub name_range: Range,
    /// The enum values, in document order.
    pub values: Vec<EnumValue>,
    /// Enum-level options.
    pub options: Vec<OptionStatement>,
    /// Reserved statements.
    pub reserved: Vec<ReservedStatement>,
    /// Comment block attached to this enum, if any.
    pub comment: Option<EcoString>,
    /// Range of the whole definition.
    pub range: Range,
}

/// One `NAME = number [options];` enum value.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    /// The value name.
    pub name: EcoString,
    /// Range of the name only.
    pub name_range: Range,
    /// The value number (may be negative, sign-prefixed literals
    /// included).
    pub number: i64,
    /// Options from the `[...]` list, if any.
    pub options: Vec<FieldOption>,
    /// Comment block attached to this value, if any.
    pub comment: Option<EcoString>,
    /// Range of the whole entry.
    pub range: Range,
}

/// A `service Name { ... }` definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceDefinition {
    /// The service name.
    pub name: EcoString,
    /// Range of the name only.
    pub name_range: Range,
    /// The rpc methods, in document order.
    pub rpcs: Vec<RpcDefinition>,
    /// Service-level options.
    pub options: Vec<OptionStatement>,
    /// Comment block attached to this service, if any.
    pub comment: Option<EcoString>,
    /// Range of the whole definition.
    pub range: Range,
}

/// An `rpc Method(Req) returns (Resp);` definition.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcDefinition {
    /// The method name.
    pub name: EcoString,
    /// Range of the name only.
    pub name_range: Range,
    /// The request type as written.
    pub request_type: EcoString,
    /// Range of the request type token only.
    pub request_type_range: Range,
    /// Whether the request is `stream`ed.
    pub request_streaming: bool,
    /// The response type as written.
    pub response_type: EcoString,
    /// Range of the response type token only.
    pub response_type_range: Range,
    /// Whether the response is `stream`ed.
    pub response_streaming: bool,
    /// Options from the optional `{ ... }` body.
    pub options: Vec<OptionStatement>,
    /// Comment block attached to this rpc, if any.
    pub comment: Option<EcoString>,
    /// Range of the whole definition.
    pub range: Range,
}

/// An `extend Type { fields }` block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtendDefinition {
    /// The extended type as written (possibly dotted).
    pub target: EcoString,
    /// Range of the target type token only.
    pub target_range: Range,
    /// The extension fields.
    pub fields: Vec<FieldDefinition>,
    /// Proto2 groups declared in the extend block.
    pub groups: Vec<GroupFieldDefinition>,
    /// Range of the whole block.
    pub range: Range,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proto_file_starts_empty() {
        let file = ProtoFile::new("file:///a.proto");
        assert_eq!(file.uri, "file:///a.proto");
        assert!(file.syntax.is_none());
        assert!(file.messages.is_empty());
        assert!(file.enums.is_empty());
        assert!(file.services.is_empty());
        assert_eq!(file.package_name(), "");
    }

    #[test]
    fn package_name_reads_declaration() {
        let mut file = ProtoFile::new("file:///a.proto");
        file.package = Some(PackageDeclaration {
            name: "com.example".into(),
            name_range: Range::default(),
            range: Range::default(),
        });
        assert_eq!(file.package_name(), "com.example");
    }

    #[test]
    fn option_value_accessors() {
        assert_eq!(OptionValue::String("x".into()).as_str(), Some("x"));
        assert_eq!(OptionValue::Bool(true).as_str(), None);
        assert_eq!(OptionValue::Number(2.5).as_number(), Some(2.5));
        assert_eq!(OptionValue::Aggregate("a: 1".into()).as_number(), None);
    }

    #[test]
    fn reserved_statement_may_hold_names_or_ranges() {
        let stmt = ReservedStatement {
            names: vec!["old_field".into()],
            ranges: vec![ReservedRange { start: 2, end: 2 }],
            range: Range::default(),
        };
        assert_eq!(stmt.names.len(), 1);
        assert_eq!(stmt.ranges[0], ReservedRange { start: 2, end: 2 });
    }
}
