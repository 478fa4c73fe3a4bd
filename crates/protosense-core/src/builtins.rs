// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Built-in type names and protocol constants.
//!
//! These values are part of the wire-compatible contract shared with
//! every consumer (diagnostics, completion, renumbering): the scalar
//! type set, the subset of scalars eligible as map keys, and the field
//! number bounds.

/// The 15 built-in scalar type names.
///
/// A type reference matching one of these never resolves to a symbol;
/// `resolve_type` returns `None` for them immediately.
pub const SCALAR_TYPES: [&str; 15] = [
    "double", "float", "int32", "int64", "uint32", "uint64", "sint32", "sint64", "fixed32",
    "fixed64", "sfixed32", "sfixed64", "bool", "string", "bytes",
];

/// The 12 scalar types eligible as map keys.
///
/// Excludes `float`, `double`, and `bytes` (and all message/enum types).
pub const MAP_KEY_TYPES: [&str; 12] = [
    "int32", "int64", "uint32", "uint64", "sint32", "sint64", "fixed32", "fixed64", "sfixed32",
    "sfixed64", "bool", "string",
];

/// The smallest legal field number.
pub const FIELD_NUMBER_MIN: i64 = 1;

/// The largest legal field number (2^29 - 1).
///
/// Also the value of the `max` sentinel in reserved and extension
/// ranges.
pub const FIELD_NUMBER_MAX: i64 = 536_870_911;

/// Start of the field-number band reserved by the protocol itself.
pub const RESERVED_NUMBER_MIN: i64 = 19_000;

/// End (inclusive) of the protocol-reserved field-number band.
pub const RESERVED_NUMBER_MAX: i64 = 19_999;

/// Returns `true` if `name` is a built-in scalar type.
#[must_use]
pub fn is_scalar_type(name: &str) -> bool {
    SCALAR_TYPES.contains(&name)
}

/// Returns `true` if `name` is a scalar type eligible as a map key.
#[must_use]
pub fn is_map_key_type(name: &str) -> bool {
    MAP_KEY_TYPES.contains(&name)
}
