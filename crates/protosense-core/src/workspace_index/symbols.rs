// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Symbol extraction: turning a parsed file into flat symbol records.
//!
//! Every named construct becomes a [`SymbolInfo`] keyed by its fully
//! qualified name (package-prefixed, no leading dot). The location
//! points at the *name* token, not the whole declaration, so go-to-
//! definition lands on the identifier.

use ecow::EcoString;

use crate::ast::{EnumDefinition, MessageDefinition, ProtoFile, ServiceDefinition};
use crate::source_analysis::Range;

/// What kind of construct a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// A message (including proto2 group bodies).
    Message,
    /// An enum.
    Enum,
    /// A service.
    Service,
    /// A field (regular, map, or extension).
    Field,
    /// A oneof block.
    Oneof,
    /// An enum value.
    EnumValue,
    /// An rpc method.
    Rpc,
}

/// A place in the workspace: document URI plus range within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// The document URI.
    pub uri: EcoString,
    /// The range within the document.
    pub range: Range,
}

/// One entry in the symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    /// The simple (unqualified) name.
    pub name: EcoString,
    /// The fully qualified name, package included, no leading dot.
    pub full_name: EcoString,
    /// What the symbol is.
    pub kind: SymbolKind,
    /// Where the symbol's name token is.
    pub location: Location,
    /// Fully qualified name of the enclosing container, if any.
    pub container_name: Option<EcoString>,
}

/// Extracts every symbol declared in `file`, in declaration order.
pub(super) fn extract_symbols(file: &ProtoFile) -> Vec<SymbolInfo> {
    let mut symbols = Vec::new();
    let package = file.package_name();

    for message in &file.messages {
        collect_message(message, package, None, &file.uri, &mut symbols);
    }
    for definition in &file.enums {
        collect_enum(definition, package, None, &file.uri, &mut symbols);
    }
    for service in &file.services {
        collect_service(service, package, &file.uri, &mut symbols);
    }
    for extend in &file.extends {
        // Extension fields are declared in the extending file's package
        // scope, not inside the target type.
        for field in &extend.fields {
            symbols.push(SymbolInfo {
                name: field.name.clone(),
                full_name: qualify(package, &field.name),
                kind: SymbolKind::Field,
                location: location(&file.uri, field.name_range),
                container_name: Some(extend.target.clone()),
            });
        }
    }
    symbols
}

fn qualify(prefix: &str, name: &str) -> EcoString {
    if prefix.is_empty() {
        name.into()
    } else {
        format!("{prefix}.{name}").into()
    }
}

fn location(uri: &EcoString, range: Range) -> Location {
    Location {
        uri: uri.clone(),
        range,
    }
}

fn collect_message(
    message: &MessageDefinition,
    prefix: &str,
    container: Option<&EcoString>,
    uri: &EcoString,
    symbols: &mut Vec<SymbolInfo>,
) {
    let full_name = qualify(prefix, &message.name);
    symbols.push(SymbolInfo {
        name: message.name.clone(),
        full_name: full_name.clone(),
        kind: SymbolKind::Message,
        location: location(uri, message.name_range),
        container_name: container.cloned(),
    });

    for field in &message.fields {
        symbols.push(SymbolInfo {
            name: field.name.clone(),
            full_name: qualify(&full_name, &field.name),
            kind: SymbolKind::Field,
            location: location(uri, field.name_range),
            container_name: Some(full_name.clone()),
        });
    }
    for map in &message.maps {
        symbols.push(SymbolInfo {
            name: map.name.clone(),
            full_name: qualify(&full_name, &map.name),
            kind: SymbolKind::Field,
            location: location(uri, map.name_range),
            container_name: Some(full_name.clone()),
        });
    }
    for oneof in &message.oneofs {
        symbols.push(SymbolInfo {
            name: oneof.name.clone(),
            full_name: qualify(&full_name, &oneof.name),
            kind: SymbolKind::Oneof,
            location: location(uri, oneof.name_range),
            container_name: Some(full_name.clone()),
        });
        // Oneof members live in the message's namespace, not the oneof's.
        for field in &oneof.fields {
            symbols.push(SymbolInfo {
                name: field.name.clone(),
                full_name: qualify(&full_name, &field.name),
                kind: SymbolKind::Field,
                location: location(uri, field.name_range),
                container_name: Some(full_name.clone()),
            });
        }
    }
    for group in &message.groups {
        // A group declares a nested message type named after it.
        collect_message(&group.body, &full_name, Some(&full_name), uri, symbols);
    }
    for nested in &message.messages {
        collect_message(nested, &full_name, Some(&full_name), uri, symbols);
    }
    for definition in &message.enums {
        collect_enum(definition, &full_name, Some(&full_name), uri, symbols);
    }
}

fn collect_enum(
    definition: &EnumDefinition,
    prefix: &str,
    container: Option<&EcoString>,
    uri: &EcoString,
    symbols: &mut Vec<SymbolInfo>,
) {
    let full_name = qualify(prefix, &definition.name);
    symbols.push(SymbolInfo {
        name: definition.name.clone(),
        full_name: full_name.clone(),
        kind: SymbolKind::Enum,
        location: location(uri, definition.name_range),
        container_name: container.cloned(),
    });
    for value in &definition.values {
        symbols.push(SymbolInfo {
            name: value.name.clone(),
            full_name: qualify(&full_name, &value.name),
            kind: SymbolKind::EnumValue,
            location: location(uri, value.name_range),
            container_name: Some(full_name.clone()),
        });
    }
}

fn collect_service(
    service: &ServiceDefinition,
    prefix: &str,
    uri: &EcoString,
    symbols: &mut Vec<SymbolInfo>,
) {
    let full_name = qualify(prefix, &service.name);
    symbols.push(SymbolInfo {
        name: service.name.clone(),
        full_name: full_name.clone(),
        kind: SymbolKind::Service,
        location: location(uri, service.name_range),
        container_name: None,
    });
    for rpc in &service.rpcs {
        symbols.push(SymbolInfo {
            name: rpc.name.clone(),
            full_name: qualify(&full_name, &rpc.name),
            kind: SymbolKind::Rpc,
            location: location(uri, rpc.name_range),
            container_name: Some(full_name.clone()),
        });
    }
}
