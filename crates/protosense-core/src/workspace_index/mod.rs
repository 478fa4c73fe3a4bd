// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Cross-file workspace index: symbol table, type resolution, and the
//! import graph.
//!
//! The index holds the latest parsed [`ProtoFile`] per document URI and
//! a flat symbol table derived from them. Editor features (go-to-
//! definition, completion, references) are all lookups against this
//! state.
//!
//! # Design Principles
//!
//! - **Explicitly constructed** — no global instance; the process entry
//!   point owns one index and passes it to every consumer, so tests get
//!   full isolation
//! - **Replace wholesale** — [`update_file`](WorkspaceIndex::update_file)
//!   drops every fact derived from a document and re-derives them; no
//!   incremental diffing, no stale partial state
//! - **Serialized mutation** — interior caching uses [`RefCell`], which
//!   makes the index `!Sync`; concurrent *parsing* is fine (the parser
//!   is pure), but index access is single-threaded by construction
//! - **Resolution degrades gracefully** — unresolved imports and types
//!   are `None`, never errors; the workspace is incomplete most of the
//!   time while the user types

mod imports;
mod symbols;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use ecow::EcoString;
use tracing::{debug, trace};

use crate::ast::{MessageDefinition, ProtoFile};
use crate::builtins::is_scalar_type;
use crate::source_analysis::Range;

pub use symbols::{Location, SymbolInfo, SymbolKind};

use symbols::extract_symbols;

/// The workspace index.
///
/// One instance per workspace root. Mutation happens only through
/// [`update_file`](Self::update_file) and
/// [`remove_file`](Self::remove_file); every other method is a read.
#[derive(Debug, Default)]
pub struct WorkspaceIndex {
    /// Latest parsed file per document URI.
    files: HashMap<EcoString, ProtoFile>,
    /// Symbol table keyed by fully qualified name.
    symbols: HashMap<EcoString, SymbolInfo>,
    /// Simple name -> fully qualified candidates, in registration
    /// order. The first candidate wins unqualified resolution; all
    /// remain reachable by fully qualified name.
    simple_names: HashMap<EcoString, Vec<EcoString>>,
    /// Configured import roots (URI prefixes).
    import_paths: Vec<EcoString>,
    /// Memoized import resolutions, invalidated whenever the document
    /// set changes.
    import_cache: RefCell<HashMap<EcoString, Option<EcoString>>>,
}

impl WorkspaceIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the import roots used to resolve import paths, replacing
    /// any previous configuration.
    pub fn set_import_paths(&mut self, paths: Vec<EcoString>) {
        debug!(roots = paths.len(), "setting import paths");
        self.import_paths = paths;
        self.import_cache.borrow_mut().clear();
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Inserts or replaces a document.
    ///
    /// Every symbol previously derived from the same URI is dropped
    /// first, so calling this repeatedly with the same parse result is
    /// idempotent.
    pub fn update_file(&mut self, file: ProtoFile) {
        let uri = file.uri.clone();
        debug!(uri = %uri, "updating file");
        self.purge_symbols_of(&uri);

        for info in extract_symbols(&file) {
            let candidates = self.simple_names.entry(info.name.clone()).or_default();
            if !candidates.contains(&info.full_name) {
                candidates.push(info.full_name.clone());
            }
            self.symbols.insert(info.full_name.clone(), info);
        }
        self.files.insert(uri, file);
        self.import_cache.borrow_mut().clear();
    }

    /// Removes a document and everything derived from it.
    pub fn remove_file(&mut self, uri: &str) {
        debug!(uri = %uri, "removing file");
        self.purge_symbols_of(uri);
        self.files.remove(uri);
        self.import_cache.borrow_mut().clear();
    }

    fn purge_symbols_of(&mut self, uri: &str) {
        let stale: Vec<EcoString> = self
            .symbols
            .values()
            .filter(|s| s.location.uri == uri)
            .map(|s| s.full_name.clone())
            .collect();
        for full_name in &stale {
            if let Some(info) = self.symbols.remove(full_name) {
                if let Some(candidates) = self.simple_names.get_mut(&info.name) {
                    candidates.retain(|c| c != full_name);
                    if candidates.is_empty() {
                        self.simple_names.remove(&info.name);
                    }
                }
            }
        }
    }

    // ========================================================================
    // Document & Symbol Access
    // ========================================================================

    /// Returns the parsed file for a URI, if indexed.
    #[must_use]
    pub fn file(&self, uri: &str) -> Option<&ProtoFile> {
        self.files.get(uri)
    }

    /// Iterates over all indexed files.
    pub fn all_files(&self) -> impl Iterator<Item = &ProtoFile> {
        self.files.values()
    }

    /// Looks up a symbol by fully qualified name.
    #[must_use]
    pub fn symbol(&self, full_name: &str) -> Option<&SymbolInfo> {
        self.symbols.get(full_name)
    }

    /// Iterates over every symbol in the workspace.
    pub fn all_symbols(&self) -> impl Iterator<Item = &SymbolInfo> {
        self.symbols.values()
    }

    /// Returns the symbols declared in one document.
    #[must_use]
    pub fn symbols_in_file(&self, uri: &str) -> Vec<&SymbolInfo> {
        self.symbols
            .values()
            .filter(|s| s.location.uri == uri)
            .collect()
    }

    // ========================================================================
    // Import Graph
    // ========================================================================

    /// Resolves one import path from the given document to a known
    /// document URI. Results are memoized until the document set or the
    /// import roots change.
    #[must_use]
    pub fn resolve_import_to_uri(&self, import_path: &str, importer_uri: &str) -> Option<EcoString> {
        let key: EcoString = format!("{importer_uri}\u{1}{import_path}").into();
        if let Some(cached) = self.import_cache.borrow().get(&key).cloned() {
            return cached;
        }
        let uris: Vec<&EcoString> = self.files.keys().collect();
        let resolved =
            imports::resolve_import(import_path, importer_uri, &uris, &self.import_paths);
        trace!(path = %import_path, resolved = ?resolved, "resolved import");
        self.import_cache.borrow_mut().insert(key, resolved.clone());
        resolved
    }

    /// Returns the URIs of the documents a file directly imports,
    /// skipping imports that do not resolve.
    #[must_use]
    pub fn imported_file_uris(&self, uri: &str) -> Vec<EcoString> {
        let Some(file) = self.files.get(uri) else {
            return Vec::new();
        };
        file.imports
            .iter()
            .filter_map(|import| self.resolve_import_to_uri(&import.path, uri))
            .collect()
    }

    /// Returns the symbols reachable from a document: the depth-first
    /// transitive closure over the import graph starting at `uri`, the
    /// document's own symbols first. A visited set tolerates import
    /// cycles; flagging the cycle itself is a diagnostics concern.
    #[must_use]
    pub fn accessible_symbols(&self, uri: &str) -> Vec<&SymbolInfo> {
        let mut result = Vec::new();
        let mut visited: HashSet<EcoString> = HashSet::new();
        self.collect_reachable(&EcoString::from(uri), &mut visited, &mut result);
        result
    }

    fn collect_reachable<'a>(
        &'a self,
        uri: &EcoString,
        visited: &mut HashSet<EcoString>,
        out: &mut Vec<&'a SymbolInfo>,
    ) {
        if !visited.insert(uri.clone()) {
            return;
        }
        out.extend(self.symbols_in_file(uri));
        let Some(file) = self.files.get(uri) else {
            return;
        };
        for import in &file.imports {
            if let Some(target) = self.resolve_import_to_uri(&import.path, uri) {
                self.collect_reachable(&target, visited, out);
            }
        }
    }

    // ========================================================================
    // Type Resolution
    // ========================================================================

    /// Resolves a type reference as written in `from_uri` (whose
    /// declared package is `package`) to its defining symbol.
    ///
    /// Scalar types resolve to `None` immediately. Named types follow
    /// protobuf scoping: absolute references (leading dot) look up
    /// exactly; otherwise the name is tried fully qualified, then
    /// qualified by each enclosing package scope innermost-first, then
    /// against imported files' packages, then by simple-name candidates
    /// in registration order, and finally by dotted suffix anywhere in
    /// the workspace.
    #[must_use]
    pub fn resolve_type(
        &self,
        type_name: &str,
        from_uri: &str,
        package: &str,
    ) -> Option<&SymbolInfo> {
        if is_scalar_type(type_name) {
            return None;
        }
        if let Some(absolute) = type_name.strip_prefix('.') {
            return self.symbols.get(absolute);
        }
        if let Some(info) = self.symbols.get(type_name) {
            return Some(info);
        }

        // Enclosing package scopes, innermost first.
        let mut scope = package;
        loop {
            if !scope.is_empty() {
                let candidate = format!("{scope}.{type_name}");
                if let Some(info) = self.symbols.get(candidate.as_str()) {
                    return Some(info);
                }
            }
            match scope.rfind('.') {
                Some(i) => scope = &scope[..i],
                None => break,
            }
        }

        // Imported files: the file's own package prefix, then a
        // suffix/simple-name scan restricted to symbols declared in
        // that file. The restriction keeps an imported nested type
        // from losing to a same-named symbol elsewhere.
        let suffix = format!(".{type_name}");
        for import_uri in self.imported_file_uris(from_uri) {
            if let Some(imported) = self.files.get(&import_uri) {
                let pkg = imported.package_name();
                if !pkg.is_empty() {
                    let candidate = format!("{pkg}.{type_name}");
                    if let Some(info) = self.symbols.get(candidate.as_str()) {
                        return Some(info);
                    }
                }
            }
            if let Some(info) = self.symbols.values().find(|s| {
                s.location.uri == import_uri
                    && (s.name == type_name || s.full_name.ends_with(suffix.as_str()))
            }) {
                return Some(info);
            }
        }

        // Simple-name candidates, registration order; first wins.
        if let Some(candidates) = self.simple_names.get(type_name) {
            if let Some(info) = candidates.iter().find_map(|c| self.symbols.get(c)) {
                trace!(type_name, resolved = %info.full_name, "resolved via simple name");
                return Some(info);
            }
        }

        // Dotted suffix anywhere.
        self.symbols
            .values()
            .find(|s| s.full_name.ends_with(suffix.as_str()))
    }

    // ========================================================================
    // References & Completion
    // ========================================================================

    /// Finds every type-reference site in the workspace that refers to
    /// the symbol with the given fully qualified name. Returned ranges
    /// cover the written type token, ready for rename.
    #[must_use]
    pub fn find_references(&self, full_name: &str) -> Vec<Location> {
        let mut locations = Vec::new();
        for file in self.files.values() {
            let mut sites: Vec<(&EcoString, Range)> = Vec::new();
            for message in &file.messages {
                collect_reference_sites(message, &mut sites);
            }
            for extend in &file.extends {
                sites.push((&extend.target, extend.target_range));
                for field in &extend.fields {
                    sites.push((&field.field_type, field.field_type_range));
                }
            }
            for service in &file.services {
                for rpc in &service.rpcs {
                    sites.push((&rpc.request_type, rpc.request_type_range));
                    sites.push((&rpc.response_type, rpc.response_type_range));
                }
            }

            for (written, range) in sites {
                if !is_scalar_type(written) && reference_matches(written, full_name) {
                    locations.push(Location {
                        uri: file.uri.clone(),
                        range,
                    });
                }
            }
        }
        locations
    }

    /// Message and enum symbols usable in type position from the given
    /// document: symbols reachable through the import graph first, then
    /// every other matching symbol in the workspace. Completion offers
    /// the whole workspace; picking a not-yet-imported symbol is the
    /// cue to add the import.
    #[must_use]
    pub fn type_completions(&self, from_uri: &str) -> Vec<&SymbolInfo> {
        self.completions_from(from_uri, |kind| {
            matches!(kind, SymbolKind::Message | SymbolKind::Enum)
        })
    }

    /// Every message symbol in the workspace (rpc request/response
    /// position).
    #[must_use]
    pub fn message_completions(&self) -> Vec<&SymbolInfo> {
        self.symbols
            .values()
            .filter(|s| s.kind == SymbolKind::Message)
            .collect()
    }

    fn completions_from(
        &self,
        from_uri: &str,
        wanted: impl Fn(SymbolKind) -> bool,
    ) -> Vec<&SymbolInfo> {
        let mut result: Vec<&SymbolInfo> = Vec::new();
        let mut seen: HashSet<&EcoString> = HashSet::new();
        for info in self.accessible_symbols(from_uri) {
            if wanted(info.kind) && seen.insert(&info.full_name) {
                result.push(info);
            }
        }
        for info in self.symbols.values() {
            if wanted(info.kind) && seen.insert(&info.full_name) {
                result.push(info);
            }
        }
        result
    }
}

/// Collects `(written type, range)` reference sites in a message,
/// recursively through oneofs, groups, nested messages, and nested
/// extend blocks.
fn collect_reference_sites<'a>(
    message: &'a MessageDefinition,
    sites: &mut Vec<(&'a EcoString, Range)>,
) {
    for field in &message.fields {
        sites.push((&field.field_type, field.field_type_range));
    }
    for map in &message.maps {
        sites.push((&map.value_type, map.value_type_range));
    }
    for oneof in &message.oneofs {
        for field in &oneof.fields {
            sites.push((&field.field_type, field.field_type_range));
        }
    }
    for extend in &message.extends {
        sites.push((&extend.target, extend.target_range));
        for field in &extend.fields {
            sites.push((&field.field_type, field.field_type_range));
        }
    }
    for group in &message.groups {
        collect_reference_sites(&group.body, sites);
    }
    for nested in &message.messages {
        collect_reference_sites(nested, sites);
    }
}

/// Returns `true` if a written type reference plausibly denotes the
/// symbol `full_name`: exact match, or dotted-suffix match in either
/// direction (the written form may carry less qualification than the
/// full name, or more, e.g. a package prefix the symbol was registered
/// without).
fn reference_matches(written: &str, full_name: &str) -> bool {
    let written = written.strip_prefix('.').unwrap_or(written);
    if written == full_name {
        return true;
    }
    full_name
        .strip_suffix(written)
        .is_some_and(|rest| rest.ends_with('.'))
        || written
            .strip_suffix(full_name)
            .is_some_and(|rest| rest.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::parse;

    fn indexed(sources: &[(&str, &str)]) -> WorkspaceIndex {
        let mut index = WorkspaceIndex::new();
        for (uri, source) in sources {
            let (file, _) = parse(source, *uri).expect("fatal parse error");
            index.update_file(file);
        }
        index
    }

    const A_URI: &str = "file:///ws/common.proto";
    const B_URI: &str = "file:///ws/user.proto";

    fn two_file_workspace() -> WorkspaceIndex {
        indexed(&[
            (A_URI, "package common;\nmessage Address {}"),
            (
                B_URI,
                "import \"common.proto\";\npackage user;\nmessage User { common.Address addr = 1; }",
            ),
        ])
    }

    #[test]
    fn resolves_cross_file_qualified_type() {
        let index = two_file_workspace();
        let info = index.resolve_type("common.Address", B_URI, "user").unwrap();
        assert_eq!(info.full_name, "common.Address");
        assert_eq!(info.location.uri, A_URI);
    }

    #[test]
    fn scalar_types_never_resolve() {
        let index = two_file_workspace();
        assert!(index.resolve_type("int32", B_URI, "user").is_none());
        assert!(index.resolve_type("string", B_URI, "user").is_none());
        assert!(index.resolve_type("bytes", B_URI, "user").is_none());
    }

    #[test]
    fn resolves_absolute_reference() {
        let index = two_file_workspace();
        let info = index.resolve_type(".common.Address", B_URI, "user").unwrap();
        assert_eq!(info.full_name, "common.Address");
        // Absolute lookups bypass scope walking entirely.
        assert!(index.resolve_type(".Address", B_URI, "user").is_none());
    }

    #[test]
    fn resolves_through_enclosing_package_scopes() {
        let index = indexed(&[
            ("file:///a.proto", "package a;\nmessage Shared {}"),
            (
                "file:///b.proto",
                "package a.b.c;\nmessage M { Shared s = 1; }",
            ),
        ]);
        let info = index.resolve_type("Shared", "file:///b.proto", "a.b.c").unwrap();
        assert_eq!(info.full_name, "a.Shared");
    }

    #[test]
    fn resolves_simple_name_via_imported_package() {
        let index = two_file_workspace();
        let info = index.resolve_type("Address", B_URI, "user").unwrap();
        assert_eq!(info.full_name, "common.Address");
    }

    #[test]
    fn unresolvable_type_is_none() {
        let index = two_file_workspace();
        assert!(index.resolve_type("Nonexistent", B_URI, "user").is_none());
    }

    #[test]
    fn first_simple_name_registration_wins() {
        let index = indexed(&[
            ("file:///one.proto", "package one;\nmessage Config {}"),
            ("file:///two.proto", "package two;\nmessage Config {}"),
            ("file:///z.proto", "package z;\nmessage M { Config c = 1; }"),
        ]);
        let info = index.resolve_type("Config", "file:///z.proto", "z").unwrap();
        assert_eq!(info.full_name, "one.Config");
        // Both stay reachable fully qualified.
        assert!(index.symbol("one.Config").is_some());
        assert!(index.symbol("two.Config").is_some());
    }

    #[test]
    fn update_is_idempotent() {
        let mut index = two_file_workspace();
        let before = index.all_symbols().count();
        let (file, _) = parse(
            "import \"common.proto\";\npackage user;\nmessage User { common.Address addr = 1; }",
            B_URI,
        )
        .unwrap();
        index.update_file(file);
        assert_eq!(index.all_symbols().count(), before);
        assert!(index.resolve_type("common.Address", B_URI, "user").is_some());
    }

    #[test]
    fn update_replaces_previous_symbols() {
        let mut index = indexed(&[("file:///a.proto", "message Old {}")]);
        assert!(index.symbol("Old").is_some());

        let (file, _) = parse("message New {}", "file:///a.proto").unwrap();
        index.update_file(file);
        assert!(index.symbol("Old").is_none());
        assert!(index.symbol("New").is_some());
    }

    #[test]
    fn remove_file_purges_everything() {
        let mut index = two_file_workspace();
        index.remove_file(A_URI);
        assert!(index.file(A_URI).is_none());
        assert!(index.symbol("common.Address").is_none());
        assert!(index.resolve_type("common.Address", B_URI, "user").is_none());
        // The other file is untouched.
        assert!(index.symbol("user.User").is_some());
    }

    #[test]
    fn imported_file_uris_resolve() {
        let index = two_file_workspace();
        assert_eq!(index.imported_file_uris(B_URI), vec![EcoString::from(A_URI)]);
        assert!(index.imported_file_uris(A_URI).is_empty());
    }

    #[test]
    fn accessible_symbols_are_transitive() {
        let index = indexed(&[
            ("file:///a.proto", "package a;\nmessage A {}"),
            ("file:///b.proto", "import \"a.proto\";\npackage b;\nmessage B {}"),
            ("file:///c.proto", "import \"b.proto\";\npackage c;\nmessage C {}"),
            ("file:///d.proto", "package d;\nmessage D {}"),
        ]);
        let names: Vec<&str> = index
            .accessible_symbols("file:///c.proto")
            .iter()
            .map(|s| s.full_name.as_str())
            .collect();
        // The whole import closure is reachable, own symbols first.
        assert_eq!(names[0], "c.C");
        assert!(names.contains(&"b.B"));
        assert!(names.contains(&"a.A"));
        // Files outside the closure are not.
        assert!(!names.contains(&"d.D"));
    }

    #[test]
    fn import_cycles_terminate() {
        let index = indexed(&[
            (
                "file:///a.proto",
                "import public \"b.proto\";\npackage a;\nmessage A {}",
            ),
            (
                "file:///b.proto",
                "import public \"a.proto\";\npackage b;\nmessage B {}",
            ),
        ]);
        let names: Vec<&str> = index
            .accessible_symbols("file:///a.proto")
            .iter()
            .map(|s| s.full_name.as_str())
            .collect();
        assert!(names.contains(&"a.A"));
        assert!(names.contains(&"b.B"));
    }

    #[test]
    fn finds_references_across_files() {
        let index = two_file_workspace();
        let references = index.find_references("common.Address");
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].uri, B_URI);
        // The range covers the written type token on line 2.
        assert_eq!(references[0].range.start.line, 2);
    }

    #[test]
    fn finds_rpc_and_map_references() {
        let index = indexed(&[(
            "file:///s.proto",
            "message Req {}\nmessage Resp {}\nmessage Box { map<string, Resp> items = 1; }\nservice S { rpc Call(Req) returns (Resp); }",
        )]);
        assert_eq!(index.find_references("Req").len(), 1);
        assert_eq!(index.find_references("Resp").len(), 2);
    }

    #[test]
    fn completions_filter_by_kind() {
        let index = indexed(&[(
            "file:///a.proto",
            "package p;\nmessage M { int32 x = 1; }\nenum E { E0 = 0; }\nservice S { rpc R(M) returns (M); }",
        )]);
        let type_names: Vec<&str> = index
            .type_completions("file:///a.proto")
            .iter()
            .map(|s| s.full_name.as_str())
            .collect();
        assert!(type_names.contains(&"p.M"));
        assert!(type_names.contains(&"p.E"));
        assert!(!type_names.contains(&"p.S"));
        assert!(!type_names.contains(&"p.M.x"));

        let message_names: Vec<&str> = index
            .message_completions()
            .iter()
            .map(|s| s.full_name.as_str())
            .collect();
        assert!(message_names.contains(&"p.M"));
        assert!(!message_names.contains(&"p.E"));
    }

    #[test]
    fn completions_cover_the_whole_workspace_accessible_first() {
        let index = indexed(&[
            ("file:///a.proto", "package a;\nmessage A {}"),
            (
                "file:///b.proto",
                "import \"a.proto\";\npackage b;\nmessage B {}",
            ),
            ("file:///far.proto", "package far;\nmessage Far {}"),
        ]);
        let names: Vec<&str> = index
            .type_completions("file:///b.proto")
            .iter()
            .map(|s| s.full_name.as_str())
            .collect();
        // Not-yet-imported symbols are still offered, after the
        // import closure, with no duplicates.
        assert_eq!(&names[..2], &["b.B", "a.A"]);
        assert!(names.contains(&"far.Far"));
        assert_eq!(names.len(), 3);

        let message_names: Vec<&str> = index
            .message_completions()
            .iter()
            .map(|s| s.full_name.as_str())
            .collect();
        assert!(message_names.contains(&"far.Far"));
    }

    #[test]
    fn finds_references_written_with_extra_qualification() {
        // The written reference carries a package prefix the symbol was
        // registered without.
        let index = indexed(&[
            ("file:///addr.proto", "message Address {}"),
            (
                "file:///user.proto",
                "import \"addr.proto\";\nmessage User { common.Address addr = 1; }",
            ),
        ]);
        let references = index.find_references("Address");
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].uri, "file:///user.proto");
    }

    #[test]
    fn imported_nested_type_beats_unrelated_simple_name() {
        let index = indexed(&[
            ("file:///q.proto", "package q;\nmessage Inner {}"),
            (
                "file:///lib.proto",
                "package p;\nmessage Outer { message Inner {} }",
            ),
            (
                "file:///main.proto",
                "import \"lib.proto\";\npackage m;\nmessage M { Inner i = 1; }",
            ),
        ]);
        // The nested type in the imported file wins over the earlier-
        // registered simple-name candidate in an unrelated file.
        let info = index.resolve_type("Inner", "file:///main.proto", "m").unwrap();
        assert_eq!(info.full_name, "p.Outer.Inner");
    }

    #[test]
    fn import_roots_feed_resolution() {
        let mut index = indexed(&[
            (
                "file:///ws/vendor/google/protobuf/timestamp.proto",
                "package google.protobuf;\nmessage Timestamp {}",
            ),
            (
                "file:///elsewhere/main.proto",
                "import \"google/protobuf/timestamp.proto\";\nmessage M { google.protobuf.Timestamp t = 1; }",
            ),
        ]);
        index.set_import_paths(vec!["file:///ws/vendor".into()]);
        assert_eq!(
            index
                .resolve_import_to_uri("google/protobuf/timestamp.proto", "file:///elsewhere/main.proto")
                .as_deref(),
            Some("file:///ws/vendor/google/protobuf/timestamp.proto")
        );
    }
}
