// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Import path resolution: mapping `import "a/b.proto";` strings to
//! workspace document URIs.
//!
//! Import paths are written relative to compiler include roots, which
//! an editor does not reliably know. Resolution therefore tries
//! increasingly loose strategies against the set of open documents:
//!
//! 1. A known URI whose path ends with the import path (on a segment
//!    boundary)
//! 2. A known URI sharing the import's file name (for workspaces whose
//!    root layout does not match the import paths)
//! 3. The path joined onto the importing document's directory
//! 4. The path joined onto each configured import root

use camino::Utf8PathBuf;
use ecow::EcoString;

/// Resolves one import path against the known document set.
///
/// `uris` is the set of documents currently in the index;
/// `import_roots` are caller-configured include roots (URIs or URI
/// prefixes).
pub(super) fn resolve_import(
    import_path: &str,
    importer_uri: &str,
    uris: &[&EcoString],
    import_roots: &[EcoString],
) -> Option<EcoString> {
    // Exact suffix on a segment boundary.
    if let Some(uri) = uris.iter().find(|uri| ends_with_segments(uri, import_path)) {
        return Some((*uri).clone());
    }

    // File name only.
    let file_name = import_path.rsplit('/').next()?;
    if let Some(uri) = uris.iter().find(|uri| ends_with_segments(uri, file_name)) {
        return Some((*uri).clone());
    }

    // Relative to the importing document's directory.
    if let Some(dir) = parent_of(importer_uri) {
        let joined = join_normalized(dir, import_path);
        if let Some(uri) = uris.iter().find(|uri| uri.as_str() == joined) {
            return Some((*uri).clone());
        }
    }

    // Configured import roots.
    for root in import_roots {
        let joined = join_normalized(root, import_path);
        if let Some(uri) = uris.iter().find(|uri| uri.as_str() == joined) {
            return Some((*uri).clone());
        }
    }
    None
}

/// Returns `true` if `uri` ends with `suffix` on a `/` boundary.
fn ends_with_segments(uri: &str, suffix: &str) -> bool {
    uri.strip_suffix(suffix)
        .is_some_and(|rest| rest.is_empty() || rest.ends_with('/'))
}

/// The URI of the directory containing `uri` (everything before the
/// last `/`).
fn parent_of(uri: &str) -> Option<&str> {
    uri.rfind('/').map(|i| &uri[..i])
}

/// Joins `path` onto `base` and normalizes `.` and `..` segments.
///
/// Operates on the path part only; a `scheme://` prefix passes through
/// untouched.
fn join_normalized(base: &str, path: &str) -> String {
    let (scheme, base_path) = match base.find("://") {
        Some(i) => (&base[..i + 3], &base[i + 3..]),
        None => ("", base),
    };
    let root = if base_path.starts_with('/') { "/" } else { "" };

    let mut normalized = Utf8PathBuf::new();
    for segment in base_path.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                normalized.pop();
            }
            _ => normalized.push(segment),
        }
    }
    format!("{scheme}{root}{normalized}")
}
