//! Global text search across the graph.

use std::path::Path;

use crate::errors::ArborError;
use crate::ignore_rules::IgnoreMatcher;
use crate::walker::{relative_display, walk};

/// Case-insensitive substring search across every walked file.
///
/// Returns the graph-relative paths of files whose decoded content contains
/// `query`, sorted. Files that fail to decode as UTF-8 text are skipped, not
/// errored; so are files that fail to read (logged).
pub fn search_global(
    root: &Path,
    matcher: IgnoreMatcher,
    query: &str,
) -> Result<Vec<String>, ArborError> {
    let needle = query.to_lowercase();
    let mut hits: Vec<String> = Vec::new();

    for item in walk(root, matcher) {
        let path = match item {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!("search: {err}");
                continue;
            }
        };

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!("search: could not read {}: {err}", path.display());
                continue;
            }
        };

        // Binary or otherwise undecodable files are silently skipped.
        let Ok(content) = String::from_utf8(bytes) else {
            continue;
        };

        if content.to_lowercase().contains(&needle) {
            hits.push(relative_display(root, &path));
        }
    }

    hits.sort();
    Ok(hits)
}

// ============================================================================
// Tests
// ============================================================================
