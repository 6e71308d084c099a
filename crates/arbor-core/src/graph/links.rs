//! Wikilink extraction and backlink discovery.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::ArborError;
use crate::ignore_rules::IgnoreMatcher;
use crate::walker::{relative_display, walk};

/// Matches one wikilink token: `[[Target]]`. The target may contain any
/// character except the closing brackets.
fn wikilink_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("valid regex"))
}

/// Extract the outgoing-link targets of a document.
///
/// Returns distinct target names in first-occurrence order. Extraction is
/// syntactic: a link to a nonexistent node is still returned.
pub fn extract_outgoing_links(content: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();

    for cap in wikilink_regex().captures_iter(content) {
        let target = cap[1].to_string();
        if !seen.contains(&target) {
            seen.push(target);
        }
    }

    seen
}

/// The link-name a node is addressed by: its file name without extension.
pub fn link_name_for(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// Find all files under `root` that link to `target`.
///
/// The target's link-name is its file name without extension; a file counts
/// as a backlink when its raw content contains the literal substring
/// `[[<link-name>]]`. This is intentionally a shallow substring test, not an
/// outgoing-link-set membership test: it can false-positive (the token
/// inside a code block counts) and it misses links whose display text
/// differs from the file name. That trade-off is part of the contract.
///
/// The target file itself is never reported, even if it self-references.
/// Files that fail to read are skipped and logged, not errored.
pub fn find_backlinks(
    root: &Path,
    matcher: IgnoreMatcher,
    target: &Path,
) -> Result<Vec<String>, ArborError> {
    let Some(link_name) = link_name_for(target) else {
        return Ok(Vec::new());
    };
    let token = format!("[[{link_name}]]");

    let mut hits: Vec<String> = Vec::new();

    for item in walk(root, matcher) {
        let path = match item {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!("backlink scan: {err}");
                continue;
            }
        };

        if path == target {
            continue;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!("backlink scan: could not read {}: {err}", path.display());
                continue;
            }
        };

        if content.contains(&token) {
            hits.push(relative_display(root, &path));
        }
    }

    hits.sort();
    Ok(hits)
}

// ============================================================================
// Tests
// ============================================================================
