//! The graph query language and its evaluator.
//!
//! A query is a list of conditions joined by the literal separator
//! `" AND "` (case-insensitive). Two condition forms exist:
//!
//! ```text
//! (property key:: value)
//! (outgoing-link [[Target]])
//! ```
//!
//! Segments that parse as neither are dropped silently (debug-logged); an
//! empty resulting condition set yields an empty result list, not an error.
//! Conditions are ANDed; there is no OR, NOT, or grouping.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::constants::is_node_path;
use crate::errors::ArborError;
use crate::ignore_rules::IgnoreMatcher;
use crate::types::{QueryCondition, QueryMatch};
use crate::walker::{relative_display, walk};

use super::links::extract_outgoing_links;

/// Splits a query string on the literal `" AND "` separator.
fn and_separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i) AND ").expect("valid regex"))
}

/// Parse a query string into its condition list.
///
/// Unparsable segments are dropped silently; the caller decides what an
/// empty condition list means (for [`query_graph`]: an empty result).
pub fn parse_query(query: &str) -> Vec<QueryCondition> {
    and_separator_regex()
        .split(query)
        .filter_map(|segment| {
            let condition = parse_condition(segment);
            if condition.is_none() && !segment.trim().is_empty() {
                tracing::debug!("dropping unparsable query segment: `{}`", segment.trim());
            }
            condition
        })
        .collect()
}

/// Parse one `(property key:: value)` or `(outgoing-link [[Target]])`
/// segment. Returns `None` for anything else.
fn parse_condition(segment: &str) -> Option<QueryCondition> {
    let segment = segment.trim();
    let inner = segment.strip_prefix('(')?.strip_suffix(')')?.trim();

    if let Some(rest) = inner.strip_prefix("property ") {
        let (key, value) = rest.split_once("::")?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        return Some(QueryCondition::Property {
            key: key.to_string(),
            value: value.trim().to_string(),
        });
    }

    if let Some(rest) = inner.strip_prefix("outgoing-link ") {
        let target = rest.trim().strip_prefix("[[")?.strip_suffix("]]")?;
        if target.is_empty() {
            return None;
        }
        return Some(QueryCondition::OutgoingLink {
            target: target.to_string(),
        });
    }

    None
}

/// The exact trimmed line a property condition matches.
fn expected_property_line(key: &str, value: &str) -> String {
    if value.is_empty() {
        format!("{key}::")
    } else {
        format!("{key}:: {value}")
    }
}

/// Evaluate the conditions against one document.
///
/// Conditions are evaluated in list order; the first condition with zero
/// matches excludes the file and stops evaluation. A match returns the
/// concatenation of every condition's fragments, in condition order.
fn evaluate(content: &str, conditions: &[QueryCondition]) -> Option<Vec<String>> {
    let mut fragments: Vec<String> = Vec::new();
    // Derived lazily: only queries with a link condition pay for extraction.
    let mut links: Option<Vec<String>> = None;

    for condition in conditions {
        match condition {
            QueryCondition::Property { key, value } => {
                let expected = expected_property_line(key, value);
                let before = fragments.len();
                for line in content.lines() {
                    if line.trim() == expected {
                        fragments.push(line.trim().to_string());
                    }
                }
                if fragments.len() == before {
                    return None;
                }
            }
            QueryCondition::OutgoingLink { target } => {
                let links = links.get_or_insert_with(|| extract_outgoing_links(content));
                if links.iter().any(|l| l == target) {
                    fragments.push(format!("[[{target}]]"));
                } else {
                    return None;
                }
            }
        }
    }

    Some(fragments)
}

/// Run a query across every walked `.md` file under `root`.
///
/// Results are sorted by path. Per-file read failures abort only that
/// file's contribution (logged, not retried).
pub fn query_graph(
    root: &Path,
    matcher: IgnoreMatcher,
    query: &str,
) -> Result<Vec<QueryMatch>, ArborError> {
    let conditions = parse_query(query);
    if conditions.is_empty() {
        return Ok(Vec::new());
    }

    let mut results: Vec<QueryMatch> = Vec::new();

    for item in walk(root, matcher) {
        let path = match item {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!("query: {err}");
                continue;
            }
        };

        if !is_node_path(&path) {
            continue;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!("query: could not read {}: {err}", path.display());
                continue;
            }
        };

        if let Some(matches) = evaluate(&content, &conditions) {
            results.push(QueryMatch {
                file_path: relative_display(root, &path),
                matches,
            });
        }
    }

    results.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    Ok(results)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_property_condition() {
        let conditions = parse_query("(property status:: active)");
        assert_eq!(
            conditions,
            vec![QueryCondition::Property {
                key: "status".to_string(),
                value: "active".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_outgoing_link_condition() {
        let conditions = parse_query("(outgoing-link [[Project X]])");
        assert_eq!(
            conditions,
            vec![QueryCondition::OutgoingLink {
                target: "Project X".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_and_is_case_insensitive() {
        let conditions = parse_query("(property a:: 1) and (property b:: 2)");
        assert_eq!(conditions.len(), 2);
        let conditions = parse_query("(property a:: 1) AND (property b:: 2)");
        assert_eq!(conditions.len(), 2);
    }

    #[test]
    fn test_parse_drops_unparsable_segments_silently() {
        let conditions = parse_query("garbage AND (property status:: active) AND (also bad)");
        assert_eq!(conditions.len(), 1);
    }

    #[test]
    fn test_parse_all_unparsable_yields_empty() {
        assert!(parse_query("nothing here").is_empty());
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn test_evaluate_property_needs_exact_trimmed_line() {
        let content = "status:: active\n- status:: active\nnote on status:: active things";
        let conditions = parse_query("(property status:: active)");
        // Only the line that trims to exactly `key:: value` counts; the
        // bulleted and prose variants do not.
        assert_eq!(
            evaluate(content, &conditions).unwrap(),
            vec!["status:: active"]
        );
    }

    #[test]
    fn test_evaluate_collects_duplicate_property_lines() {
        let content = "tag:: x\n  tag:: x";
        let report = validate_matches(content, "(property tag:: x)");
        assert_eq!(report, vec!["tag:: x", "tag:: x"]);
    }

    #[test]
    fn test_evaluate_short_circuits_on_first_miss() {
        let content = "status:: archived";
        let conditions = parse_query("(property status:: active) AND (outgoing-link [[x]])");
        assert!(evaluate(content, &conditions).is_none());
    }

    #[test]
    fn test_evaluate_fragments_in_condition_order() {
        let content = "- links [[x]]\n  status:: active";
        let report = validate_matches(
            content,
            "(outgoing-link [[x]]) AND (property status:: active)",
        );
        assert_eq!(report, vec!["[[x]]", "status:: active"]);
    }

    fn validate_matches(content: &str, query: &str) -> Vec<String> {
        evaluate(content, &parse_query(query)).unwrap()
    }

    fn graph(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, content).unwrap();
        }
        dir
    }

    fn run(dir: &TempDir, query: &str) -> Vec<QueryMatch> {
        let root = dir.path().canonicalize().unwrap();
        let matcher = IgnoreMatcher::from_root(&root).unwrap();
        query_graph(&root, matcher, query).unwrap()
    }

    #[test]
    fn test_query_graph_property_filter() {
        let dir = graph(&[("a.md", "status:: active"), ("b.md", "status:: archived")]);

        let results = run(&dir, "(property status:: active)");
        assert_eq!(
            results,
            vec![QueryMatch {
                file_path: "a.md".to_string(),
                matches: vec!["status:: active".to_string()],
            }]
        );
    }

    #[test]
    fn test_query_graph_conjunction() {
        let dir = graph(&[
            ("a.md", "type:: person\n- see [[Projects]]"),
            ("b.md", "type:: person"),
        ]);

        let results = run(&dir, "(property type:: person) AND (outgoing-link [[Projects]])");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].file_path, "a.md");
        assert_eq!(results[0].matches, vec!["type:: person", "[[Projects]]"]);
    }

    #[test]
    fn test_query_graph_only_considers_markdown() {
        let dir = graph(&[("a.md", "status:: active"), ("a.txt", "status:: active")]);
        let results = run(&dir, "(property status:: active)");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].file_path, "a.md");
    }

    #[test]
    fn test_query_graph_empty_conditions_empty_result() {
        let dir = graph(&[("a.md", "- status:: active")]);
        assert!(run(&dir, "not a condition").is_empty());
    }
}
