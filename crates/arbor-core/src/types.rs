//! Common result and aggregate types for arbor-core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Query Types
// ============================================================================

/// One condition of a graph query.
///
/// A query is an ordered, non-empty list of conditions combined by logical
/// AND only; no OR, NOT, or grouping is supported. Evaluation is a single
/// dispatch over this tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryCondition {
    /// The file must contain a line that, once trimmed, equals exactly
    /// `key:: value`.
    Property {
        /// The property key.
        key: String,
        /// The property value.
        value: String,
    },

    /// The target name must appear in the file's outgoing-link set.
    OutgoingLink {
        /// The link target name.
        target: String,
    },
}

/// One file matched by a graph query.
///
/// `matches` is the concatenation of all matching fragments found across the
/// query's conditions, in condition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMatch {
    /// Graph-relative path of the matched file.
    pub file_path: String,

    /// Matching fragments, in condition order.
    pub matches: Vec<String>,
}

// ============================================================================
// Version-Control Types
// ============================================================================

/// An immutable record in the version-control log.
///
/// Created only by the explicit commit operation, never implicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitEntry {
    /// Full commit hash.
    pub hash: String,

    /// Commit message.
    pub message: String,

    /// Author date.
    pub date: DateTime<Utc>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_match_serialization() {
        let m = QueryMatch {
            file_path: "pages/a.md".to_string(),
            matches: vec!["status:: active".to_string()],
        };

        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"filePath\""));
        assert!(json.contains("\"matches\""));
        assert!(json.contains("status:: active"));
    }

    #[test]
    fn test_commit_entry_roundtrip() {
        let entry = CommitEntry {
            hash: "0123abcd".repeat(5),
            message: "initial import".to_string(),
            date: Utc::now(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        let back: CommitEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hash, entry.hash);
        assert_eq!(back.message, entry.message);
    }
}
