//! Structural validation of block-outline documents.
//!
//! Graph nodes are block outlines: every non-blank line is a `- ` bullet,
//! indented by two spaces per nesting level. [`validate`] checks a document
//! against that grammar before it is persisted, accumulating *all*
//! violations in one pass rather than stopping at the first. It is a pure
//! function; no I/O.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Depth of the virtual root that seeds the indentation stack.
const VIRTUAL_ROOT_DEPTH: i32 = -2;

/// A single grammar violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineViolation {
    /// 1-based source line number.
    pub line: usize,

    /// Human-readable description of the violation.
    pub message: String,
}

/// Result of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineReport {
    /// Whether the document passed with no violations.
    pub is_valid: bool,

    /// All violations, in source line order.
    pub errors: Vec<OutlineViolation>,
}

/// Matches the body of a property bullet: `key:: value`.
fn property_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\S+::(\s|$)").expect("valid regex"))
}

/// Validate a block-outline document.
///
/// Grammar rules, all checked per non-blank line:
///
/// - the line must start with `- ` after trimming; otherwise it is reported
///   and excluded from the structural checks below (numbering continues);
/// - the leading space count must be a multiple of 2;
/// - relative to the innermost active level, a line may stay, go shallower,
///   or go exactly one level (2 spaces) deeper; deeper jumps are illegal
///   nesting;
/// - a property bullet (`key:: value`) may not sit at indentation 0.
///
/// Blank and whitespace-only lines have no effect, not even on the nesting
/// stack. The stack is updated after both indentation checks run, so one
/// line can be reported for both a modulus and a nesting violation.
pub fn validate(content: &str) -> OutlineReport {
    let mut errors: Vec<OutlineViolation> = Vec::new();
    let mut stack: Vec<i32> = vec![VIRTUAL_ROOT_DEPTH];

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;

        if raw.trim().is_empty() {
            continue;
        }

        let trimmed = raw.trim();
        if !trimmed.starts_with("- ") {
            errors.push(OutlineViolation {
                line: line_no,
                message: format!("line must start with \"- \", found `{}`", truncate(trimmed)),
            });
            continue;
        }

        let indent = raw.chars().take_while(|c| *c == ' ').count();

        if indent % 2 != 0 {
            errors.push(OutlineViolation {
                line: line_no,
                message: format!("indentation of {indent} spaces is not a multiple of 2"),
            });
        }

        // Nesting is judged in whole levels, so an odd indent is only the
        // modulus violation above, not a second nesting one.
        let depth = (indent - indent % 2) as i32;
        let innermost = *stack.last().expect("stack is never empty");

        if depth > innermost + 2 {
            errors.push(OutlineViolation {
                line: line_no,
                message: "indentation increased by more than one level".to_string(),
            });
        }

        if indent == 0 {
            let body = trimmed.trim_start_matches('-').trim_start();
            if property_regex().is_match(body) {
                errors.push(OutlineViolation {
                    line: line_no,
                    message: "property line is not allowed at the document root".to_string(),
                });
            }
        }

        // Stack update happens after both checks so a line can carry both
        // a modulus and a nesting violation.
        while *stack.last().expect("stack is never empty") > depth {
            stack.pop();
        }
        if *stack.last().expect("stack is never empty") < depth {
            stack.push(depth);
        }
    }

    OutlineReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

fn truncate(line: &str) -> String {
    const MAX: usize = 40;
    if line.chars().count() <= MAX {
        line.to_string()
    } else {
        let cut: String = line.chars().take(MAX).collect();
        format!("{cut}…")
    }
}

// ============================================================================
// Tests
// ============================================================================
