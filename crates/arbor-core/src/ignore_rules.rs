//! Ignore-rule compilation for graph traversals.
//!
//! The graph root may carry an ignore file ([`crate::constants::ARBOR_IGNORE_FILENAME`])
//! with one gitignore-style rule per line: `#` comments and blank lines are
//! skipped, a leading `!` negates, a trailing `/` restricts the rule to
//! directories. Rules are tested in file order and the last match wins.
//!
//! Compilation happens once per top-level operation; the compiled matcher is
//! then reused for every path tested during that operation. Nothing is cached
//! between operations, so edits to the ignore file take effect immediately.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::constants::ARBOR_IGNORE_FILENAME;
use crate::errors::ArborError;

/// A compiled set of ignore rules, bound to the root they are anchored at.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    inner: Gitignore,
    rule_count: usize,
}

impl IgnoreMatcher {
    /// Compile ignore rules from raw text.
    ///
    /// Each non-blank, non-comment line becomes one rule, anchored at
    /// `root`: a pattern containing a separator matches relative to the
    /// root, a separator-free pattern matches the basename at any depth.
    ///
    /// # Errors
    ///
    /// Returns [`ArborError::InvalidConfig`] if a rule fails to compile.
    pub fn compile(root: &Path, rules_text: &str) -> Result<Self, ArborError> {
        let mut builder = GitignoreBuilder::new(root);
        let mut rule_count = 0;

        for line in rules_text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            builder
                .add_line(None, trimmed)
                .map_err(|e| ArborError::InvalidConfig(format!("ignore rule `{trimmed}`: {e}")))?;
            rule_count += 1;
        }

        let inner = builder
            .build()
            .map_err(|e| ArborError::InvalidConfig(format!("ignore rules: {e}")))?;

        Ok(Self { inner, rule_count })
    }

    /// Compile the ignore file found at the top level of `root`, or an empty
    /// rule set if the file does not exist.
    pub fn from_root(root: &Path) -> Result<Self, ArborError> {
        let ignore_path = root.join(ARBOR_IGNORE_FILENAME);
        let rules_text = match std::fs::read_to_string(&ignore_path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err.into()),
        };
        Self::compile(root, &rules_text)
    }

    /// Number of compiled rules.
    pub fn rule_count(&self) -> usize {
        self.rule_count
    }

    /// Test a root-relative path against the rules.
    ///
    /// The last rule that matches determines the outcome; a later negated
    /// rule un-ignores. The root itself is never ignored.
    pub fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool {
        if relative.as_os_str().is_empty() {
            return false;
        }
        self.inner.matched(relative, is_dir).is_ignore()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn compile(rules: &str) -> IgnoreMatcher {
        IgnoreMatcher::compile(Path::new("/graph"), rules).unwrap()
    }

    #[test]
    fn test_last_match_wins_with_negation() {
        let m = compile("*.log\n!keep.log\n");
        assert!(m.is_ignored(Path::new("debug.log"), false));
        assert!(!m.is_ignored(Path::new("keep.log"), false));
    }

    #[test]
    fn test_negation_order_matters() {
        // Reversed order: the broad rule is last, so it wins again.
        let m = compile("!keep.log\n*.log\n");
        assert!(m.is_ignored(Path::new("keep.log"), false));
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let m = compile("# header comment\n\n   \n*.tmp\n");
        assert_eq!(m.rule_count(), 1);
        assert!(m.is_ignored(Path::new("x.tmp"), false));
    }

    #[test]
    fn test_basename_pattern_matches_at_any_depth() {
        let m = compile("*.tmp\n");
        assert!(m.is_ignored(Path::new("a/b/c.tmp"), false));
    }

    #[test]
    fn test_pattern_with_separator_is_root_anchored() {
        let m = compile("logs/debug.md\n");
        assert!(m.is_ignored(Path::new("logs/debug.md"), false));
        assert!(!m.is_ignored(Path::new("nested/logs/debug.md"), false));
    }

    #[test]
    fn test_directory_only_rule() {
        let m = compile("build/\n");
        assert!(m.is_ignored(Path::new("build"), true));
        assert!(!m.is_ignored(Path::new("build"), false));
    }

    #[test]
    fn test_double_star_crosses_separators() {
        let m = compile("assets/**/*.png\n");
        assert!(m.is_ignored(Path::new("assets/img/deep/x.png"), false));
        assert!(!m.is_ignored(Path::new("pages/x.png"), false));
    }

    #[test]
    fn test_root_is_never_ignored() {
        let m = compile("*\n");
        assert!(!m.is_ignored(Path::new(""), true));
    }

    #[test]
    fn test_empty_rule_set_ignores_nothing() {
        let m = compile("");
        assert_eq!(m.rule_count(), 0);
        assert!(!m.is_ignored(Path::new("anything.md"), false));
    }
}
