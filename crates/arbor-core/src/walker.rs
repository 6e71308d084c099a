//! Lazy directory walking under a graph root.
//!
//! [`walk`] produces a finite, restartable iterator over the files below a
//! root, consulting a compiled [`IgnoreMatcher`] as it goes. Ignored
//! directories are pruned entirely (their contents are never tested or
//! yielded); ignored files are skipped; only files are yielded, never
//! directories.
//!
//! The walker keeps an explicit stack of pending directories instead of
//! recursing, so pathological nesting cannot exhaust the call stack. A
//! directory that fails to open is reported as one error item for that
//! subtree; sibling subtrees still complete. Each call to [`walk`] re-reads
//! the tree from scratch.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::should_ignore_dir;
use crate::errors::ArborError;
use crate::ignore_rules::IgnoreMatcher;

/// Render a path relative to `root`, with forward slashes on every
/// platform. Paths outside `root` are rendered as-is (should not happen for
/// walked entries).
pub(crate) fn relative_display(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    segments.join("/")
}

/// Walk the files under `root`, filtered by `matcher`.
///
/// The returned iterator holds no open directory handles between `next`
/// calls beyond the entries already read; dropping it releases everything.
pub fn walk(root: &Path, matcher: IgnoreMatcher) -> NodeWalker {
    NodeWalker {
        root: root.to_path_buf(),
        matcher,
        pending_dirs: vec![root.to_path_buf()],
        queued: VecDeque::new(),
    }
}

/// Iterator over non-ignored files below a root. See [`walk`].
#[derive(Debug)]
pub struct NodeWalker {
    root: PathBuf,
    matcher: IgnoreMatcher,
    /// Directories not yet read, deepest last (depth-first).
    pending_dirs: Vec<PathBuf>,
    /// Files and errors from the directory read most recently.
    queued: VecDeque<Result<PathBuf, ArborError>>,
}

impl Iterator for NodeWalker {
    type Item = Result<PathBuf, ArborError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.queued.pop_front() {
                return Some(item);
            }
            let dir = self.pending_dirs.pop()?;
            self.read_directory(&dir);
        }
    }
}

impl NodeWalker {
    /// Read one directory: queue its files, push its subdirectories.
    fn read_directory(&mut self, dir: &Path) {
        let reader = match fs::read_dir(dir) {
            Ok(reader) => reader,
            Err(err) => {
                self.queued.push_back(Err(ArborError::DirRead {
                    path: dir.to_path_buf(),
                    message: err.to_string(),
                }));
                return;
            }
        };

        let mut entries: Vec<fs::DirEntry> = Vec::new();
        for entry in reader {
            match entry {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    self.queued.push_back(Err(ArborError::DirRead {
                        path: dir.to_path_buf(),
                        message: err.to_string(),
                    }));
                }
            }
        }

        // Deterministic order regardless of filesystem enumeration.
        entries.sort_by_key(|e| e.file_name());

        let mut subdirs: Vec<PathBuf> = Vec::new();

        for entry in entries {
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };

            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(err) => {
                    tracing::debug!("skipping unreadable entry {}: {}", path.display(), err);
                    continue;
                }
            };

            if file_type.is_symlink() {
                // Symlinked directories can introduce cycles; symlinked
                // files are reachable through the sandboxed read path.
                tracing::debug!("skipping symlink during walk: {}", path.display());
                continue;
            }

            if file_type.is_dir() {
                let name = entry.file_name();
                if should_ignore_dir(&name.to_string_lossy()) {
                    continue;
                }
                if !self.matcher.is_ignored(relative, true) {
                    subdirs.push(path);
                }
            } else if file_type.is_file() && !self.matcher.is_ignored(relative, false) {
                self.queued.push_back(Ok(path));
            }
        }

        // Reverse so the stack pops subdirectories in sorted order.
        for sub in subdirs.into_iter().rev() {
            self.pending_dirs.push(sub);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn matcher(root: &Path, rules: &str) -> IgnoreMatcher {
        IgnoreMatcher::compile(root, rules).unwrap()
    }

    fn collect_relative(root: &Path, rules: &str) -> Vec<String> {
        walk(root, matcher(root, rules))
            .filter_map(|r| r.ok())
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_yields_only_files() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("pages")).unwrap();
        std::fs::write(dir.path().join("pages/a.md"), "- a").unwrap();
        std::fs::write(dir.path().join("top.md"), "- t").unwrap();

        let files = collect_relative(dir.path(), "");
        assert_eq!(files, vec!["top.md", "pages/a.md"]);
    }

    #[test]
    fn test_ignored_file_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "").unwrap();
        std::fs::write(dir.path().join("b.tmp"), "").unwrap();

        let files = collect_relative(dir.path(), "*.tmp\n");
        assert_eq!(files, vec!["a.md"]);
    }

    #[test]
    fn test_ignored_directory_pruned_entirely() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/pic.png"), "").unwrap();
        std::fs::write(dir.path().join("a.md"), "").unwrap();

        let files = collect_relative(dir.path(), "assets/\n");
        assert_eq!(files, vec!["a.md"]);
    }

    #[test]
    fn test_negated_rule_unignores() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("debug.log"), "").unwrap();
        std::fs::write(dir.path().join("keep.log"), "").unwrap();

        let files = collect_relative(dir.path(), "*.log\n!keep.log\n");
        assert_eq!(files, vec!["keep.log"]);
    }

    #[test]
    fn test_walk_is_restartable() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "").unwrap();

        let first = collect_relative(dir.path(), "");
        let second = collect_relative(dir.path(), "");
        assert_eq!(first, second);
    }

    #[test]
    fn test_depth_first_descends_into_nested_dirs() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        std::fs::write(dir.path().join("a/b/c/deep.md"), "").unwrap();

        let files = collect_relative(dir.path(), "");
        assert_eq!(files, vec!["a/b/c/deep.md"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_reported_but_siblings_complete() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("locked")).unwrap();
        std::fs::create_dir(dir.path().join("open")).unwrap();
        std::fs::write(dir.path().join("open/ok.md"), "").unwrap();
        std::fs::set_permissions(
            dir.path().join("locked"),
            std::fs::Permissions::from_mode(0o000),
        )
        .unwrap();

        let items: Vec<_> = walk(dir.path(), matcher(dir.path(), "")).collect();

        // Root bypasses permission bits (containers, CI); the locked
        // directory then just reads as empty instead of erroring.
        let errors = items.iter().filter(|r| r.is_err()).count();
        let files = items.iter().filter(|r| r.is_ok()).count();
        assert!(errors <= 1);
        assert_eq!(files, 1);

        // Restore permissions so TempDir can clean up.
        std::fs::set_permissions(
            dir.path().join("locked"),
            std::fs::Permissions::from_mode(0o755),
        )
        .unwrap();
    }
}
