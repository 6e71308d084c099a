//! Version-control collaborator, driven through `git2`.
//!
//! This module is the **single doorway** to all git operations in arbor. No
//! other module imports `git2`; everything flows through [`GitBackend`],
//! which normalizes failures into [`ArborError::Backend`]. The backend holds
//! no state beyond the open repository handle and is constructed fresh for
//! each top-level operation.
//!
//! The checkpoint layer (see [`crate::checkpoint`]) builds its save/revert/
//! discard semantics on the stash and reset primitives exposed here; the
//! commit/diff/log surface is passed through largely as-is.

use std::fs;
use std::path::Path;

use chrono::{TimeZone, Utc};
use git2::{
    build::CheckoutBuilder, DiffFormat, DiffOptions, IndexAddOption, Repository, ResetType,
    Signature, Sort, StashApplyOptions, StashFlags, StatusOptions,
};

use crate::constants::{FALLBACK_SIGNATURE_EMAIL, FALLBACK_SIGNATURE_NAME};
use crate::errors::ArborError;
use crate::types::CommitEntry;

/// Handle to the git repository backing a graph root.
pub struct GitBackend {
    repo: Repository,
}

impl std::fmt::Debug for GitBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitBackend")
            .field("repo", &self.repo.path())
            .finish()
    }
}

impl GitBackend {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Open the repository at a graph root.
    ///
    /// The root must itself be the repository top level; arbor does not
    /// search parent directories, so a graph nested inside an unrelated
    /// repository is not silently adopted.
    pub fn open(root: &Path) -> Result<Self, ArborError> {
        let repo = Repository::open(root).map_err(|e| {
            ArborError::Backend(format!(
                "no git repository at {}: {}",
                root.display(),
                e.message()
            ))
        })?;
        Ok(Self { repo })
    }

    /// Open the repository at a graph root, initializing it (with an empty
    /// initial commit) when absent. Idempotent.
    pub fn open_or_init(root: &Path) -> Result<Self, ArborError> {
        if root.join(".git").exists() {
            return Self::open(root);
        }

        let repo = Repository::init(root)?;
        {
            let mut index = repo.index()?;
            let tree_id = index.write_tree()?;
            let tree = repo.find_tree(tree_id)?;
            let sig = signature(&repo)?;
            repo.commit(Some("HEAD"), &sig, &sig, "initialize graph", &tree, &[])?;
        }
        tracing::debug!("initialized git repository at {}", root.display());
        Ok(Self { repo })
    }

    // -------------------------------------------------------------------------
    // Staging & committing
    // -------------------------------------------------------------------------

    /// Stage every working-tree change, including new and deleted files.
    pub fn stage_all(&mut self) -> Result<(), ArborError> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        Ok(())
    }

    /// Stage everything and create a commit on HEAD. Returns the new hash.
    pub fn commit_all(&mut self, message: &str) -> Result<String, ArborError> {
        self.stage_all()?;

        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let sig = signature(&self.repo)?;

        let head = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = head.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        Ok(oid.to_string())
    }

    // -------------------------------------------------------------------------
    // Stash (the checkpoint undo log)
    // -------------------------------------------------------------------------

    /// Push the current working-tree state (tracked and untracked) onto the
    /// stash. Returns `false` when there was nothing to stash.
    ///
    /// Note that stashing resets the working tree; callers that want to keep
    /// editing follow up with [`GitBackend::stash_apply_latest`].
    pub fn stash_push(&mut self, message: &str) -> Result<bool, ArborError> {
        let sig = signature(&self.repo)?;
        match self
            .repo
            .stash_save2(&sig, Some(message), Some(StashFlags::INCLUDE_UNTRACKED))
        {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Re-apply the most recent stash entry without consuming it.
    pub fn stash_apply_latest(&mut self) -> Result<(), ArborError> {
        let mut opts = StashApplyOptions::new();
        self.repo.stash_apply(0, Some(&mut opts))?;
        Ok(())
    }

    /// Pop the most recent stash entry, re-applying it to the working tree.
    pub fn stash_pop_latest(&mut self) -> Result<(), ArborError> {
        let mut opts = StashApplyOptions::new();
        self.repo.stash_pop(0, Some(&mut opts))?;
        Ok(())
    }

    /// Number of entries on the stash stack.
    pub fn stash_len(&mut self) -> Result<usize, ArborError> {
        let mut count = 0usize;
        self.repo.stash_foreach(|_, _, _| {
            count += 1;
            true
        })?;
        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Working-tree state
    // -------------------------------------------------------------------------

    /// Hard-reset tracked files to HEAD.
    pub fn reset_hard(&self) -> Result<(), ArborError> {
        let target = self.repo.revparse_single("HEAD")?;
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.repo
            .reset(&target, ResetType::Hard, Some(&mut checkout))?;
        Ok(())
    }

    /// Delete untracked files and directories from the working tree.
    pub fn remove_untracked(&self) -> Result<(), ArborError> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| ArborError::Backend("bare repository has no working tree".into()))?;

        let mut opts = StatusOptions::new();
        opts.include_untracked(true).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        for entry in statuses.iter() {
            if !entry.status().is_wt_new() {
                continue;
            }
            let Some(rel) = entry.path() else { continue };
            let full = workdir.join(rel);
            let result = if full.is_dir() {
                fs::remove_dir_all(&full)
            } else {
                fs::remove_file(&full)
            };
            match result {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Relative paths of all modified, added, deleted, renamed, and
    /// untracked entries, sorted.
    pub fn changed_files(&self) -> Result<Vec<String>, ArborError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        let mut files: Vec<String> = statuses
            .iter()
            .filter_map(|e| e.path().map(str::to_string))
            .collect();
        files.sort();
        files.dedup();
        Ok(files)
    }

    // -------------------------------------------------------------------------
    // History
    // -------------------------------------------------------------------------

    /// Unified diff of the working tree (and index) against HEAD.
    ///
    /// With `path` set, the diff is restricted to that repository-relative
    /// path. Untracked file content is included.
    pub fn diff_text(&self, path: Option<&str>) -> Result<String, ArborError> {
        let head_tree = self.repo.head()?.peel_to_tree()?;

        let mut opts = DiffOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);
        if let Some(p) = path {
            opts.pathspec(p);
        }

        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(Some(&head_tree), Some(&mut opts))?;

        let mut out = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            let origin = line.origin();
            if matches!(origin, '+' | '-' | ' ') {
                out.push(origin);
            }
            out.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        Ok(out)
    }

    /// Walk the commit log from HEAD, newest first.
    pub fn log(&self, limit: Option<usize>) -> Result<Vec<CommitEntry>, ArborError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let mut entries: Vec<CommitEntry> = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            let date = Utc
                .timestamp_opt(commit.time().seconds(), 0)
                .single()
                .unwrap_or_else(Utc::now);
            entries.push(CommitEntry {
                hash: oid.to_string(),
                message: commit.message().unwrap_or("").trim_end().to_string(),
                date,
            });
            if limit.is_some_and(|l| entries.len() >= l) {
                break;
            }
        }
        Ok(entries)
    }
}

/// The repository's configured signature, or the arbor fallback when the
/// repository has none (fresh containers, CI).
fn signature(repo: &Repository) -> Result<Signature<'static>, git2::Error> {
    repo.signature()
        .or_else(|_| Signature::now(FALLBACK_SIGNATURE_NAME, FALLBACK_SIGNATURE_EMAIL))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo() -> (TempDir, GitBackend) {
        let dir = TempDir::new().unwrap();
        let backend = GitBackend::open_or_init(dir.path()).unwrap();
        (dir, backend)
    }

    #[test]
    fn test_open_or_init_creates_initial_commit() {
        let (_dir, backend) = repo();
        let log = backend.log(None).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].message, "initialize graph");
    }

    #[test]
    fn test_open_or_init_is_idempotent() {
        let (dir, _backend) = repo();
        let again = GitBackend::open_or_init(dir.path()).unwrap();
        assert_eq!(again.log(None).unwrap().len(), 1);
    }

    #[test]
    fn test_open_fails_without_repository() {
        let dir = TempDir::new().unwrap();
        let err = GitBackend::open(dir.path()).unwrap_err();
        assert!(matches!(err, ArborError::Backend(_)));
    }

    #[test]
    fn test_commit_all_records_changes() {
        let (dir, mut backend) = repo();
        std::fs::write(dir.path().join("a.md"), "- hello").unwrap();

        let hash = backend.commit_all("add a").unwrap();
        assert_eq!(hash.len(), 40);

        let log = backend.log(None).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].message, "add a");
        assert!(backend.changed_files().unwrap().is_empty());
    }

    #[test]
    fn test_changed_files_sees_untracked_and_modified() {
        let (dir, mut backend) = repo();
        std::fs::write(dir.path().join("a.md"), "- v1").unwrap();
        backend.commit_all("add a").unwrap();

        std::fs::write(dir.path().join("a.md"), "- v2").unwrap();
        std::fs::write(dir.path().join("b.md"), "- new").unwrap();

        assert_eq!(backend.changed_files().unwrap(), vec!["a.md", "b.md"]);
    }

    #[test]
    fn test_diff_text_shows_working_tree_edit() {
        let (dir, mut backend) = repo();
        std::fs::write(dir.path().join("a.md"), "- v1\n").unwrap();
        backend.commit_all("add a").unwrap();

        std::fs::write(dir.path().join("a.md"), "- v2\n").unwrap();
        let diff = backend.diff_text(None).unwrap();
        assert!(diff.contains("-- v1"));
        assert!(diff.contains("+- v2"));

        let scoped = backend.diff_text(Some("other.md")).unwrap();
        assert!(scoped.is_empty());
    }

    #[test]
    fn test_stash_push_and_pop_roundtrip() {
        let (dir, mut backend) = repo();
        std::fs::write(dir.path().join("a.md"), "- v1").unwrap();
        backend.commit_all("add a").unwrap();

        std::fs::write(dir.path().join("a.md"), "- v2").unwrap();
        assert!(backend.stash_push("wip").unwrap());
        assert_eq!(backend.stash_len().unwrap(), 1);
        // Stashing reset the tree to HEAD.
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.md")).unwrap(),
            "- v1"
        );

        backend.stash_pop_latest().unwrap();
        assert_eq!(backend.stash_len().unwrap(), 0);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.md")).unwrap(),
            "- v2"
        );
    }

    #[test]
    fn test_stash_push_clean_tree_is_noop() {
        let (_dir, mut backend) = repo();
        assert!(!backend.stash_push("nothing").unwrap());
        assert_eq!(backend.stash_len().unwrap(), 0);
    }

    #[test]
    fn test_reset_hard_and_remove_untracked() {
        let (dir, mut backend) = repo();
        std::fs::write(dir.path().join("a.md"), "- v1").unwrap();
        backend.commit_all("add a").unwrap();

        std::fs::write(dir.path().join("a.md"), "- dirty").unwrap();
        std::fs::create_dir(dir.path().join("new")).unwrap();
        std::fs::write(dir.path().join("new/b.md"), "- untracked").unwrap();

        backend.reset_hard().unwrap();
        backend.remove_untracked().unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.md")).unwrap(),
            "- v1"
        );
        assert!(!dir.path().join("new").exists());
        assert!(backend.changed_files().unwrap().is_empty());
    }
}
