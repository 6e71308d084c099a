//! The graph store – arbor's main entry point.
//!
//! A [`GraphStore`] binds the graph root at construction and exposes every
//! store operation as a method: sandboxed file I/O, link and query
//! derivation, and checkpoint/commit control. Callers never pass the root
//! around; the bound configuration travels with the store.
//!
//! The store holds no other state. Ignore rules are recompiled and the git
//! backend reopened on each operation that needs them, so nothing cached
//! survives between calls and on-disk edits (to `.arborignore`, to the
//! repository) take effect immediately.

use std::fs;
use std::path::{Path, PathBuf};

use crate::checkpoint;
use crate::constants::is_node_path;
use crate::errors::ArborError;
use crate::graph::{extract_outgoing_links, find_backlinks};
use crate::ignore_rules::IgnoreMatcher;
use crate::outline;
use crate::types::{CommitEntry, QueryMatch};
use crate::vcs::GitBackend;
use crate::walker::relative_display;

/// Check if a path is a disk root (e.g. `/` on Unix, `C:\` on Windows).
///
/// Refusing disk roots keeps a mistyped configuration from turning the
/// whole filesystem into "the graph".
fn is_disk_root(path: &Path) -> bool {
    path.parent().is_none()
}

/// A knowledge graph rooted at one directory.
///
/// # Construction
///
/// Use [`GraphStore::open`] for an existing graph, or [`GraphStore::init`]
/// to create the directory and its git repository in one step.
///
/// # Example
///
/// ```ignore
/// use arbor_core::GraphStore;
/// use std::path::Path;
///
/// let store = GraphStore::init(Path::new("/srv/graphs/main"))?;
/// store.write_file("pages/contact.md", "- # Contact")?;
/// let hits = store.search_global("contact")?;
/// ```
#[derive(Debug, Clone)]
pub struct GraphStore {
    /// Absolute, symlink-resolved graph root; the sandbox boundary.
    root: PathBuf,
}

impl GraphStore {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Open an existing graph root.
    ///
    /// # Errors
    ///
    /// Returns [`ArborError::NotFound`] if the path does not exist or is not
    /// a directory, and an error for disk roots.
    pub fn open(root: &Path) -> Result<Self, ArborError> {
        let root = root
            .canonicalize()
            .map_err(|_| ArborError::not_found(root.display().to_string()))?;

        if !root.is_dir() {
            return Err(ArborError::not_found(root.display().to_string()));
        }

        if is_disk_root(&root) {
            return Err(ArborError::InvalidConfig(format!(
                "refusing to use disk root {} as a graph root",
                root.display()
            )));
        }

        Ok(Self { root })
    }

    /// Create a graph root (directory plus git repository) and open it.
    ///
    /// Idempotent: an existing graph is opened as-is, and a missing git
    /// repository is initialized with an empty initial commit so checkpoint
    /// and commit operations work from the start.
    pub fn init(root: &Path) -> Result<Self, ArborError> {
        fs::create_dir_all(root)?;
        let store = Self::open(root)?;
        GitBackend::open_or_init(&store.root)?;
        tracing::info!(root = %store.root.display(), "graph root initialized");
        Ok(store)
    }

    /// The absolute graph root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an untrusted relative path against the graph root.
    ///
    /// See [`crate::sandbox::resolve_in_root`] for the full contract. Every
    /// other operation on this store goes through this gate before touching
    /// the filesystem.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ArborError> {
        crate::sandbox::resolve_in_root(&self.root, relative)
    }

    /// Compile the root's ignore file. Called per operation; never cached.
    fn matcher(&self) -> Result<IgnoreMatcher, ArborError> {
        IgnoreMatcher::from_root(&self.root)
    }

    // -------------------------------------------------------------------------
    // File operations
    // -------------------------------------------------------------------------

    /// Read a file's content as UTF-8 text.
    pub fn read_file(&self, relative: &str) -> Result<String, ArborError> {
        let path = self.resolve(relative)?;
        if !path.is_file() {
            return Err(ArborError::not_found(relative));
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Write (create or overwrite) a file.
    ///
    /// Markdown nodes pass through the outline validator first; a document
    /// with violations blocks the write entirely; partial writes are never
    /// permitted. Missing parent directories are created.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<(), ArborError> {
        let path = self.resolve(relative)?;
        self.validate_node_content(&path, content)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        tracing::debug!(path = %relative, bytes = content.len(), "wrote file");
        Ok(())
    }

    /// Replace the first occurrence of `old` with `new` in a file.
    ///
    /// # Errors
    ///
    /// [`ArborError::NotFound`] if the file is missing;
    /// [`ArborError::Conflict`] if `old` does not occur verbatim; the file
    /// is left unmodified in both cases.
    pub fn update_file(&self, relative: &str, old: &str, new: &str) -> Result<(), ArborError> {
        let path = self.resolve(relative)?;
        if !path.is_file() {
            return Err(ArborError::not_found(relative));
        }

        let current = fs::read_to_string(&path)?;
        if !current.contains(old) {
            return Err(ArborError::Conflict {
                path: relative.to_string(),
            });
        }

        let updated = current.replacen(old, new, 1);
        self.validate_node_content(&path, &updated)?;
        fs::write(&path, updated)?;
        tracing::debug!(path = %relative, "updated file");
        Ok(())
    }

    /// Delete a file, or a directory with its contents.
    pub fn delete_file(&self, relative: &str) -> Result<(), ArborError> {
        let path = self.resolve(relative)?;
        if path.is_dir() {
            fs::remove_dir_all(path)?;
        } else if path.is_file() {
            fs::remove_file(path)?;
        } else {
            return Err(ArborError::not_found(relative));
        }
        tracing::debug!(path = %relative, "deleted");
        Ok(())
    }

    /// Rename (move) a file within the graph.
    ///
    /// Both endpoints are sandbox-checked; missing parent directories of
    /// the destination are created.
    pub fn rename_file(&self, from: &str, to: &str) -> Result<(), ArborError> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;

        if !source.exists() {
            return Err(ArborError::not_found(from));
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(source, target)?;
        tracing::debug!(from = %from, to = %to, "renamed");
        Ok(())
    }

    /// Check whether a path exists inside the graph.
    pub fn exists(&self, relative: &str) -> Result<bool, ArborError> {
        Ok(self.resolve(relative)?.exists())
    }

    /// Create a directory (and any missing parents).
    pub fn create_dir(&self, relative: &str) -> Result<(), ArborError> {
        let path = self.resolve(relative)?;
        fs::create_dir_all(path)?;
        Ok(())
    }

    /// List the immediate, non-ignored entry names of a directory, sorted.
    pub fn list_files(&self, relative: &str) -> Result<Vec<String>, ArborError> {
        let dir = self.resolve(relative)?;
        if !dir.is_dir() {
            return Err(ArborError::not_found(relative));
        }

        let matcher = self.matcher()?;
        let mut names: Vec<String> = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let Ok(rel) = path.strip_prefix(&self.root) else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = path.is_dir();
            if is_dir && crate::constants::should_ignore_dir(&name) {
                continue;
            }
            if matcher.is_ignored(rel, is_dir) {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }

    /// Validate Markdown node content before it is persisted.
    fn validate_node_content(&self, path: &Path, content: &str) -> Result<(), ArborError> {
        if !is_node_path(path) {
            return Ok(());
        }
        let report = outline::validate(content);
        if report.is_valid {
            Ok(())
        } else {
            Err(ArborError::Validation {
                errors: report.errors,
            })
        }
    }

    // -------------------------------------------------------------------------
    // Graph operations
    // -------------------------------------------------------------------------

    /// The outgoing-link targets of one node, in first-occurrence order.
    pub fn outgoing_links(&self, relative: &str) -> Result<Vec<String>, ArborError> {
        let content = self.read_file(relative)?;
        Ok(extract_outgoing_links(&content))
    }

    /// The graph-relative paths of all files linking to the given node.
    pub fn backlinks(&self, relative: &str) -> Result<Vec<String>, ArborError> {
        let target = self.resolve(relative)?;
        find_backlinks(&self.root, self.matcher()?, &target)
    }

    /// Case-insensitive substring search across the whole graph.
    pub fn search_global(&self, query: &str) -> Result<Vec<String>, ArborError> {
        crate::graph::search_global(&self.root, self.matcher()?, query)
    }

    /// Evaluate a structured query across all Markdown nodes.
    pub fn query_graph(&self, query: &str) -> Result<Vec<QueryMatch>, ArborError> {
        crate::graph::query_graph(&self.root, self.matcher()?, query)
    }

    // -------------------------------------------------------------------------
    // Checkpoints & version control
    // -------------------------------------------------------------------------

    /// Save a checkpoint of all uncommitted changes. See [`checkpoint::save`].
    pub fn save_checkpoint(&self) -> Result<bool, ArborError> {
        checkpoint::save(&self.root)
    }

    /// Revert to the most recent checkpoint. See [`checkpoint::revert`].
    pub fn revert_to_last_checkpoint(&self) -> Result<bool, ArborError> {
        checkpoint::revert(&self.root)
    }

    /// Discard all uncommitted changes. See [`checkpoint::discard`].
    pub fn discard_changes(&self) -> Result<bool, ArborError> {
        checkpoint::discard(&self.root)
    }

    /// Unified diff of the working tree against the last commit, optionally
    /// restricted to one graph-relative path.
    pub fn diff(&self, relative: Option<&str>) -> Result<String, ArborError> {
        let pathspec = match relative {
            Some(rel) => {
                let resolved = self.resolve(rel)?;
                Some(relative_display(&self.root, &resolved))
            }
            None => None,
        };
        GitBackend::open(&self.root)?.diff_text(pathspec.as_deref())
    }

    /// The commit log, newest first.
    pub fn log(&self, limit: Option<usize>) -> Result<Vec<CommitEntry>, ArborError> {
        GitBackend::open(&self.root)?.log(limit)
    }

    /// Paths changed since the last commit (including untracked files).
    pub fn changed_files(&self) -> Result<Vec<String>, ArborError> {
        GitBackend::open(&self.root)?.changed_files()
    }

    /// Stage everything and create a commit. Returns the new hash.
    pub fn commit(&self, message: &str) -> Result<String, ArborError> {
        let hash = GitBackend::open(&self.root)?.commit_all(message)?;
        tracing::info!(hash = %hash, "created commit");
        Ok(hash)
    }
}

// ============================================================================
// Tests
// ============================================================================
