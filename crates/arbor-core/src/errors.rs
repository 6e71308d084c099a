//! Error types for arbor-core.

use thiserror::Error;

use crate::outline::OutlineViolation;

/// Domain-specific errors for arbor operations.
#[derive(Error, Debug)]
pub enum ArborError {
    /// A caller-supplied path resolved outside the graph root.
    ///
    /// Always fatal to the call: never retried, never partially applied.
    /// Also raised for inputs that cannot be safely resolved at all
    /// (control characters, drive-letter or UNC prefixes).
    #[error("path escapes the graph root: {path}")]
    PathTraversal {
        /// The offending caller-supplied path.
        path: String,
    },

    /// A file or directory required by the operation does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The graph-relative path that was missing.
        path: String,
    },

    /// A document failed outline validation on write.
    ///
    /// Carries the full ordered violation list. The write is blocked
    /// entirely; partial writes are never permitted.
    #[error("document failed outline validation with {} violation(s)", .errors.len())]
    Validation {
        /// All violations found, in source line order.
        errors: Vec<OutlineViolation>,
    },

    /// An update's expected old content was not found verbatim in the target.
    #[error("expected content not found in {path}")]
    Conflict {
        /// The graph-relative path of the unmodified file.
        path: String,
    },

    /// The version-control collaborator reported a failure.
    #[error("git backend error: {0}")]
    Backend(String),

    /// A directory could not be opened during a walk.
    ///
    /// Reported per subtree; sibling subtrees still complete.
    #[error("could not read directory {path}: {message}")]
    DirRead {
        /// The directory that failed to open.
        path: std::path::PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The store configuration file exists but is invalid.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A wrapped generic error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<git2::Error> for ArborError {
    fn from(err: git2::Error) -> Self {
        ArborError::Backend(err.message().to_string())
    }
}

impl ArborError {
    /// Shorthand for a traversal rejection of the given caller input.
    pub(crate) fn traversal(path: impl Into<String>) -> Self {
        ArborError::PathTraversal { path: path.into() }
    }

    /// Shorthand for a missing-path error.
    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        ArborError::NotFound { path: path.into() }
    }
}
