//! # arbor-core
//!
//! **Arbor** – sandboxed graph-query and consistency layer for file-backed
//! knowledge graphs.
//!
//! A graph is a directory of Markdown outline files linked by `[[wikilink]]`
//! tokens. This crate provides the constrained API an autonomous agent uses
//! to manipulate such a graph: every caller-supplied path is bounded to the
//! graph root, every write is grammar-checked, and speculative edits can be
//! checkpointed and undone through the git collaborator.
//!
//! ## Main Types
//!
//! - [`GraphStore`] – the main entry point; binds a graph root and exposes
//!   every operation as a method
//! - [`ArborError`] – domain-specific error type
//! - [`QueryMatch`] / [`CommitEntry`] – operation result types
//!
//! ## Modules
//!
//! - [`sandbox`] – path resolution bounded to the graph root
//! - [`ignore_rules`] / [`walker`] – ignore-rule compilation and lazy
//!   directory walking
//! - [`outline`] – block-outline validation
//! - [`graph`] – link extraction, backlinks, search, and the query engine
//! - [`checkpoint`] / [`vcs`] – checkpoint semantics over the git stash
//! - [`config`] – global configuration
//!
//! ## Example
//!
//! ```ignore
//! use arbor_core::GraphStore;
//! use std::path::Path;
//!
//! let store = GraphStore::init(Path::new("/srv/graphs/main"))?;
//! store.write_file("people/x.md", "- # X\n  - type:: person")?;
//! store.write_file("notes/y.md", "- references [[x]]")?;
//!
//! assert_eq!(store.backlinks("people/x.md")?, vec!["notes/y.md"]);
//! let matches = store.query_graph("(property type:: person)")?;
//! ```

// Modules
pub mod checkpoint;
pub mod config;
pub mod constants;
pub mod errors;
pub mod graph;
pub mod ignore_rules;
pub mod outline;
pub mod sandbox;
pub mod store;
pub mod types;
pub mod vcs;
pub mod walker;

// Re-exports for convenience
pub use config::ArborConfig;
pub use constants::{
    is_node_path, should_ignore_dir, ALWAYS_IGNORED_DIRS, ARBOR_IGNORE_FILENAME,
    CHECKPOINT_MESSAGE, NODE_EXTENSION,
};
pub use errors::ArborError;
pub use graph::{extract_outgoing_links, link_name_for, parse_query};
pub use ignore_rules::IgnoreMatcher;
pub use outline::{validate, OutlineReport, OutlineViolation};
pub use sandbox::resolve_in_root;
pub use store::GraphStore;
pub use types::{CommitEntry, QueryCondition, QueryMatch};
pub use vcs::GitBackend;
pub use walker::{walk, NodeWalker};
