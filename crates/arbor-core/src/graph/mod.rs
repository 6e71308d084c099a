//! Graph derivation over raw node content.
//!
//! A graph root is just a directory of text files; this module derives the
//! graph from it on demand. Nothing here persists derived state: every
//! query re-reads the files it touches, so content stays the single source
//! of truth.
//!
//! - [`links`] – outgoing-link extraction and backlink discovery
//! - [`search`] – global case-insensitive substring search
//! - [`query`] – the boolean AND query language and its evaluator

pub mod links;
pub mod query;
pub mod search;

pub use links::{extract_outgoing_links, find_backlinks, link_name_for};
pub use query::{parse_query, query_graph};
pub use search::search_global;
