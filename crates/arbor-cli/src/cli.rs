//! CLI definition and command dispatch for arbor.
//!
//! This module defines the command-line interface using `clap` and provides
//! the `run()` function that dispatches commands to the graph store.
//!
//! ## Root Resolution
//!
//! The graph root is resolved with the following precedence (highest to
//! lowest):
//! 1. `--root` flag
//! 2. `ARBOR_ROOT` environment variable
//! 3. `root` in the config file (`~/.arbor/config.yaml` or `--config`)
//! 4. The current directory

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use arbor_core::{ArborConfig, ArborError, GraphStore};

use crate::ui::{ColorMode, MessageType, Style};

// ============================================================================
// CLI Definition
// ============================================================================

/// Arbor – sandboxed, git-backed knowledge store
#[derive(Parser, Debug)]
#[command(name = "arbor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, env = "ARBOR_VERBOSE")]
    pub verbose: bool,

    /// Graph root directory (default: from config, then current directory)
    #[arg(long, global = true, env = "ARBOR_ROOT")]
    pub root: Option<PathBuf>,

    /// Path to configuration file (default: ~/.arbor/config.yaml)
    #[arg(long, global = true, env = "ARBOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Color output mode: always, never, or auto (default: auto)
    #[arg(long, global = true, env = "ARBOR_COLOR", default_value = "auto")]
    pub color: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a graph root (directory plus git repository)
    #[command(after_help = r#"EXAMPLES:
    # Initialize the current directory as a graph
    arbor init

    # Initialize a dedicated directory
    arbor --root ~/graphs/main init
"#)]
    Init,

    /// Resolve a relative path against the graph root (sandbox check)
    Resolve {
        /// Graph-relative path
        path: String,
    },

    /// Write (create or overwrite) a file
    #[command(after_help = r#"EXAMPLES:
    # Markdown nodes are validated against the outline grammar
    arbor write people/x.md "- # X
  - type:: person"
"#)]
    Write {
        /// Graph-relative path
        path: String,
        /// File content
        #[arg(allow_hyphen_values = true)]
        content: String,
    },

    /// Print a file's content
    Read {
        /// Graph-relative path
        path: String,
    },

    /// Replace the first occurrence of OLD with NEW in a file
    Update {
        /// Graph-relative path
        path: String,
        /// Text that must occur verbatim in the file
        old: String,
        /// Replacement text
        new: String,
    },

    /// Delete a file (or a directory with its contents)
    Rm {
        /// Graph-relative path
        path: String,
    },

    /// Rename (move) a file within the graph
    Mv {
        /// Source graph-relative path
        from: String,
        /// Destination graph-relative path
        to: String,
    },

    /// Check whether a path exists
    Exists {
        /// Graph-relative path
        path: String,
    },

    /// Create a directory (and missing parents)
    Mkdir {
        /// Graph-relative path
        path: String,
    },

    /// List the entries of a directory
    Ls {
        /// Graph-relative path (default: the root)
        #[arg(default_value = "")]
        path: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Validate a file against the outline grammar without writing
    Check {
        /// Graph-relative path
        path: String,
    },

    /// Show a node's outgoing links
    Links {
        /// Graph-relative path
        path: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the files linking to a node
    Backlinks {
        /// Graph-relative path
        path: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Case-insensitive substring search across the graph
    Search {
        /// Text to search for
        query: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Run a structured query across all Markdown nodes
    #[command(after_help = r#"EXAMPLES:
    # Property filter
    arbor query "(property status:: active)"

    # Conjunction of property and link conditions
    arbor query "(property type:: person) AND (outgoing-link [[Projects]])"
"#)]
    Query {
        /// Query string: (property k:: v) / (outgoing-link [[T]]) joined by AND
        query: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Save a checkpoint of all uncommitted changes
    #[command(after_help = r#"EXAMPLES:
    # Checkpoint before a speculative edit, then undo it
    arbor save && arbor write a.md "- risky edit" && arbor revert
"#)]
    Save,

    /// Revert to the most recent checkpoint (consumes it)
    Revert,

    /// Irreversibly discard all uncommitted changes
    Discard,

    /// Show the working-tree diff against the last commit
    Diff {
        /// Restrict to one graph-relative path
        path: Option<String>,
    },

    /// Show the commit log, newest first
    Log {
        /// Maximum number of entries to return
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List the files changed since the last commit
    Changed {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Stage everything and create a commit
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },
}

// ============================================================================
// Dispatch
// ============================================================================

/// Parse arguments, set up logging, and run the selected command.
///
/// Returns `ExitCode::SUCCESS` on success, or `ExitCode::FAILURE` on error.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    // - Always show warnings (for config issues, skipped files, etc.)
    // - Show debug info only when --verbose is set
    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = format!("arbor_core={log_level},arbor_cli={log_level}");

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&filter))
        .with_target(false)
        .init();

    let color_mode = ColorMode::from_str(&cli.color).unwrap_or(ColorMode::Auto);
    let style = Style::new(color_mode);

    let root = match resolve_root(&cli) {
        Ok(root) => root,
        Err(e) => {
            eprintln!(
                "{}",
                style.error_with_context(
                    "Failed to resolve graph root",
                    Some(&e.to_string()),
                    Some("Pass --root, set ARBOR_ROOT, or configure ~/.arbor/config.yaml"),
                )
            );
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!("graph root: {}", root.display());

    let result = match &cli.command {
        Command::Init => handle_init(&style, &root),
        command => {
            let store = match GraphStore::open(&root) {
                Ok(store) => store,
                Err(e) => {
                    eprintln!(
                        "{}",
                        style.error_with_context(
                            &format!("Cannot open graph root {}", root.display()),
                            Some(&e.to_string()),
                            Some("Run `arbor init` first"),
                        )
                    );
                    return ExitCode::FAILURE;
                }
            };
            dispatch(&style, &store, command)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let rendered = match e.downcast_ref::<ArborError>() {
                Some(err) => render_error(err),
                None => e.to_string(),
            };
            eprintln!("{}", style.message(MessageType::Err, &rendered));
            ExitCode::FAILURE
        }
    }
}

/// Resolve the graph root from flags, env, config file, and cwd.
fn resolve_root(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(root) = &cli.root {
        return Ok(root.clone());
    }

    let config = match &cli.config {
        Some(path) => ArborConfig::from_path(path)?,
        None => ArborConfig::load_default()?,
    };
    if let Some(root) = config.root {
        return Ok(root);
    }

    Ok(std::env::current_dir()?)
}

fn dispatch(style: &Style, store: &GraphStore, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::Init => unreachable!("handled before the store is opened"),

        Command::Resolve { path } => {
            println!("{}", store.resolve(path)?.display());
        }

        Command::Write { path, content } => {
            store.write_file(path, content)?;
            println!("{}", style.message(MessageType::Ok, &format!("wrote {path}")));
        }

        Command::Read { path } => {
            print!("{}", store.read_file(path)?);
        }

        Command::Update { path, old, new } => {
            store.update_file(path, old, new)?;
            println!("{}", style.message(MessageType::Ok, &format!("updated {path}")));
        }

        Command::Rm { path } => {
            store.delete_file(path)?;
            println!("{}", style.message(MessageType::Ok, &format!("deleted {path}")));
        }

        Command::Mv { from, to } => {
            store.rename_file(from, to)?;
            println!(
                "{}",
                style.message(MessageType::Ok, &format!("renamed {from} -> {to}"))
            );
        }

        Command::Exists { path } => {
            println!("{}", store.exists(path)?);
        }

        Command::Mkdir { path } => {
            store.create_dir(path)?;
            println!("{}", style.message(MessageType::Ok, &format!("created {path}")));
        }

        Command::Ls { path, json } => {
            let names = store.list_files(path)?;
            print_names(&names, *json)?;
        }

        Command::Check { path } => {
            let content = store.read_file(path)?;
            let report = arbor_core::validate(&content);
            if report.is_valid {
                println!("{}", style.message(MessageType::Ok, &format!("{path} is valid")));
            } else {
                for violation in &report.errors {
                    println!(
                        "{}",
                        style.message(
                            MessageType::Err,
                            &format!("{path}:{}: {}", violation.line, violation.message)
                        )
                    );
                }
                anyhow::bail!("{path} has {} violation(s)", report.errors.len());
            }
        }

        Command::Links { path, json } => {
            let links = store.outgoing_links(path)?;
            print_names(&links, *json)?;
        }

        Command::Backlinks { path, json } => {
            let backlinks = store.backlinks(path)?;
            print_names(&backlinks, *json)?;
        }

        Command::Search { query, json } => {
            let hits = store.search_global(query)?;
            print_names(&hits, *json)?;
        }

        Command::Query { query, json } => {
            let results = store.query_graph(query)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for result in &results {
                    println!("{}: {}", result.file_path, result.matches.join(" | "));
                }
            }
        }

        Command::Save => {
            store.save_checkpoint()?;
            println!("{}", style.message(MessageType::Ok, "checkpoint saved"));
        }

        Command::Revert => {
            if store.revert_to_last_checkpoint()? {
                println!("{}", style.message(MessageType::Ok, "reverted to last checkpoint"));
            } else {
                println!("{}", style.message(MessageType::Info, "no checkpoint to revert to"));
            }
        }

        Command::Discard => {
            store.discard_changes()?;
            println!("{}", style.message(MessageType::Ok, "discarded all changes"));
        }

        Command::Diff { path } => {
            print!("{}", store.diff(path.as_deref())?);
        }

        Command::Log { limit, json } => {
            let entries = store.log(*limit)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in &entries {
                    println!(
                        "{} {} {}",
                        &entry.hash[..8.min(entry.hash.len())],
                        entry.date.format("%Y-%m-%d %H:%M:%S"),
                        entry.message.lines().next().unwrap_or("")
                    );
                }
            }
        }

        Command::Changed { json } => {
            let files = store.changed_files()?;
            print_names(&files, *json)?;
        }

        Command::Commit { message } => {
            let hash = store.commit(message)?;
            println!("{}", style.message(MessageType::Ok, &format!("committed {hash}")));
        }
    }

    Ok(())
}

fn handle_init(style: &Style, root: &std::path::Path) -> anyhow::Result<()> {
    let store = GraphStore::init(root)?;
    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!("graph initialized at {}", store.root().display())
        )
    );
    Ok(())
}

/// Print a list as lines, or as a JSON array with `--json`.
fn print_names(names: &[String], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(names)?);
    } else {
        for name in names {
            println!("{name}");
        }
    }
    Ok(())
}

// Validation errors carry their violation list; surface it line by line
// instead of only the summary count.
fn render_error(err: &ArborError) -> String {
    match err {
        ArborError::Validation { errors } => {
            let mut out = err.to_string();
            for violation in errors {
                out.push_str(&format!("\n     line {}: {}", violation.line, violation.message));
            }
            out
        }
        _ => err.to_string(),
    }
}
