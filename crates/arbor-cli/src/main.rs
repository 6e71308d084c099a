//! # arbor CLI
//!
//! Command-line interface for the arbor knowledge store.
//!
//! This binary provides human-friendly access to `arbor-core` functionality.
//! Run `arbor --help` for usage information.

mod cli;
pub mod ui;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
