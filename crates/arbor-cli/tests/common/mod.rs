//! Shared test utilities for arbor-cli integration tests.

use std::path::Path;

use assert_cmd::Command;

/// Get a Command for the arbor binary, bound to the given graph root.
///
/// # Panics
///
/// Panics if the arbor binary cannot be found. This should not happen
/// in a properly configured test environment.
#[allow(deprecated)]
pub fn arbor_cmd(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("arbor").expect("arbor binary should exist");
    cmd.arg("--root").arg(root).arg("--color").arg("never");
    cmd.env_remove("ARBOR_ROOT").env_remove("ARBOR_CONFIG");
    cmd
}
