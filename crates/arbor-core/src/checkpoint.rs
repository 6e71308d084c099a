//! Checkpoint semantics over the git stash.
//!
//! A checkpoint is a LIFO-stacked snapshot of uncommitted changes, distinct
//! from a committed revision. Three operations exist:
//!
//! - **save** pushes the current working-tree state onto the stash (and
//!   immediately re-applies it, so editing continues uninterrupted);
//! - **revert** pops the most recent entry and restores the tree to exactly
//!   that state;
//! - **discard** throws away all uncommitted changes without consuming a
//!   checkpoint.
//!
//! save/revert act purely on the stash stack and never touch commit history;
//! discard (and commit) act purely on tracked/committed state and never
//! touch the stash. Conflating the two would make "undo" and "clean up"
//! interfere, so the pairing is kept strict.

use std::path::Path;

use crate::constants::CHECKPOINT_MESSAGE;
use crate::errors::ArborError;
use crate::vcs::GitBackend;

/// Save a checkpoint of all current working-tree changes.
///
/// Stages everything, pushes a stash entry with the fixed marker message,
/// then re-applies it so the tree is byte-identical to before the call.
/// With a clean tree no entry is pushed; the call still succeeds (the no-op
/// marker), which makes save idempotent from the caller's perspective.
pub fn save(root: &Path) -> Result<bool, ArborError> {
    let mut git = GitBackend::open(root)?;
    git.stage_all()?;

    if git.stash_push(CHECKPOINT_MESSAGE)? {
        git.stash_apply_latest()?;
        tracing::debug!("checkpoint saved");
    } else {
        tracing::debug!("nothing to checkpoint; tree is clean");
    }
    Ok(true)
}

/// Revert the working tree to the most recent checkpoint, consuming it.
///
/// Only the single most recent checkpoint is addressable; there is no
/// random access into older entries while newer ones exist. Returns `false`
/// (not an error) when the stack is empty; "nothing to revert" is a valid
/// steady state.
pub fn revert(root: &Path) -> Result<bool, ArborError> {
    let mut git = GitBackend::open(root)?;

    if git.stash_len()? == 0 {
        tracing::debug!("no checkpoint to revert to");
        return Ok(false);
    }

    // The popped entry must land on a clean tree so the result is exactly
    // the checkpointed state, not a merge with whatever came after it.
    git.reset_hard()?;
    git.remove_untracked()?;
    git.stash_pop_latest()?;
    tracing::debug!("reverted to last checkpoint");
    Ok(true)
}

/// Irreversibly discard all uncommitted changes.
///
/// Resets tracked files to HEAD and removes untracked files and
/// directories. Does not consume a checkpoint entry and is not undoable by
/// [`revert`]. Succeeds on an already-clean tree.
pub fn discard(root: &Path) -> Result<bool, ArborError> {
    let git = GitBackend::open(root)?;
    git.reset_hard()?;
    git.remove_untracked()?;
    tracing::debug!("discarded working-tree changes");
    Ok(true)
}

// ============================================================================
// Tests
// ============================================================================
