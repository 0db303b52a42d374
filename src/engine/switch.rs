//! engine::switch
//!
//! Branch switching under the working directory guard.
//!
//! Local changes are handled exactly as for a rewrite: a dirty tree is
//! refused unless auto-stash is on, in which case the changes are stashed,
//! the branch is checked out and the changes are re-applied on top of it.

use serde::Serialize;
use tracing::{debug, info};

use super::error::EngineError;
use super::guard::{self, Landing};
use crate::core::types::BranchName;
use crate::git::{GitError, ObjectStore};

/// Result of [`switch_branch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchOutcome {
    pub branch: BranchName,
    /// Branch HEAD pointed at before, `None` if detached.
    pub previous: Option<BranchName>,
    /// Whether local changes were carried over through a stash.
    pub stashed: bool,
}

struct Switched;

impl Landing for Switched {}

/// Check out the local branch `branch`.
///
/// Switching to the branch already checked out does nothing.
///
/// # Errors
///
/// - [`EngineError::OperationInProgress`] if a rebase, merge or similar is paused
/// - [`EngineError::Store`] if the branch does not exist or checkout fails
/// - [`EngineError::DirtyWorkingDirectory`] and
///   [`EngineError::StashRestoreConflict`] from the guard
pub fn switch_branch<S: ObjectStore>(
    store: &mut S,
    branch: &BranchName,
    auto_stash: bool,
) -> Result<SwitchOutcome, EngineError> {
    let state = store.state();
    if state.is_in_progress() {
        return Err(EngineError::OperationInProgress { state });
    }
    if store.branch_tip(branch)?.is_none() {
        return Err(EngineError::Store(GitError::RefNotFound {
            refname: format!("refs/heads/{branch}"),
        }));
    }

    let previous = store.current_branch()?;
    if previous.as_ref() == Some(branch) {
        debug!(%branch, "already on branch");
        return Ok(SwitchOutcome {
            branch: branch.clone(),
            previous,
            stashed: false,
        });
    }

    let guarded = guard::run(store, auto_stash, |store| {
        store.checkout_branch(branch)?;
        Ok(Switched)
    })?;
    info!(%branch, stashed = guarded.stashed, "switched branch");

    Ok(SwitchOutcome {
        branch: branch.clone(),
        previous,
        stashed: guarded.stashed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::memory::MemoryOp;
    use crate::git::MemoryStore;

    fn two_branches() -> MemoryStore {
        let store = MemoryStore::new();
        let base = store.commit("base", &[("shared.txt", "1"), ("main.txt", "m")]);
        store.create_branch("topic", &base);
        store.commit("main only", &[("main.txt", "m2")]);
        store
    }

    fn topic() -> BranchName {
        BranchName::new("topic").unwrap()
    }

    #[test]
    fn clean_switch() {
        let mut store = two_branches();
        let out = switch_branch(&mut store, &topic(), false).unwrap();

        assert_eq!(out.previous, Some(BranchName::new("main").unwrap()));
        assert!(!out.stashed);
        assert_eq!(store.current_branch().unwrap(), Some(topic()));
        assert_eq!(store.worktree_files()["main.txt"], "m");
    }

    #[test]
    fn dirty_switch_refused_without_auto_stash() {
        let mut store = two_branches();
        store.write_file("shared.txt", "edited");

        let err = switch_branch(&mut store, &topic(), false).unwrap_err();
        assert!(matches!(err, EngineError::DirtyWorkingDirectory { .. }));
        assert_eq!(store.current_branch().unwrap(), Some(BranchName::new("main").unwrap()));
    }

    #[test]
    fn dirty_switch_carries_changes() {
        let mut store = two_branches();
        store.write_file("shared.txt", "edited");

        let out = switch_branch(&mut store, &topic(), true).unwrap();
        assert!(out.stashed);
        assert_eq!(store.current_branch().unwrap(), Some(topic()));
        assert_eq!(store.worktree_files()["shared.txt"], "edited");
        assert_eq!(store.stash_count(), 0);
    }

    #[test]
    fn missing_branch() {
        let mut store = two_branches();
        let err = switch_branch(&mut store, &BranchName::new("nope").unwrap(), true).unwrap_err();
        assert!(matches!(err, EngineError::Store(GitError::RefNotFound { .. })));
    }

    #[test]
    fn same_branch_is_noop() {
        let mut store = two_branches();
        store.clear_operations();
        store.write_file("shared.txt", "edited");

        let out = switch_branch(&mut store, &BranchName::new("main").unwrap(), false).unwrap();
        assert!(!out.stashed);
        assert!(!store
            .operations()
            .iter()
            .any(|op| matches!(op, MemoryOp::Checkout { .. } | MemoryOp::StashSave)));
    }
}
