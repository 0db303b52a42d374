//! engine::guard
//!
//! Working directory guard.
//!
//! A rewrite never changes the tree of the branch tip, but it does move the
//! branch HEAD points at, and a dirty index on top of a moving HEAD is easy
//! to lose. The guard therefore decides, before the operation runs, whether
//! local changes are in the way:
//!
//! - clean: the operation runs directly
//! - dirty with auto-stash: changes are stashed, the operation runs, and the
//!   stash is popped afterwards on success and on failure
//! - dirty without auto-stash: [`EngineError::DirtyWorkingDirectory`], and the
//!   operation never runs
//!
//! "Dirty" means staged or unstaged changes to tracked files, or unresolved
//! conflicts. Untracked files neither count nor get stashed.
//!
//! # Invariants
//!
//! - A stash entry created here is popped exactly once on every exit path
//! - A pop that fails leaves the entry in place and is always reported
//!
//! # Example
//!
//! ```
//! use git_rewrite::engine::guard;
//! use git_rewrite::git::MemoryStore;
//!
//! let mut store = MemoryStore::new();
//! store.commit("initial", &[("README", "hello")]);
//! store.write_file("README", "edited");
//!
//! let guarded = guard::run(&mut store, true, |_store| Ok(())).unwrap();
//! assert!(guarded.stashed);
//! assert_eq!(store.worktree_files()["README"], "edited");
//! ```

use tracing::{debug, info, warn};

use super::error::EngineError;
use crate::core::types::Oid;
use crate::git::{ObjectStore, StashHandle};

/// Message recorded on stash entries created by the guard.
pub const STASH_MESSAGE: &str = "git-rewrite-auto-stash";

/// Result of an operation that ran under the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guarded<T> {
    pub value: T,
    /// Whether local changes were stashed and restored around the operation.
    pub stashed: bool,
}

impl<T> Guarded<T> {
    /// A result produced without a working tree check.
    pub fn unguarded(value: T) -> Self {
        Self {
            value,
            stashed: false,
        }
    }
}

/// What an operation left behind, reported if the stash cannot be restored.
pub trait Landing {
    /// New tip of the branch, if the operation moved one.
    fn landed_tip(&self) -> Option<&Oid> {
        None
    }
}

impl Landing for () {}

/// Local changes parked for the duration of an operation.
///
/// Created by [`StashScope::enter`]; call [`StashScope::finish`] to restore.
/// Dropping the scope without finishing (a panic in the operation) makes a
/// best-effort restore and logs a warning if that fails.
pub struct StashScope<'a, S: ObjectStore> {
    store: &'a mut S,
    handle: Option<StashHandle>,
}

impl<'a, S: ObjectStore> StashScope<'a, S> {
    /// Check the working tree and stash local changes if allowed.
    ///
    /// # Errors
    ///
    /// - [`EngineError::DirtyWorkingDirectory`] if dirty and `auto_stash` is off
    /// - [`EngineError::Store`] if the status check or stash fails
    pub fn enter(store: &'a mut S, auto_stash: bool) -> Result<Self, EngineError> {
        let status = store.worktree_status(false)?;
        if status.is_clean() {
            debug!("working tree clean");
            return Ok(Self {
                store,
                handle: None,
            });
        }
        if !auto_stash {
            return Err(EngineError::DirtyWorkingDirectory {
                details: status.describe(),
            });
        }

        let handle = store.stash_save(STASH_MESSAGE)?;
        info!(%handle, changes = %status.describe(), "stashed local changes");
        Ok(Self {
            store,
            handle: Some(handle),
        })
    }

    /// The store, for the guarded operation.
    pub fn store(&mut self) -> &mut S {
        &mut *self.store
    }

    pub fn is_stashed(&self) -> bool {
        self.handle.is_some()
    }

    /// Restore stashed changes and hand back the operation's result.
    ///
    /// A failed restore wins over the operation's result: the caller learns
    /// that the stash is still there, and the error records whether the
    /// operation itself landed or failed.
    pub fn finish<T: Landing>(
        mut self,
        result: Result<T, EngineError>,
    ) -> Result<Guarded<T>, EngineError> {
        let stashed = self.handle.is_some();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = self.store.stash_pop(&handle) {
                warn!(%handle, error = %err, "stashed changes kept; restore them by hand");
                return Err(EngineError::StashRestoreConflict {
                    new_tip: result.as_ref().ok().and_then(|v| v.landed_tip().cloned()),
                    operation_error: result.as_ref().err().map(|e| e.to_string()),
                    message: err.to_string(),
                    stash: handle,
                });
            }
            info!(%handle, "restored local changes");
        }
        result.map(|value| Guarded { value, stashed })
    }
}

impl<S: ObjectStore> Drop for StashScope<'_, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = self.store.stash_pop(&handle) {
                warn!(%handle, error = %err, "could not restore stashed changes while unwinding");
            }
        }
    }
}

/// Run `operation` under the working directory guard.
///
/// # Errors
///
/// Whatever [`StashScope::enter`] and `operation` return, plus
/// [`EngineError::StashRestoreConflict`] when the stash cannot be restored.
pub fn run<S, T, F>(store: &mut S, auto_stash: bool, operation: F) -> Result<Guarded<T>, EngineError>
where
    S: ObjectStore,
    T: Landing,
    F: FnOnce(&mut S) -> Result<T, EngineError>,
{
    let mut scope = StashScope::enter(store, auto_stash)?;
    let result = operation(scope.store());
    scope.finish(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::memory::{FailOn, MemoryOp};
    use crate::git::MemoryStore;

    fn dirty_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.commit("initial", &[("a.txt", "1"), ("b.txt", "1")]);
        store.write_file("a.txt", "unstaged");
        store.write_file("b.txt", "staged");
        store.stage("b.txt");
        store
    }

    #[test]
    fn clean_tree_runs_directly() {
        let mut store = MemoryStore::new();
        store.commit("initial", &[("a.txt", "1")]);
        store.write_file("untracked.txt", "x");

        let guarded = run(&mut store, false, |_| Ok(())).unwrap();
        assert!(!guarded.stashed);
        assert!(!store.operations().contains(&MemoryOp::StashSave));
    }

    #[test]
    fn dirty_without_auto_stash_never_runs() {
        let mut store = dirty_store();
        let mut ran = false;

        let err = run(&mut store, false, |_| {
            ran = true;
            Ok(())
        })
        .unwrap_err();

        assert!(matches!(err, EngineError::DirtyWorkingDirectory { .. }));
        assert!(!ran);
        assert_eq!(store.stash_count(), 0);
    }

    #[test]
    fn dirty_with_auto_stash_restores_on_success() {
        let mut store = dirty_store();
        let before = (store.worktree_files(), store.index_files());

        let guarded = run(&mut store, true, |inner| {
            assert!(inner.worktree_status(false)?.is_clean());
            Ok(())
        })
        .unwrap();

        assert!(guarded.stashed);
        assert_eq!((store.worktree_files(), store.index_files()), before);
        assert_eq!(store.stash_count(), 0);
    }

    #[test]
    fn dirty_with_auto_stash_restores_on_failure() {
        let mut store = dirty_store();
        let before = store.worktree_files();

        let err = run::<_, (), _>(&mut store, true, |_| Err(EngineError::EmptySquashSet))
            .unwrap_err();

        assert!(matches!(err, EngineError::EmptySquashSet));
        assert_eq!(store.worktree_files(), before);
        assert_eq!(store.stash_count(), 0);
    }

    #[test]
    fn failed_pop_keeps_stash_and_reports() {
        let mut store = dirty_store();
        store.fail_on(FailOn::StashPop);

        let err = run(&mut store, true, |_| Ok(())).unwrap_err();

        match err {
            EngineError::StashRestoreConflict {
                new_tip,
                operation_error,
                ..
            } => {
                assert_eq!(new_tip, None);
                assert_eq!(operation_error, None);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.stash_count(), 1);
    }

    #[test]
    fn failed_pop_carries_operation_error() {
        let mut store = dirty_store();
        store.fail_on(FailOn::StashPop);

        let err = run::<_, (), _>(&mut store, true, |_| Err(EngineError::EmptySquashSet))
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::StashRestoreConflict {
                operation_error: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn failed_stash_save_is_reported() {
        let mut store = dirty_store();
        store.fail_on(FailOn::StashSave);

        let err = run(&mut store, true, |_| Ok(())).unwrap_err();
        assert!(matches!(err, EngineError::Store(_)));
    }

    #[test]
    fn dropped_scope_restores() {
        let mut store = dirty_store();
        let before = store.worktree_files();
        {
            let scope = StashScope::enter(&mut store, true).unwrap();
            assert!(scope.is_stashed());
        }
        assert_eq!(store.worktree_files(), before);
        assert_eq!(store.stash_count(), 0);
    }
}
