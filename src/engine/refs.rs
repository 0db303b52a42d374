//! engine::refs
//!
//! Reference updater.
//!
//! The last step of a rewrite: one compare-and-set of `refs/heads/<branch>`
//! from the tip the rewrite started from to the tip it produced. If anything
//! else moved the branch in between, nothing is changed and the caller gets
//! a retryable [`EngineError::RefUpdateFailure`].
//!
//! The old tip stays in the branch's reflog under a `git-rewrite: <reason>`
//! entry, which is how a rewrite is undone.

use tracing::info;

use super::error::EngineError;
use crate::core::types::{BranchName, Oid};
use crate::git::{GitError, ObjectStore};

/// Prefix of every reflog message written by a rewrite.
pub const REFLOG_PREFIX: &str = "git-rewrite";

pub fn reflog_message(reason: &str) -> String {
    format!("{REFLOG_PREFIX}: {reason}")
}

/// Move `branch` from `expected_tip` to `new_tip`.
///
/// # Errors
///
/// - [`EngineError::RefUpdateFailure`] if the branch is no longer at `expected_tip`
/// - [`EngineError::Store`] for any other failure
pub fn advance<S: ObjectStore + ?Sized>(
    store: &S,
    branch: &BranchName,
    expected_tip: &Oid,
    new_tip: &Oid,
    reason: &str,
) -> Result<(), EngineError> {
    match store.update_branch(branch, new_tip, expected_tip, &reflog_message(reason)) {
        Ok(()) => {
            info!(
                %branch,
                from = %expected_tip.short(7),
                to = %new_tip.short(7),
                reason,
                "branch updated"
            );
            Ok(())
        }
        Err(GitError::CasFailed { actual, .. }) => Err(EngineError::RefUpdateFailure {
            branch: branch.clone(),
            expected: expected_tip.clone(),
            actual,
        }),
        Err(other) => Err(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MemoryStore;

    fn main() -> BranchName {
        BranchName::new("main").unwrap()
    }

    #[test]
    fn advance_records_reflog() {
        let store = MemoryStore::new();
        let a = store.commit("A", &[("f", "1")]);
        let b = store.commit("B", &[("f", "2")]);

        advance(&store, &main(), &b, &a, "reword 1234567").unwrap();

        assert_eq!(store.tip("main"), Some(a.clone()));
        let entry = store.reflog("main").pop().unwrap();
        assert_eq!(entry.message, "git-rewrite: reword 1234567");
        assert_eq!(entry.old, Some(b));
        assert_eq!(entry.new, a);
    }

    #[test]
    fn moved_branch_is_retryable_failure() {
        let store = MemoryStore::new();
        let a = store.commit("A", &[("f", "1")]);
        let b = store.commit("B", &[("f", "2")]);
        let c = store.commit("C", &[("f", "3")]);

        let err = advance(&store, &main(), &b, &a, "x").unwrap_err();

        assert!(err.is_retryable());
        assert!(matches!(
            err,
            EngineError::RefUpdateFailure { ref actual, .. } if *actual == c.to_string()
        ));
        assert_eq!(store.tip("main"), Some(c));
    }

    #[test]
    fn missing_target_is_store_error() {
        let store = MemoryStore::new();
        let a = store.commit("A", &[("f", "1")]);

        let err = advance(&store, &main(), &a, &Oid::zero(), "x").unwrap_err();
        assert!(matches!(err, EngineError::Store(_)));
    }
}
