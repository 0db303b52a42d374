//! engine::error
//!
//! Failure kinds of a history rewrite.
//!
//! Every error is returned to the caller; nothing is retried or swallowed.
//! When a rewrite fails part way, commits already written stay in the object
//! store as unreferenced objects and the branch is not moved.

use thiserror::Error;

use crate::core::types::{BranchName, Oid};
use crate::git::{GitError, GitState, StashHandle};

/// Errors from the rewrite engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The path is not a usable repository.
    #[error("not a usable repository: {0}")]
    InvalidRepository(String),

    /// The branch has no history.
    #[error("branch '{branch}' has no commits")]
    NoCommits { branch: BranchName },

    /// Uncommitted changes and auto-stash disabled.
    #[error("working directory has uncommitted changes ({details}); commit them or enable auto-stash")]
    DirtyWorkingDirectory { details: String },

    /// The stash entry created for the operation could not be re-applied.
    /// The entry is left in the stash list.
    #[error(
        "{}; stashed changes could not be restored: {message} (kept as {stash})",
        restore_context(.new_tip, .operation_error)
    )]
    StashRestoreConflict {
        stash: StashHandle,
        /// Tip the branch was moved to, if the operation landed.
        new_tip: Option<Oid>,
        /// Why the operation itself failed, if it did.
        operation_error: Option<String>,
        message: String,
    },

    /// A multi-parent commit sits between the tip and a target.
    #[error("commit {} is a merge commit; rewriting merges is not supported", .commit.short(7))]
    UnsupportedMergeCommit { commit: Oid },

    /// The target (or oldest squash target) has no parent.
    #[error("commit {} is the initial commit and cannot be rewritten", .commit.short(7))]
    InitialCommitUnmodifiable { commit: Oid },

    /// Fewer than two distinct commits to squash.
    #[error("squash needs at least two distinct commits")]
    EmptySquashSet,

    /// A target is not reachable from the branch tip by first parents.
    #[error("commit {} is not in the history being rewritten", .commit.short(7))]
    TargetNotInChain { commit: Oid },

    /// The store rejected a new commit.
    #[error("failed to write replacement for commit {}: {source}", .commit.short(7))]
    ObjectWriteFailure {
        /// Original commit whose replacement failed.
        commit: Oid,
        #[source]
        source: GitError,
    },

    /// The branch moved while the rewrite ran.
    #[error("branch '{branch}' moved during the rewrite (expected {}, found {actual}); nothing was changed", .expected.short(7))]
    RefUpdateFailure {
        branch: BranchName,
        expected: Oid,
        actual: String,
    },

    /// A rebase, merge or similar is paused in the repository.
    #[error("a {state} is in progress; finish or abort it first")]
    OperationInProgress { state: GitState },

    /// Any other object store failure.
    #[error(transparent)]
    Store(GitError),
}

fn restore_context(new_tip: &Option<Oid>, operation_error: &Option<String>) -> String {
    match (new_tip, operation_error) {
        (_, Some(err)) => format!("rewrite failed ({err})"),
        (Some(tip), None) => format!("rewrite completed at {}", tip.short(7)),
        (None, None) => "operation completed".to_string(),
    }
}

impl EngineError {
    /// Whether running the same request again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::RefUpdateFailure { .. })
    }

    /// Whether the branch may have been moved despite the error.
    pub fn branch_moved(&self) -> bool {
        matches!(
            self,
            EngineError::StashRestoreConflict {
                new_tip: Some(_),
                ..
            }
        )
    }
}

impl From<GitError> for EngineError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::NotARepo { .. } | GitError::BareRepo => {
                EngineError::InvalidRepository(err.to_string())
            }
            other => EngineError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(c: char) -> Oid {
        Oid::new(c.to_string().repeat(40)).unwrap()
    }

    #[test]
    fn only_ref_races_are_retryable() {
        let race = EngineError::RefUpdateFailure {
            branch: BranchName::new("main").unwrap(),
            expected: oid('a'),
            actual: oid('b').to_string(),
        };
        assert!(race.is_retryable());
        assert!(!EngineError::EmptySquashSet.is_retryable());
        assert!(!EngineError::InitialCommitUnmodifiable { commit: oid('a') }.is_retryable());
    }

    #[test]
    fn repository_errors_become_invalid_repository() {
        let err: EngineError = GitError::BareRepo.into();
        assert!(matches!(err, EngineError::InvalidRepository(_)));

        let err: EngineError = GitError::ObjectNotFound {
            oid: "abc".into(),
        }
        .into();
        assert!(matches!(err, EngineError::Store(_)));
    }

    #[test]
    fn restore_conflict_reports_landed_tip() {
        let err = EngineError::StashRestoreConflict {
            stash: StashHandle(oid('c')),
            new_tip: Some(oid('d')),
            operation_error: None,
            message: "conflict in f".into(),
        };
        let text = err.to_string();
        assert!(text.contains("rewrite completed at ddddddd"));
        assert!(text.contains("stash ccccccc"));
        assert!(err.branch_moved());
    }

    #[test]
    fn restore_conflict_reports_operation_failure() {
        let err = EngineError::StashRestoreConflict {
            stash: StashHandle(oid('c')),
            new_tip: None,
            operation_error: Some("squash needs at least two distinct commits".into()),
            message: "conflict".into(),
        };
        assert!(err.to_string().contains("rewrite failed (squash needs"));
        assert!(!err.branch_moved());
    }
}
