//! git::store
//!
//! The seam between the rewrite engine and whatever holds the objects.
//!
//! The engine never touches `git2` directly. It reads commits, writes new
//! ones, moves a branch and (when asked to) stashes the working tree, all
//! through [`ObjectStore`]. Two implementations exist:
//!
//! - [`Git`](super::Git) - a real repository through `git2`
//! - [`MemoryStore`](super::MemoryStore) - an in-memory repository for tests
//!
//! # Invariants
//!
//! - `write_commit` never moves a reference; written commits stay
//!   unreferenced until [`ObjectStore::update_branch`] succeeds
//! - `update_branch` is a single compare-and-set: it fails with
//!   [`GitError::CasFailed`] when the branch is not at `expected`
//! - Stash handles are only valid within the operation that created them

use crate::core::types::{BranchName, Oid};

use super::model::{Commit, GitState, NewCommit, Signature, StashHandle, WorktreeStatus};
use super::GitError;

/// Content-addressable commit storage plus the few working tree operations
/// the engine needs around a rewrite.
pub trait ObjectStore {
    /// Read a commit by id.
    ///
    /// # Errors
    ///
    /// [`GitError::ObjectNotFound`] if no commit has this id.
    fn read_commit(&self, oid: &Oid) -> Result<Commit, GitError>;

    /// Persist a single-parent commit and return its id.
    fn write_commit(&self, commit: &NewCommit) -> Result<Oid, GitError>;

    /// Current tip of a local branch; `None` if the branch does not exist
    /// or is unborn.
    fn branch_tip(&self, branch: &BranchName) -> Result<Option<Oid>, GitError>;

    /// Move `branch` from `expected` to `new`, recording `message` in its reflog.
    fn update_branch(
        &self,
        branch: &BranchName,
        new: &Oid,
        expected: &Oid,
        message: &str,
    ) -> Result<(), GitError>;

    /// The branch HEAD points at; `None` when detached or unborn.
    fn current_branch(&self) -> Result<Option<BranchName>, GitError>;

    /// In-progress operation, if any.
    fn state(&self) -> GitState;

    /// Working tree status. Untracked files are only counted on request.
    fn worktree_status(&self, include_untracked: bool) -> Result<WorktreeStatus, GitError>;

    /// Stash staged and unstaged changes to tracked files, leaving the
    /// working tree matching HEAD. Untracked files are left alone.
    fn stash_save(&mut self, message: &str) -> Result<StashHandle, GitError>;

    /// Re-apply and drop the entry created by [`ObjectStore::stash_save`].
    ///
    /// # Errors
    ///
    /// [`GitError::StashConflict`] when the entry cannot be applied cleanly;
    /// the entry is kept.
    fn stash_pop(&mut self, handle: &StashHandle) -> Result<(), GitError>;

    /// Identity of the current user, used when committers are reset.
    fn signature(&self) -> Result<Signature, GitError>;

    /// Check out a local branch and point HEAD at it.
    fn checkout_branch(&mut self, branch: &BranchName) -> Result<(), GitError>;
}
