//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. The rewrite engine talks to
//! the [`ObjectStore`] trait; the CLI additionally uses the read-only queries
//! on [`Git`]. No other module imports `git2`.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Commit reads and writes
//! - Branch compare-and-set updates with reflog messages
//! - Working tree status, stash save/pop, checkout
//! - History listing, search and diffs for display
//!
//! # Invariants
//!
//! - All ref updates use CAS (compare-and-swap) semantics
//! - No other module calls git2 directly
//! - All operations return strong types (Oid, BranchName, RefName)

mod interface;
pub mod memory;
pub mod model;
mod store;
pub mod views;

pub use interface::{Git, GitError, RepoInfo};
pub use memory::MemoryStore;
pub use model::{Commit, GitState, NewCommit, Signature, StashHandle, WorktreeStatus};
pub use store::ObjectStore;
pub use views::{BranchInfo, CommitDiff, CommitPage, CommitSummary, FileStatus, RepoSummary};
