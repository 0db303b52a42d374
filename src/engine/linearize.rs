//! engine::linearize
//!
//! History linearizer.
//!
//! Turns a branch tip and a set of target commits into the ordered chain of
//! commits a rewrite has to recreate: everything from just after the lower
//! bound (the parent of the oldest target) up to the tip.
//!
//! The walk follows first parents only. A merge commit anywhere on the path
//! stops it, because replaying a merge onto a new first parent would need the
//! other parents too.
//!
//! # Example
//!
//! ```
//! use git_rewrite::engine::linearize::linearize;
//! use git_rewrite::git::MemoryStore;
//!
//! let store = MemoryStore::new();
//! let a = store.commit("A", &[("f", "a")]);
//! let b = store.commit("B", &[("f", "b")]);
//! let c = store.commit("C", &[("f", "c")]);
//!
//! let chain = linearize(&store, &c, &[b.clone()]).unwrap();
//! assert_eq!(chain.base, a);
//! assert_eq!(chain.ids(), vec![b, c]);
//! ```

use std::collections::BTreeSet;

use tracing::debug;

use super::error::EngineError;
use crate::core::types::Oid;
use crate::git::{Commit, ObjectStore};

/// The commits a rewrite recreates, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    /// Lower bound: parent of the oldest target. Never rewritten.
    pub base: Oid,
    /// From just after `base` through the branch tip inclusive.
    pub commits: Vec<Commit>,
}

impl Chain {
    /// Index of `oid` in the chain.
    pub fn position(&self, oid: &Oid) -> Option<usize> {
        self.commits.iter().position(|c| &c.id == oid)
    }

    pub fn contains(&self, oid: &Oid) -> bool {
        self.position(oid).is_some()
    }

    pub fn ids(&self) -> Vec<Oid> {
        self.commits.iter().map(|c| c.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

/// Walk first parents from `branch_tip` until every target has been seen.
///
/// # Errors
///
/// - [`EngineError::EmptySquashSet`] if `targets` is empty (nothing is read)
/// - [`EngineError::UnsupportedMergeCommit`] on a merge between tip and targets
/// - [`EngineError::TargetNotInChain`] if the walk reaches the root first
/// - [`EngineError::InitialCommitUnmodifiable`] if the oldest target is a root
pub fn linearize<S: ObjectStore + ?Sized>(
    store: &S,
    branch_tip: &Oid,
    targets: &[Oid],
) -> Result<Chain, EngineError> {
    if targets.is_empty() {
        return Err(EngineError::EmptySquashSet);
    }

    let mut remaining: BTreeSet<&Oid> = targets.iter().collect();
    let mut walked = Vec::new();
    let mut cursor = branch_tip.clone();

    loop {
        let commit = store.read_commit(&cursor)?;
        if commit.is_merge() {
            return Err(EngineError::UnsupportedMergeCommit { commit: commit.id });
        }
        remaining.remove(&commit.id);
        let parent = commit.first_parent().cloned();
        let oldest = commit.id.clone();
        walked.push(commit);

        match (remaining.is_empty(), parent) {
            (true, Some(base)) => {
                walked.reverse();
                debug!(base = %base.short(7), commits = walked.len(), "linearized history");
                return Ok(Chain {
                    base,
                    commits: walked,
                });
            }
            (true, None) => {
                return Err(EngineError::InitialCommitUnmodifiable { commit: oldest });
            }
            (false, Some(next)) => cursor = next,
            (false, None) => {
                let missing = remaining.first().map(|oid| (*oid).clone());
                return Err(EngineError::TargetNotInChain {
                    commit: missing.unwrap_or(oldest),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MemoryStore;

    /// A-B-C-D on main; returns the store and ids oldest first.
    fn linear() -> (MemoryStore, Vec<Oid>) {
        let store = MemoryStore::new();
        let ids = ["A", "B", "C", "D"]
            .iter()
            .map(|name| store.commit(name, &[("file", *name)]))
            .collect();
        (store, ids)
    }

    #[test]
    fn chain_runs_from_oldest_target_to_tip() {
        let (store, ids) = linear();
        let chain = linearize(&store, &ids[3], &[ids[2].clone(), ids[1].clone()]).unwrap();

        assert_eq!(chain.base, ids[0]);
        assert_eq!(chain.ids(), ids[1..].to_vec());
        assert_eq!(chain.position(&ids[2]), Some(1));
    }

    #[test]
    fn tip_only_chain() {
        let (store, ids) = linear();
        let chain = linearize(&store, &ids[3], &[ids[3].clone()]).unwrap();

        assert_eq!(chain.base, ids[2]);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn empty_targets_rejected_before_reading() {
        let (store, ids) = linear();
        assert!(matches!(
            linearize(&store, &ids[3], &[]),
            Err(EngineError::EmptySquashSet)
        ));
    }

    #[test]
    fn root_target_is_unmodifiable() {
        let (store, ids) = linear();
        let err = linearize(&store, &ids[3], &[ids[0].clone(), ids[2].clone()]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InitialCommitUnmodifiable { commit } if commit == ids[0]
        ));
    }

    #[test]
    fn foreign_target_not_in_chain() {
        let (store, ids) = linear();
        store.orphan("other");
        let stranger = store.commit("X", &[("x", "x")]);

        let err = linearize(&store, &ids[3], &[stranger.clone()]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::TargetNotInChain { commit } if commit == stranger
        ));
    }

    #[test]
    fn merge_on_path_is_unsupported() {
        let (store, ids) = linear();
        let merge = store.commit_merge("merge", &[ids[1].clone()]);
        let after = store.commit("E", &[("file", "E")]);

        let err = linearize(&store, &after, &[ids[2].clone()]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnsupportedMergeCommit { commit } if commit == merge
        ));
    }

    #[test]
    fn merge_below_lower_bound_is_fine() {
        let (store, ids) = linear();
        store.commit_merge("merge", &[ids[1].clone()]);
        let e = store.commit("E", &[("file", "E")]);
        let f = store.commit("F", &[("file", "F")]);

        let chain = linearize(&store, &f, &[e.clone()]).unwrap();
        assert_eq!(chain.ids(), vec![e, f]);
    }
}
