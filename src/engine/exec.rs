//! engine::exec
//!
//! Commit recreation.
//!
//! Executes a [`RewritePlan`] by writing one new commit per step, oldest
//! first, each parented on the previous step's output. This is a fold: the
//! accumulator is the current tip and the mapping built so far.
//!
//! # Invariants
//!
//! - Only objects are written here; no reference moves
//! - Every written commit has exactly one parent
//! - On failure the commits already written stay behind as unreferenced
//!   objects and the error names the original commit that failed

use serde::Serialize;
use tracing::debug;

use super::error::EngineError;
use super::plan::RewritePlan;
use super::guard::Landing;
use crate::core::types::Oid;
use crate::git::{NewCommit, ObjectStore};

/// An original commit and the commit that replaced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewrittenCommit {
    pub original: Oid,
    pub rewritten: Oid,
}

/// Output of [`recreate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recreated {
    /// Last commit written, the new branch tip.
    pub tip: Oid,
    /// One entry per original commit, oldest first. Squashed members all map
    /// to the squashed commit.
    pub mapping: Vec<RewrittenCommit>,
}

impl Recreated {
    /// Replacement of `original`, if it was part of the rewrite.
    pub fn rewritten(&self, original: &Oid) -> Option<&Oid> {
        self.mapping
            .iter()
            .find(|entry| &entry.original == original)
            .map(|entry| &entry.rewritten)
    }
}

impl Landing for Recreated {
    fn landed_tip(&self) -> Option<&Oid> {
        Some(&self.tip)
    }
}

/// Write the plan's commits on top of its base.
///
/// # Errors
///
/// [`EngineError::ObjectWriteFailure`] naming the original commit whose
/// replacement could not be written.
pub fn recreate<S: ObjectStore + ?Sized>(
    store: &S,
    plan: &RewritePlan,
) -> Result<Recreated, EngineError> {
    let start = Recreated {
        tip: plan.base.clone(),
        mapping: Vec::with_capacity(plan.steps.len()),
    };

    plan.steps.iter().try_fold(start, |mut acc, step| {
        let commit = NewCommit {
            tree: step.tree.clone(),
            parent: acc.tip.clone(),
            author: step.author.clone(),
            committer: step.committer.clone(),
            message: step.message.clone(),
            source: Some(step.source.clone()),
        };
        let written = store
            .write_commit(&commit)
            .map_err(|source| EngineError::ObjectWriteFailure {
                commit: step.original.clone(),
                source,
            })?;
        debug!(
            original = %step.original.short(7),
            rewritten = %written.short(7),
            authored = %commit.author.datetime(),
            "recreated commit"
        );

        acc.mapping.extend(step.replaces().map(|original| RewrittenCommit {
            original: original.clone(),
            rewritten: written.clone(),
        }));
        acc.tip = written;
        Ok(acc)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::linearize::linearize;
    use crate::engine::plan::{plan, Rewrite};
    use crate::git::memory::FailOn;
    use crate::git::MemoryStore;

    fn abc() -> (MemoryStore, Vec<Oid>) {
        let store = MemoryStore::new();
        let ids = vec![
            store.commit("A", &[("a", "1")]),
            store.commit("fix bug", &[("b", "1")]),
            store.commit("add test", &[("c", "1")]),
        ];
        (store, ids)
    }

    fn reword_plan(store: &MemoryStore, ids: &[Oid]) -> RewritePlan {
        let op = Rewrite::EditMessage {
            target: ids[1].clone(),
            message: "fix login bug".into(),
        };
        let chain = linearize(store, &ids[2], &op.targets()).unwrap();
        plan(&chain, &op).unwrap()
    }

    #[test]
    fn rechains_parents_sequentially() {
        let (store, ids) = abc();
        let plan = reword_plan(&store, &ids);

        let out = recreate(&store, &plan).unwrap();

        let c2 = store.read_commit(&out.tip).unwrap();
        let b2_id = c2.parents[0].clone();
        let b2 = store.read_commit(&b2_id).unwrap();
        assert_eq!(b2.parents, vec![ids[0].clone()]);
        assert_eq!(b2.message, "fix login bug");
        assert_eq!(c2.message, "add test");
        assert_eq!(c2.tree, store.read_commit(&ids[2]).unwrap().tree);

        assert_eq!(out.rewritten(&ids[1]), Some(&b2_id));
        assert_eq!(out.rewritten(&ids[2]), Some(&out.tip));
        assert_eq!(out.rewritten(&ids[0]), None);
    }

    #[test]
    fn does_not_move_branch() {
        let (store, ids) = abc();
        let plan = reword_plan(&store, &ids);
        recreate(&store, &plan).unwrap();
        assert_eq!(store.tip("main"), Some(ids[2].clone()));
    }

    #[test]
    fn write_failure_names_original() {
        let (store, ids) = abc();
        let plan = reword_plan(&store, &ids);
        store.fail_on(FailOn::WriteAfter(1));

        let err = recreate(&store, &plan).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ObjectWriteFailure { ref commit, .. } if commit == &ids[2]
        ));
        assert_eq!(store.written_count(), 1);
        assert_eq!(store.tip("main"), Some(ids[2].clone()));
    }

    #[test]
    fn squash_members_share_replacement() {
        let (store, ids) = abc();
        let op = Rewrite::Squash {
            targets: vec![ids[1].clone(), ids[2].clone()],
            message: "fix bug with test".into(),
        };
        let chain = linearize(&store, &ids[2], &op.targets()).unwrap();
        let out = recreate(&store, &plan(&chain, &op).unwrap()).unwrap();

        assert_eq!(out.mapping.len(), 2);
        assert_eq!(out.rewritten(&ids[1]), Some(&out.tip));
        assert_eq!(out.rewritten(&ids[2]), Some(&out.tip));
        assert_eq!(store.read_commit(&out.tip).unwrap().parents, vec![ids[0].clone()]);
    }
}
