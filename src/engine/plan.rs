//! engine::plan
//!
//! Rewrite planning.
//!
//! A plan says, for every commit in a [`Chain`], what its replacement should
//! look like: which tree, which message, which signatures. It does not say
//! which parent: that is only known once the previous step has been written,
//! so the recreator supplies it.
//!
//! # Invariants
//!
//! - Planner does not perform I/O
//! - Trees are taken verbatim from existing commits, never computed
//! - Same chain and operation always give the same plan
//!
//! # Example
//!
//! ```
//! use git_rewrite::engine::linearize::linearize;
//! use git_rewrite::engine::plan::{plan, Rewrite, StepKind};
//! use git_rewrite::git::MemoryStore;
//!
//! let store = MemoryStore::new();
//! store.commit("A", &[("f", "a")]);
//! let b = store.commit("fix bug", &[("f", "b")]);
//! let c = store.commit("add test", &[("t", "c")]);
//!
//! let op = Rewrite::EditMessage { target: b.clone(), message: "fix login bug".into() };
//! let chain = linearize(&store, &c, &op.targets()).unwrap();
//! let plan = plan(&chain, &op).unwrap();
//!
//! assert_eq!(plan.steps[0].message, "fix login bug");
//! assert_eq!(plan.steps[0].kind, StepKind::Reword);
//! assert_eq!(plan.steps[1].kind, StepKind::Replay);
//! ```

use serde::Serialize;

use super::error::EngineError;
use super::linearize::Chain;
use crate::core::types::Oid;
use crate::git::{Commit, Signature};

/// A history rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// Replace the message of one commit.
    EditMessage { target: Oid, message: String },
    /// Fold several commits into the newest of them.
    Squash { targets: Vec<Oid>, message: String },
}

impl Rewrite {
    /// Commits named by the operation, deduplicated, in the order given.
    pub fn targets(&self) -> Vec<Oid> {
        match self {
            Rewrite::EditMessage { target, .. } => vec![target.clone()],
            Rewrite::Squash { targets, .. } => {
                let mut unique: Vec<Oid> = Vec::with_capacity(targets.len());
                for oid in targets {
                    if !unique.contains(oid) {
                        unique.push(oid.clone());
                    }
                }
                unique
            }
        }
    }

    /// Short description for reflog messages.
    pub fn reason(&self) -> String {
        match self {
            Rewrite::EditMessage { target, .. } => format!("reword {}", target.short(7)),
            Rewrite::Squash { .. } => format!("squash {} commits", self.targets().len()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rewrite::EditMessage { .. } => "reword",
            Rewrite::Squash { .. } => "squash",
        }
    }
}

/// What a step does to its original commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    /// Same tree and message on a new parent.
    Replay,
    /// Same tree, new message.
    Reword,
    /// Newest squash member, also standing in for `absorbed` (oldest first).
    Squash { absorbed: Vec<Oid> },
}

/// One commit to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    /// The commit this step replaces.
    pub original: Oid,
    /// The commit author, committer and message are carried over from.
    pub source: Oid,
    pub tree: Oid,
    pub message: String,
    pub author: Signature,
    pub committer: Signature,
    pub kind: StepKind,
}

impl PlanStep {
    fn replay(commit: &Commit) -> Self {
        Self {
            original: commit.id.clone(),
            source: commit.id.clone(),
            tree: commit.tree.clone(),
            message: commit.message.clone(),
            author: commit.author.clone(),
            committer: commit.committer.clone(),
            kind: StepKind::Replay,
        }
    }

    /// Every original commit this step's output replaces.
    pub fn replaces(&self) -> impl Iterator<Item = &Oid> {
        let absorbed: &[Oid] = match &self.kind {
            StepKind::Squash { absorbed } => absorbed,
            _ => &[],
        };
        absorbed.iter().chain(std::iter::once(&self.original))
    }
}

/// Ordered steps on top of a fixed lower bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewritePlan {
    /// Parent of the first step's output.
    pub base: Oid,
    /// Oldest first.
    pub steps: Vec<PlanStep>,
}

impl RewritePlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Use `committer` on every step instead of the original committers.
    pub fn with_committer(mut self, committer: &Signature) -> Self {
        for step in &mut self.steps {
            step.committer = committer.clone();
        }
        self
    }

    /// Steps that change more than the parent.
    pub fn changed(&self) -> impl Iterator<Item = &PlanStep> {
        self.steps.iter().filter(|s| s.kind != StepKind::Replay)
    }
}

/// Build the plan for `operation` over `chain`.
///
/// # Errors
///
/// - [`EngineError::TargetNotInChain`] if a target is not part of `chain`
/// - [`EngineError::EmptySquashSet`] if a squash names fewer than two
///   distinct commits
pub fn plan(chain: &Chain, operation: &Rewrite) -> Result<RewritePlan, EngineError> {
    let steps = match operation {
        Rewrite::EditMessage { target, message } => edit_message_steps(chain, target, message)?,
        Rewrite::Squash { message, .. } => squash_steps(chain, &operation.targets(), message)?,
    };

    Ok(RewritePlan {
        base: chain.base.clone(),
        steps,
    })
}

fn edit_message_steps(
    chain: &Chain,
    target: &Oid,
    message: &str,
) -> Result<Vec<PlanStep>, EngineError> {
    if !chain.contains(target) {
        return Err(EngineError::TargetNotInChain {
            commit: target.clone(),
        });
    }

    Ok(chain
        .commits
        .iter()
        .map(|commit| {
            let mut step = PlanStep::replay(commit);
            if &commit.id == target {
                step.message = message.to_string();
                step.kind = StepKind::Reword;
            }
            step
        })
        .collect())
}

fn squash_steps(chain: &Chain, targets: &[Oid], message: &str) -> Result<Vec<PlanStep>, EngineError> {
    if targets.len() < 2 {
        return Err(EngineError::EmptySquashSet);
    }

    let mut positions = targets
        .iter()
        .map(|oid| {
            chain
                .position(oid)
                .ok_or_else(|| EngineError::TargetNotInChain { commit: oid.clone() })
        })
        .collect::<Result<Vec<_>, _>>()?;
    positions.sort_unstable();

    let (newest, older) = match positions.split_last() {
        Some(split) => split,
        None => return Err(EngineError::EmptySquashSet),
    };
    let oldest = &chain.commits[older[0]];
    let absorbed: Vec<Oid> = older.iter().map(|&i| chain.commits[i].id.clone()).collect();

    let mut steps = Vec::with_capacity(chain.len() - older.len());
    for (index, commit) in chain.commits.iter().enumerate() {
        if index == *newest {
            steps.push(PlanStep {
                original: commit.id.clone(),
                source: oldest.id.clone(),
                tree: commit.tree.clone(),
                message: message.to_string(),
                author: oldest.author.clone(),
                committer: oldest.committer.clone(),
                kind: StepKind::Squash {
                    absorbed: absorbed.clone(),
                },
            });
        } else if !older.contains(&index) {
            steps.push(PlanStep::replay(commit));
        }
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::linearize::linearize;
    use crate::git::{MemoryStore, ObjectStore};

    /// A..F on main, each commit touching its own file.
    fn six() -> (MemoryStore, Vec<Oid>) {
        let store = MemoryStore::new();
        let ids = ["A", "B", "C", "D", "E", "F"]
            .iter()
            .map(|name| store.commit(name, &[(*name, *name)]))
            .collect();
        (store, ids)
    }

    fn chain_for(store: &MemoryStore, ids: &[Oid], op: &Rewrite) -> Chain {
        linearize(store, ids.last().unwrap(), &op.targets()).unwrap()
    }

    mod edit {
        use super::*;

        #[test]
        fn only_target_message_changes() {
            let (store, ids) = six();
            let op = Rewrite::EditMessage {
                target: ids[3].clone(),
                message: "D, better".into(),
            };
            let chain = chain_for(&store, &ids, &op);
            let plan = plan(&chain, &op).unwrap();

            assert_eq!(plan.base, ids[2]);
            assert_eq!(plan.steps.len(), 3);
            assert_eq!(plan.steps[0].message, "D, better");
            assert_eq!(plan.steps[1].message, "E");
            assert_eq!(plan.steps[1].source, ids[4]);
            assert_eq!(plan.steps[2].message, "F");
            for (step, commit) in plan.steps.iter().zip(&chain.commits) {
                assert_eq!(step.tree, commit.tree);
                assert_eq!(step.author, commit.author);
                assert_eq!(step.committer, commit.committer);
            }
            assert_eq!(plan.changed().count(), 1);
        }

        #[test]
        fn target_outside_chain() {
            let (store, ids) = six();
            let op = Rewrite::EditMessage {
                target: ids[4].clone(),
                message: "x".into(),
            };
            let chain = chain_for(&store, &ids, &op);
            let other = Rewrite::EditMessage {
                target: ids[1].clone(),
                message: "x".into(),
            };
            assert!(matches!(
                plan(&chain, &other),
                Err(EngineError::TargetNotInChain { .. })
            ));
        }
    }

    mod squash {
        use super::*;

        #[test]
        fn contiguous_range_collapses_into_newest_tree() {
            let (store, ids) = six();
            let op = Rewrite::Squash {
                targets: vec![ids[3].clone(), ids[1].clone(), ids[2].clone()],
                message: "BCD".into(),
            };
            let chain = chain_for(&store, &ids, &op);
            let plan = plan(&chain, &op).unwrap();

            assert_eq!(plan.base, ids[0]);
            assert_eq!(plan.steps.len(), 3);

            let squashed = &plan.steps[0];
            let b = store.read_commit(&ids[1]).unwrap();
            let d = store.read_commit(&ids[3]).unwrap();
            assert_eq!(squashed.original, ids[3]);
            assert_eq!(squashed.tree, d.tree);
            assert_eq!(squashed.message, "BCD");
            assert_eq!(squashed.author, b.author);
            assert_eq!(squashed.source, ids[1]);
            assert_eq!(
                squashed.kind,
                StepKind::Squash {
                    absorbed: vec![ids[1].clone(), ids[2].clone()]
                }
            );
            let replaced: Vec<_> = squashed.replaces().cloned().collect();
            assert_eq!(replaced, ids[1..4].to_vec());

            assert_eq!(plan.steps[1].message, "E");
            assert_eq!(plan.steps[2].message, "F");
        }

        #[test]
        fn interleaved_non_members_are_replayed() {
            let (store, ids) = six();
            let op = Rewrite::Squash {
                targets: vec![ids[1].clone(), ids[3].clone()],
                message: "B+D".into(),
            };
            let chain = chain_for(&store, &ids, &op);
            let plan = plan(&chain, &op).unwrap();

            let originals: Vec<_> = plan.steps.iter().map(|s| s.original.clone()).collect();
            assert_eq!(originals, ids[2..].to_vec());
            assert_eq!(plan.steps[0].kind, StepKind::Replay);
        }

        #[test]
        fn needs_two_distinct_targets() {
            let (store, ids) = six();
            let op = Rewrite::Squash {
                targets: vec![ids[2].clone(), ids[2].clone()],
                message: "x".into(),
            };
            let chain = chain_for(&store, &ids, &op);
            assert!(matches!(plan(&chain, &op), Err(EngineError::EmptySquashSet)));
        }

        #[test]
        fn committer_reset_applies_to_every_step() {
            let (store, ids) = six();
            let op = Rewrite::Squash {
                targets: vec![ids[4].clone(), ids[5].clone()],
                message: "EF".into(),
            };
            let chain = chain_for(&store, &ids, &op);
            let me = Signature {
                name: "Rewriter".into(),
                email: "rw@example.com".into(),
                time: 42,
                offset_minutes: 0,
            };
            let plan = plan(&chain, &op).unwrap().with_committer(&me);

            assert!(plan.steps.iter().all(|s| s.committer == me));
            assert_ne!(plan.steps[0].author, me);
        }
    }

    #[test]
    fn reasons_name_the_operation() {
        let oid = Oid::new("ab".repeat(20)).unwrap();
        let edit = Rewrite::EditMessage {
            target: oid.clone(),
            message: "m".into(),
        };
        assert_eq!(edit.reason(), "reword abababa");

        let other = Oid::new("cd".repeat(20)).unwrap();
        let squash = Rewrite::Squash {
            targets: vec![oid.clone(), other, oid],
            message: "m".into(),
        };
        assert_eq!(squash.reason(), "squash 2 commits");
        assert_eq!(squash.targets().len(), 2);
    }
}
