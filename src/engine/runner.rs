//! engine::runner
//!
//! Entry points for history rewrites.
//!
//! Every rewrite follows the same lifecycle:
//!
//! ```text
//! Check state -> Guard -> Linearize -> Plan -> Recreate -> Advance -> Restore
//! ```
//!
//! The branch is always an explicit part of the request. When it is the
//! branch HEAD points at, the whole operation runs under the working
//! directory guard; otherwise the working tree cannot be affected and only
//! the reference moves.
//!
//! # Invariants
//!
//! - The branch moves at most once, by compare-and-set, as the last step
//! - Any failure before that leaves every reference untouched
//! - Trees are never recomputed, so the new tip has the old tip's tree
//!
//! # Example
//!
//! ```
//! use git_rewrite::core::types::BranchName;
//! use git_rewrite::engine::runner::{edit_message, RewriteOptions};
//! use git_rewrite::git::{MemoryStore, ObjectStore};
//!
//! let mut store = MemoryStore::new();
//! store.commit("A", &[("f", "a")]);
//! let b = store.commit("fix bug", &[("f", "b")]);
//! store.commit("add test", &[("t", "c")]);
//!
//! let main = BranchName::new("main").unwrap();
//! let outcome =
//!     edit_message(&mut store, &main, &b, "fix login bug", &RewriteOptions::default()).unwrap();
//!
//! let tip = store.read_commit(&outcome.new_tip).unwrap();
//! assert_eq!(tip.message, "add test");
//! assert_eq!(store.read_commit(&tip.parents[0]).unwrap().message, "fix login bug");
//! ```

use serde::Serialize;
use tracing::{debug, info};

use super::error::EngineError;
use super::exec::{recreate, Recreated, RewrittenCommit};
use super::guard::{self, Guarded};
use super::linearize::linearize;
use super::plan::{plan, Rewrite};
use super::refs::advance;
use crate::core::types::{BranchName, Oid};
use crate::git::ObjectStore;

/// Policies applied to a rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Stash local changes around the rewrite instead of refusing to run.
    pub auto_stash: bool,
    /// Stamp every recreated commit with the current identity as committer.
    pub reset_committer: bool,
}

/// A rewrite of one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRequest {
    pub branch: BranchName,
    pub op: Rewrite,
    pub options: RewriteOptions,
}

/// What a successful rewrite did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteOutcome {
    pub branch: BranchName,
    pub old_tip: Oid,
    pub new_tip: Oid,
    /// Original to replacement, oldest first.
    pub rewritten: Vec<RewrittenCommit>,
    /// Whether local changes were stashed and restored.
    pub stashed: bool,
}

/// Replace the message of `commit` on `branch`.
pub fn edit_message<S: ObjectStore>(
    store: &mut S,
    branch: &BranchName,
    commit: &Oid,
    message: &str,
    options: &RewriteOptions,
) -> Result<RewriteOutcome, EngineError> {
    rewrite(
        store,
        &RewriteRequest {
            branch: branch.clone(),
            op: Rewrite::EditMessage {
                target: commit.clone(),
                message: message.to_string(),
            },
            options: *options,
        },
    )
}

/// Fold `commits` on `branch` into one commit with `message`.
///
/// The order of `commits` does not matter; they are placed by their position
/// on the branch.
pub fn squash<S: ObjectStore>(
    store: &mut S,
    branch: &BranchName,
    commits: &[Oid],
    message: &str,
    options: &RewriteOptions,
) -> Result<RewriteOutcome, EngineError> {
    rewrite(
        store,
        &RewriteRequest {
            branch: branch.clone(),
            op: Rewrite::Squash {
                targets: commits.to_vec(),
                message: message.to_string(),
            },
            options: *options,
        },
    )
}

/// Run a rewrite request.
///
/// # Errors
///
/// - [`EngineError::OperationInProgress`] if a rebase, merge or similar is paused
/// - [`EngineError::EmptySquashSet`] for a squash of fewer than two commits
/// - [`EngineError::NoCommits`] if the branch does not exist or is unborn
/// - [`EngineError::DirtyWorkingDirectory`] and
///   [`EngineError::StashRestoreConflict`] from the guard
/// - anything from linearizing, planning, recreating or advancing
pub fn rewrite<S: ObjectStore>(
    store: &mut S,
    request: &RewriteRequest,
) -> Result<RewriteOutcome, EngineError> {
    let state = store.state();
    if state.is_in_progress() {
        return Err(EngineError::OperationInProgress { state });
    }
    if matches!(request.op, Rewrite::Squash { .. }) && request.op.targets().len() < 2 {
        return Err(EngineError::EmptySquashSet);
    }

    let branch = &request.branch;
    let old_tip = store
        .branch_tip(branch)?
        .ok_or_else(|| EngineError::NoCommits {
            branch: branch.clone(),
        })?;

    let checked_out = store.current_branch()?.as_ref() == Some(branch);
    let guarded = if checked_out {
        guard::run(store, request.options.auto_stash, |store| {
            apply(&*store, request, &old_tip)
        })?
    } else {
        debug!(%branch, "branch not checked out, skipping working tree guard");
        Guarded::unguarded(apply(&*store, request, &old_tip)?)
    };

    let Recreated { tip, mapping } = guarded.value;
    info!(
        %branch,
        operation = request.op.name(),
        rewritten = mapping.len(),
        stashed = guarded.stashed,
        "rewrite complete"
    );
    Ok(RewriteOutcome {
        branch: branch.clone(),
        old_tip,
        new_tip: tip,
        rewritten: mapping,
        stashed: guarded.stashed,
    })
}

fn apply<S: ObjectStore + ?Sized>(
    store: &S,
    request: &RewriteRequest,
    old_tip: &Oid,
) -> Result<Recreated, EngineError> {
    let chain = linearize(store, old_tip, &request.op.targets())?;
    let mut plan = plan(&chain, &request.op)?;
    if request.options.reset_committer {
        plan = plan.with_committer(&store.signature()?);
    }
    debug!(steps = plan.steps.len(), base = %plan.base.short(7), "planned rewrite");

    let recreated = recreate(store, &plan)?;
    advance(
        store,
        &request.branch,
        old_tip,
        &recreated.tip,
        &request.op.reason(),
    )?;
    Ok(recreated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::memory::{FailOn, MemoryOp};
    use crate::git::{GitState, MemoryStore};

    fn main_branch() -> BranchName {
        BranchName::new("main").unwrap()
    }

    /// A..F on main, each commit touching its own file.
    fn six() -> (MemoryStore, Vec<Oid>) {
        let store = MemoryStore::new();
        let ids = ["A", "B", "C", "D", "E", "F"]
            .iter()
            .map(|name| store.commit(name, &[(*name, *name)]))
            .collect();
        (store, ids)
    }

    /// First-parent history from `tip`, oldest first.
    fn history(store: &MemoryStore, tip: &Oid) -> Vec<Oid> {
        let mut ids = vec![tip.clone()];
        let mut cursor = store.read_commit(tip).unwrap();
        while let Some(parent) = cursor.first_parent().cloned() {
            ids.push(parent.clone());
            cursor = store.read_commit(&parent).unwrap();
        }
        ids.reverse();
        ids
    }

    fn opts(auto_stash: bool) -> RewriteOptions {
        RewriteOptions {
            auto_stash,
            reset_committer: false,
        }
    }

    mod edit {
        use super::*;

        #[test]
        fn reword_tip_changes_only_tip() {
            let (mut store, ids) = six();
            let out = edit_message(&mut store, &main_branch(), &ids[5], "F!", &opts(false)).unwrap();

            let after = history(&store, &out.new_tip);
            assert_eq!(after[..5], ids[..5]);
            assert_ne!(after[5], ids[5]);
            let tip = store.read_commit(&out.new_tip).unwrap();
            assert_eq!(tip.tree, store.read_commit(&ids[5]).unwrap().tree);
            assert_eq!(tip.message, "F!");
            assert_eq!(store.tip("main"), Some(out.new_tip.clone()));
        }

        #[test]
        fn reword_below_tip_changes_target_and_descendants() {
            let (mut store, ids) = six();
            let out = edit_message(&mut store, &main_branch(), &ids[2], "C!", &opts(false)).unwrap();

            let after = history(&store, &out.new_tip);
            assert_eq!(after.len(), 6);
            assert_eq!(after[..2], ids[..2]);
            for (new, old) in after[2..].iter().zip(&ids[2..]) {
                assert_ne!(new, old);
                let (new, old) = (store.read_commit(new).unwrap(), store.read_commit(old).unwrap());
                assert_eq!(new.tree, old.tree);
                assert_eq!(new.author, old.author);
            }
            assert_eq!(out.rewritten.len(), 4);
            assert_eq!(out.old_tip, ids[5]);
        }

        #[test]
        fn reword_example_chain() {
            let mut store = MemoryStore::new();
            let a = store.commit("A", &[("a", "1")]);
            let b = store.commit("fix bug", &[("b", "1")]);
            let c = store.commit("add test", &[("c", "1")]);

            let out = edit_message(&mut store, &main_branch(), &b, "fix login bug", &opts(false))
                .unwrap();

            let c2 = store.read_commit(&out.new_tip).unwrap();
            let b2 = store.read_commit(&c2.parents[0]).unwrap();
            assert_eq!(b2.parents, vec![a]);
            assert_eq!(b2.message, "fix login bug");
            assert_eq!(b2.tree, store.read_commit(&b).unwrap().tree);
            assert_eq!(c2.message, "add test");
            assert_eq!(c2.tree, store.read_commit(&c).unwrap().tree);
        }

        #[test]
        fn reword_root_writes_nothing() {
            let (mut store, ids) = six();
            let err = edit_message(&mut store, &main_branch(), &ids[0], "root", &opts(false))
                .unwrap_err();

            assert!(matches!(err, EngineError::InitialCommitUnmodifiable { .. }));
            assert_eq!(store.written_count(), 0);
            assert_eq!(store.tip("main"), Some(ids[5].clone()));
        }

        #[test]
        fn reflog_records_old_tip() {
            let (mut store, ids) = six();
            edit_message(&mut store, &main_branch(), &ids[4], "E!", &opts(false)).unwrap();

            let entry = store.reflog("main").pop().unwrap();
            assert_eq!(entry.old, Some(ids[5].clone()));
            assert_eq!(entry.message, format!("git-rewrite: reword {}", ids[4].short(7)));
        }

        #[test]
        fn reset_committer_stamps_current_identity() {
            let (mut store, ids) = six();
            store.set_identity("Rewriter", "rewriter@example.com");
            let options = RewriteOptions {
                auto_stash: false,
                reset_committer: true,
            };

            let out = edit_message(&mut store, &main_branch(), &ids[4], "E!", &options).unwrap();

            for id in &history(&store, &out.new_tip)[4..] {
                let commit = store.read_commit(id).unwrap();
                assert_eq!(commit.committer.name, "Rewriter");
                assert_ne!(commit.author.name, "Rewriter");
            }
        }
    }

    mod squash_op {
        use super::*;

        #[test]
        fn squash_contiguous_range() {
            let (mut store, ids) = six();
            let targets = [ids[1].clone(), ids[2].clone(), ids[3].clone()];

            let out = squash(&mut store, &main_branch(), &targets, "BCD", &opts(false)).unwrap();

            let after = history(&store, &out.new_tip);
            assert_eq!(after.len(), 4);
            assert_eq!(after[0], ids[0]);
            let bcd = store.read_commit(&after[1]).unwrap();
            assert_eq!(bcd.parents, vec![ids[0].clone()]);
            assert_eq!(bcd.tree, store.read_commit(&ids[3]).unwrap().tree);
            assert_eq!(bcd.message, "BCD");
            assert_eq!(bcd.author, store.read_commit(&ids[1]).unwrap().author);

            for (new, old) in after[2..].iter().zip(&ids[4..]) {
                let (new, old) = (store.read_commit(new).unwrap(), store.read_commit(old).unwrap());
                assert_ne!(new.id, old.id);
                assert_eq!(new.tree, old.tree);
                assert_eq!(new.message, old.message);
            }
        }

        #[test]
        fn squash_order_does_not_matter() {
            let (mut first, ids) = six();
            let (mut second, _) = six();

            let a = squash(&mut first, &main_branch(), &[ids[1].clone(), ids[3].clone(), ids[2].clone()], "m", &opts(false)).unwrap();
            let b = squash(&mut second, &main_branch(), &[ids[3].clone(), ids[1].clone(), ids[2].clone()], "m", &opts(false)).unwrap();
            assert_eq!(a.new_tip, b.new_tip);
        }

        #[test]
        fn fewer_than_two_targets() {
            let (mut store, ids) = six();
            for targets in [vec![], vec![ids[3].clone()], vec![ids[3].clone(), ids[3].clone()]] {
                let err = squash(&mut store, &main_branch(), &targets, "m", &opts(false)).unwrap_err();
                assert!(matches!(err, EngineError::EmptySquashSet));
            }
            assert_eq!(store.written_count(), 0);
        }

        #[test]
        fn squash_including_root_is_rejected() {
            let (mut store, ids) = six();
            let err = squash(&mut store, &main_branch(), &[ids[0].clone(), ids[1].clone()], "m", &opts(false))
                .unwrap_err();

            assert!(matches!(err, EngineError::InitialCommitUnmodifiable { .. }));
            assert_eq!(store.written_count(), 0);
        }

        #[test]
        fn foreign_commit_is_not_in_chain() {
            let (mut store, ids) = six();
            store.orphan("other");
            let stranger = store.commit("X", &[("x", "x")]);

            let err = squash(&mut store, &main_branch(), &[ids[4].clone(), stranger], "m", &opts(false))
                .unwrap_err();
            assert!(matches!(err, EngineError::TargetNotInChain { .. }));
        }
    }

    mod safety {
        use super::*;

        #[test]
        fn dirty_without_auto_stash_leaves_branch() {
            let (mut store, ids) = six();
            store.write_file("F", "edited");

            let err = edit_message(&mut store, &main_branch(), &ids[4], "E!", &opts(false))
                .unwrap_err();

            assert!(matches!(err, EngineError::DirtyWorkingDirectory { .. }));
            assert_eq!(store.tip("main"), Some(ids[5].clone()));
            assert_eq!(store.written_count(), 0);
        }

        #[test]
        fn dirty_with_auto_stash_restores_exactly() {
            let (mut store, ids) = six();
            store.write_file("F", "edited");
            store.write_file("B", "staged");
            store.stage("B");
            store.write_file("notes.txt", "untracked");
            let before = (store.worktree_files(), store.index_files());

            let out = edit_message(&mut store, &main_branch(), &ids[2], "C!", &opts(true)).unwrap();

            assert!(out.stashed);
            assert_eq!((store.worktree_files(), store.index_files()), before);
            assert_eq!(store.stash_count(), 0);
            assert_eq!(store.tip("main"), Some(out.new_tip));
        }

        #[test]
        fn concurrent_move_is_retryable_and_leaves_branch() {
            let (mut store, ids) = six();
            store.race_branch("main", &ids[2]);

            let err = edit_message(&mut store, &main_branch(), &ids[3], "D!", &opts(false))
                .unwrap_err();

            assert!(err.is_retryable());
            assert!(matches!(
                err,
                EngineError::RefUpdateFailure { ref expected, .. } if expected == &ids[5]
            ));
            assert_eq!(store.tip("main"), Some(ids[2].clone()));
        }

        #[test]
        fn write_failure_leaves_branch() {
            let (mut store, ids) = six();
            store.fail_on(FailOn::WriteAfter(1));

            let err = edit_message(&mut store, &main_branch(), &ids[3], "D!", &opts(false))
                .unwrap_err();

            assert!(matches!(err, EngineError::ObjectWriteFailure { ref commit, .. } if commit == &ids[4]));
            assert_eq!(store.tip("main"), Some(ids[5].clone()));
        }

        #[test]
        fn paused_operation_blocks_rewrite() {
            let (mut store, ids) = six();
            store.set_state(GitState::Rebase);

            let err = edit_message(&mut store, &main_branch(), &ids[3], "D!", &opts(true))
                .unwrap_err();
            assert!(matches!(err, EngineError::OperationInProgress { .. }));
            assert_eq!(store.written_count(), 0);
            assert_eq!(store.stash_count(), 0);
        }

        #[test]
        fn unborn_branch_has_no_commits() {
            let mut store = MemoryStore::new();
            let err = edit_message(&mut store, &main_branch(), &Oid::zero(), "m", &opts(false))
                .unwrap_err();
            assert!(matches!(err, EngineError::NoCommits { .. }));
        }

        #[test]
        fn other_branch_skips_guard() {
            let (mut store, ids) = six();
            store.create_branch("topic", &ids[5]);
            store.write_file("F", "edited");
            store.clear_operations();

            let topic = BranchName::new("topic").unwrap();
            let out = edit_message(&mut store, &topic, &ids[4], "E!", &opts(false)).unwrap();

            assert!(!out.stashed);
            assert_eq!(store.tip("topic"), Some(out.new_tip));
            assert_eq!(store.tip("main"), Some(ids[5].clone()));
            assert_eq!(store.worktree_files()["F"], "edited");
            assert!(!store.operations().contains(&MemoryOp::StashSave));
        }

        #[test]
        fn stash_conflict_reports_new_tip() {
            let (mut store, ids) = six();
            store.write_file("F", "edited");
            store.fail_on(FailOn::StashPop);

            let err = edit_message(&mut store, &main_branch(), &ids[4], "E!", &opts(true))
                .unwrap_err();

            assert!(err.branch_moved());
            match err {
                EngineError::StashRestoreConflict { new_tip: Some(tip), .. } => {
                    assert_eq!(store.tip("main"), Some(tip));
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(store.stash_count(), 1);
        }
    }
}
