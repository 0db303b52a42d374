//! reword and squash commands - Rewrite history on a branch

use super::{verbosity, Session};
use crate::cli::args::StashArgs;
use crate::core::types::{BranchName, Oid};
use crate::engine::{self, Context, EngineError, RewriteOptions, RewriteOutcome, RewrittenCommit};
use crate::ui::output;
use anyhow::{Context as _, Result};
use serde::Serialize;

/// JSON rendering of a finished rewrite.
#[derive(Debug, Serialize)]
struct RewriteReport<'a> {
    operation: &'a str,
    updated_branches: Vec<&'a BranchName>,
    old_tip: &'a Oid,
    new_tip: &'a Oid,
    rewritten: &'a [RewrittenCommit],
    stashed: bool,
}

/// Change the message of `commit`.
pub fn reword(
    ctx: &Context,
    commit: &str,
    message: &str,
    branch: Option<&str>,
    reset_committer: bool,
    stash: StashArgs,
) -> Result<()> {
    let mut session = Session::open(ctx)?;
    let _lock = session.lock()?;

    let branch = session.branch(branch)?;
    let target = session
        .git
        .resolve_commit(commit)
        .with_context(|| format!("Cannot resolve commit '{}'", commit))?;
    let options = options(&session, reset_committer, stash);

    let result = engine::edit_message(&mut session.git, &branch, &target, message, &options);
    report(ctx, "reword", result)
}

/// Squash `commits` into one.
pub fn squash(
    ctx: &Context,
    commits: &[String],
    message: &str,
    branch: Option<&str>,
    reset_committer: bool,
    stash: StashArgs,
) -> Result<()> {
    let mut session = Session::open(ctx)?;
    let _lock = session.lock()?;

    let branch = session.branch(branch)?;
    let targets = commits
        .iter()
        .map(|spec| {
            session
                .git
                .resolve_commit(spec)
                .with_context(|| format!("Cannot resolve commit '{}'", spec))
        })
        .collect::<Result<Vec<_>>>()?;
    let options = options(&session, reset_committer, stash);

    let result = engine::squash(&mut session.git, &branch, &targets, message, &options);
    report(ctx, "squash", result)
}

fn options(session: &Session, reset_committer: bool, stash: StashArgs) -> RewriteOptions {
    RewriteOptions {
        auto_stash: stash.resolve(session.config.auto_stash()),
        reset_committer: reset_committer || session.config.reset_committer(),
    }
}

fn report(ctx: &Context, operation: &str, result: Result<RewriteOutcome, EngineError>) -> Result<()> {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Some(hint) = hint(&err) {
                output::warn(hint, verbosity(ctx));
            }
            return Err(err).context(format!("{} failed", operation));
        }
    };

    if ctx.json {
        output::json(&RewriteReport {
            operation,
            updated_branches: vec![&outcome.branch],
            old_tip: &outcome.old_tip,
            new_tip: &outcome.new_tip,
            rewritten: &outcome.rewritten,
            stashed: outcome.stashed,
        })?;
        return Ok(());
    }

    let v = verbosity(ctx);
    for entry in &outcome.rewritten {
        output::debug(
            format!("{} -> {}", entry.original.short(7), entry.rewritten.short(7)),
            v,
        );
    }
    if outcome.stashed {
        output::print("Restored local changes.", v);
    }
    output::success(
        format!(
            "Rewrote {} ({} -> {}), {} commit(s) recreated",
            outcome.branch,
            outcome.old_tip.short(7),
            outcome.new_tip.short(7),
            outcome.rewritten.len()
        ),
        v,
    );
    output::print(
        format!("Previous tip recorded in the reflog as {}@{{1}}", outcome.branch),
        v,
    );
    Ok(())
}

/// Follow-up advice for errors the user can act on.
fn hint(err: &EngineError) -> Option<String> {
    match err {
        EngineError::DirtyWorkingDirectory { .. } => {
            Some("re-run with --auto-stash to stash and restore your changes".to_string())
        }
        EngineError::RefUpdateFailure { .. } => {
            Some("the branch changed while rewriting; run the command again".to_string())
        }
        EngineError::StashRestoreConflict { stash, .. } => Some(format!(
            "your changes are kept in {}; apply them with `git stash pop` after resolving",
            stash
        )),
        _ => None,
    }
}
