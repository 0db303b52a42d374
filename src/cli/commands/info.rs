//! info command - Show repository name, path, branch and state

use super::{verbosity, Session};
use crate::engine::Context;
use crate::git::{GitState, ObjectStore, RepoSummary, WorktreeStatus};
use crate::ui::output;
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct InfoReport {
    #[serde(flatten)]
    repo: RepoSummary,
    state: GitState,
    worktree: WorktreeStatus,
    auto_stash: bool,
    reset_committer: bool,
    page_size: usize,
}

/// Show what git-rewrite sees in the current repository.
pub fn info(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let report = InfoReport {
        repo: session.git.repo_summary()?,
        state: session.git.state(),
        worktree: session.git.worktree_status(true)?,
        auto_stash: session.config.auto_stash(),
        reset_committer: session.config.reset_committer(),
        page_size: session.config.page_size(),
    };

    if ctx.json {
        output::json(&report)?;
        return Ok(());
    }

    let v = verbosity(ctx);
    output::print(format!("Repository: {}", report.repo.name), v);
    output::print(format!("Path: {}", report.repo.path), v);
    output::print(format!("Branch: {}", report.repo.branch), v);
    output::print(format!("State: {}", report.state), v);
    let mut tree = report.worktree.describe();
    if report.worktree.untracked > 0 {
        tree.push_str(&format!(" ({} untracked)", report.worktree.untracked));
    }
    output::print(format!("Working tree: {}", tree), v);
    output::print(format!("Auto-stash: {}", on_off(report.auto_stash)), v);
    output::print(format!("Reset committer: {}", on_off(report.reset_committer)), v);
    Ok(())
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
