//! switch command - Check out a local branch

use super::{verbosity, Session};
use crate::cli::args::StashArgs;
use crate::core::types::BranchName;
use crate::engine::{self, Context};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Check out `branch`, carrying local changes over if auto-stash is on.
pub fn switch(ctx: &Context, branch: &str, stash: StashArgs) -> Result<()> {
    let mut session = Session::open(ctx)?;
    let _lock = session.lock()?;

    let branch = BranchName::new(branch).context("Invalid branch name")?;
    let auto_stash = stash.resolve(session.config.auto_stash());
    let outcome = engine::switch_branch(&mut session.git, &branch, auto_stash)
        .with_context(|| format!("Cannot switch to '{}'", branch))?;

    if ctx.json {
        output::json(&outcome)?;
        return Ok(());
    }

    let v = verbosity(ctx);
    if outcome.previous.as_ref() == Some(&outcome.branch) {
        output::print(format!("Already on '{}'", outcome.branch), v);
    } else {
        output::success(format!("Switched to branch '{}'", outcome.branch), v);
        if outcome.stashed {
            output::print("Local changes carried over.", v);
        }
    }
    Ok(())
}
