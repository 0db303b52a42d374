//! branches command - List local branches

use super::{verbosity, Session};
use crate::engine::Context;
use crate::ui::output;
use anyhow::Result;

/// List local branches, the current one first and marked with `*`.
pub fn branches(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let branches = session.git.list_branch_info()?;

    if ctx.json {
        output::json(&branches)?;
        return Ok(());
    }

    let v = verbosity(ctx);
    for branch in &branches {
        let marker = if branch.is_current { "* " } else { "  " };
        output::print(format!("{}{}", marker, branch.name), v);
    }
    Ok(())
}
