//! log command - List commits reachable from HEAD

use super::{verbosity, Session};
use crate::engine::Context;
use crate::git::CommitSummary;
use crate::ui::output;
use anyhow::{bail, Result};

/// Print one page of history, optionally filtered by `search`.
pub fn log(ctx: &Context, offset: usize, limit: Option<usize>, search: Option<&str>) -> Result<()> {
    let session = Session::open(ctx)?;
    let limit = limit.unwrap_or_else(|| session.config.page_size());
    if limit == 0 {
        bail!("--limit must be at least 1");
    }

    let page = match search.map(str::trim).filter(|q| !q.is_empty()) {
        Some(query) => session.git.search_commits(query, offset, limit)?,
        None => session.git.list_commits(offset, limit)?,
    };

    if ctx.json {
        output::json(&page)?;
        return Ok(());
    }

    let v = verbosity(ctx);
    if page.commits.is_empty() {
        output::print("No commits.", v);
        return Ok(());
    }
    for commit in &page.commits {
        output::print(format_line(commit), v);
    }
    if page.has_more {
        output::print(
            format!(
                "-- {} of {} shown; next page: --offset {}",
                offset + page.commits.len(),
                page.total_count,
                offset + limit
            ),
            v,
        );
    }
    Ok(())
}

fn format_line(commit: &CommitSummary) -> String {
    let date = chrono::DateTime::from_timestamp(commit.date, 0)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "????-??-??".to_string());
    format!(
        "{} {} {:<16} {}",
        commit.short_hash,
        date,
        output::truncate_subject(&commit.author, 16),
        output::truncate_subject(&commit.message, 72)
    )
}
