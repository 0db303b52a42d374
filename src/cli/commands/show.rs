//! show command - Show a commit and its diff

use super::{verbosity, Session};
use crate::engine::Context;
use crate::git::views::{CommitDiff, LineKind};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Show `commit` diffed against its first parent.
pub fn show(ctx: &Context, commit: &str) -> Result<()> {
    let session = Session::open(ctx)?;
    let oid = session
        .git
        .resolve_commit(commit)
        .with_context(|| format!("Cannot resolve commit '{}'", commit))?;
    let diff = session.git.commit_diff(&oid)?;

    if ctx.json {
        output::json(&diff)?;
        return Ok(());
    }

    output::print(render(&diff), verbosity(ctx));
    Ok(())
}

fn render(diff: &CommitDiff) -> String {
    let mut out = Vec::new();
    out.push(format!("commit {}", diff.hash));
    out.push(format!("Author: {}", diff.author));
    if let Some(date) = chrono::DateTime::from_timestamp(diff.date, 0) {
        out.push(format!("Date:   {}", date.to_rfc2822()));
    }
    out.push(String::new());
    out.extend(diff.message.trim_end().lines().map(|l| format!("    {}", l)));
    out.push(String::new());

    for file in &diff.files {
        let name = match &file.old_path {
            Some(old) => format!("{} -> {}", old, file.path),
            None => file.path.clone(),
        };
        out.push(format!(
            "{} {} (+{} -{})",
            file.status.letter(),
            name,
            file.insertions,
            file.deletions
        ));
        for line in &file.lines {
            let prefix = match line.kind {
                LineKind::Header => "",
                LineKind::Add => "+",
                LineKind::Delete => "-",
                LineKind::Context => " ",
            };
            out.push(format!("{}{}", prefix, line.content.trim_end_matches('\n')));
        }
    }
    out.push(format!(
        "{} file(s) changed, {} insertion(s), {} deletion(s)",
        diff.stats.files_changed, diff.stats.insertions, diff.stats.deletions
    ));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::views::{DiffLine, DiffStats, FileDiff, FileStatus};

    #[test]
    fn render_prefixes_lines_by_kind() {
        let diff = CommitDiff {
            hash: "abc".into(),
            message: "add readme\n".into(),
            author: "Alice".into(),
            date: 0,
            stats: DiffStats {
                insertions: 1,
                deletions: 0,
                files_changed: 1,
            },
            files: vec![FileDiff {
                path: "README".into(),
                status: FileStatus::Added,
                old_path: None,
                insertions: 1,
                deletions: 0,
                lines: vec![
                    DiffLine {
                        kind: LineKind::Header,
                        content: "@@ -0,0 +1 @@\n".into(),
                        old_line_no: None,
                        new_line_no: None,
                    },
                    DiffLine {
                        kind: LineKind::Add,
                        content: "hello\n".into(),
                        old_line_no: None,
                        new_line_no: Some(1),
                    },
                ],
            }],
        };

        let text = render(&diff);
        assert!(text.contains("    add readme"));
        assert!(text.contains("A README (+1 -0)"));
        assert!(text.contains("\n+hello"));
        assert!(text.ends_with("1 file(s) changed, 1 insertion(s), 0 deletion(s)"));
    }
}
