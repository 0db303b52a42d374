//! git::views
//!
//! Read-only projections of repository history for display.
//!
//! These are what `log`, `show`, `branches` and `info` print. They are
//! serializable so `--json` can emit them unchanged.

use serde::{Deserialize, Serialize};

/// One line of history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub hash: String,
    pub short_hash: String,
    /// Full message.
    pub message: String,
    pub author: String,
    pub email: String,
    /// Author time, seconds since the Unix epoch.
    pub date: i64,
    pub parent_ids: Vec<String>,
}

impl CommitSummary {
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Whether `query` (already lowercased) matches this commit.
    ///
    /// The hash matches by prefix; message, author name and email match by
    /// substring.
    pub fn matches(&self, query: &str) -> bool {
        self.hash.starts_with(query)
            || self.message.to_lowercase().contains(query)
            || self.author.to_lowercase().contains(query)
            || self.email.to_lowercase().contains(query)
    }
}

/// A window onto a longer history listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPage {
    pub commits: Vec<CommitSummary>,
    pub has_more: bool,
    pub total_count: usize,
}

impl CommitPage {
    /// Slice `all` to `[offset, offset + limit)`.
    pub fn paginate(all: Vec<CommitSummary>, offset: usize, limit: usize) -> Self {
        let total_count = all.len();
        let commits: Vec<_> = all.into_iter().skip(offset).take(limit).collect();
        let has_more = offset.saturating_add(commits.len()) < total_count;
        Self {
            commits,
            has_more,
            total_count,
        }
    }
}

/// A local branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    pub is_current: bool,
}

/// Order branches with the current one first, then by name.
pub fn sort_branches(branches: &mut [BranchInfo]) {
    branches.sort_by(|a, b| b.is_current.cmp(&a.is_current).then_with(|| a.name.cmp(&b.name)));
}

/// Kind of a line inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Header,
    Add,
    Delete,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: LineKind,
    pub content: String,
    pub old_line_no: Option<usize>,
    pub new_line_no: Option<usize>,
}

/// How a file changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    Unknown,
}

impl FileStatus {
    /// Single letter as printed by `git show --name-status`.
    pub fn letter(&self) -> char {
        match self {
            FileStatus::Added => 'A',
            FileStatus::Deleted => 'D',
            FileStatus::Modified => 'M',
            FileStatus::Renamed => 'R',
            FileStatus::Copied => 'C',
            FileStatus::Unknown => '?',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub status: FileStatus,
    /// Previous path, for renames only.
    pub old_path: Option<String>,
    pub insertions: usize,
    pub deletions: usize,
    pub lines: Vec<DiffLine>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub insertions: usize,
    pub deletions: usize,
    pub files_changed: usize,
}

/// A commit and its changes against the first parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDiff {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub date: i64,
    pub stats: DiffStats,
    pub files: Vec<FileDiff>,
}

/// Identity of the open repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    /// Name of the working directory.
    pub name: String,
    pub path: String,
    /// Current branch, or `HEAD` when detached.
    pub branch: String,
}
