//! core::paths
//!
//! Where git-rewrite keeps its own files inside a repository.
//!
//! All storage lives under `<common_dir>/git-rewrite/` so that linked
//! worktrees of one repository share a single lock and a single repo config:
//!
//! - `config.toml` - Repository configuration
//! - `lock` - Exclusive lock held while a rewrite runs
//!
//! # Example
//!
//! ```
//! use git_rewrite::core::paths::RewritePaths;
//! use std::path::PathBuf;
//!
//! let paths = RewritePaths::new(
//!     PathBuf::from("/repo/.git/worktrees/topic"),
//!     PathBuf::from("/repo/.git"),
//! );
//!
//! assert!(paths.is_worktree());
//! assert_eq!(paths.lock_path(), PathBuf::from("/repo/.git/git-rewrite/lock"));
//! ```

use std::path::{Path, PathBuf};

use crate::git::RepoInfo;

/// Name of the directory git-rewrite owns under the common git dir.
const TOOL_DIR: &str = "git-rewrite";

/// Path routing for git-rewrite storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePaths {
    /// Per-worktree git directory (`.git/worktrees/<name>` for linked worktrees).
    pub git_dir: PathBuf,
    /// Shared git directory holding objects and refs.
    pub common_dir: PathBuf,
}

impl RewritePaths {
    pub fn new(git_dir: PathBuf, common_dir: PathBuf) -> Self {
        Self {
            git_dir,
            common_dir,
        }
    }

    pub fn from_repo_info(info: &RepoInfo) -> Self {
        Self::new(info.git_dir.clone(), info.common_dir.clone())
    }

    /// `<common_dir>/git-rewrite`
    pub fn tool_dir(&self) -> PathBuf {
        self.common_dir.join(TOOL_DIR)
    }

    /// `<common_dir>/git-rewrite/config.toml`
    pub fn config_path(&self) -> PathBuf {
        self.tool_dir().join("config.toml")
    }

    /// `<common_dir>/git-rewrite/lock`
    pub fn lock_path(&self) -> PathBuf {
        self.tool_dir().join("lock")
    }

    /// Whether these paths belong to a linked worktree.
    pub fn is_worktree(&self) -> bool {
        self.git_dir != self.common_dir
    }

    pub fn common_dir(&self) -> &Path {
        &self.common_dir
    }
}
