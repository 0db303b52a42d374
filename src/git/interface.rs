//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This is the only file in the crate that talks to `git2`. Everything else
//! sees strong types ([`Oid`], [`BranchName`]) and the owned records in
//! [`model`](super::model), and gets failures as a [`GitError`].
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::CasFailed`]: Compare-and-swap precondition failed
//! - [`GitError::StashConflict`]: A stash entry could not be re-applied
//!
//! # Example
//!
//! ```no_run
//! use git_rewrite::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let head = git.head_oid()?;
//! println!("HEAD is at {}", head.short(7));
//! # Ok::<(), git_rewrite::git::GitError>(())
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{BranchName, Oid, RefName, TypeError};

use super::model::{Commit, GitState, NewCommit, Signature, StashHandle, WorktreeStatus};
use super::store::ObjectStore;
use super::views::{
    sort_branches, BranchInfo, CommitDiff, CommitPage, CommitSummary, DiffLine, DiffStats,
    FileDiff, FileStatus, LineKind, RepoSummary,
};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Compare-and-swap precondition failed.
    ///
    /// The ref moved between the time it was read and the time it was
    /// written.
    #[error("CAS failed for {refname}: expected {expected}, found {actual}")]
    CasFailed {
        /// The ref being updated
        refname: String,
        /// The expected old value
        expected: String,
        /// The actual current value
        actual: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID or revision that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// A stash entry could not be applied cleanly. The entry is kept.
    #[error("stash could not be re-applied: {message}")]
    StashConflict {
        /// Description of the failure
        message: String,
    },

    /// The stash entry we created is gone.
    #[error("stash entry {stash} not found")]
    StashNotFound {
        /// The stash commit id
        stash: String,
    },

    /// A commit message that cannot be replayed without changing its bytes.
    #[error("commit {oid} has a message in {encoding} that cannot be replayed unchanged")]
    UnsupportedEncoding {
        /// The commit carrying the message
        oid: String,
        /// The declared encoding, or `invalid UTF-8`
        encoding: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context == "HEAD" {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: err.message().to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => GitError::InvalidRefName { message: msg },
            TypeError::InvalidBranchName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// Locations of a repository on disk.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Per-worktree git directory.
    pub git_dir: PathBuf,
    /// Shared git directory (same as `git_dir` outside linked worktrees).
    pub common_dir: PathBuf,
    /// Root of the working tree.
    pub work_dir: PathBuf,
}

fn to_oid(id: git2::Oid) -> Result<Oid, GitError> {
    Ok(Oid::new(id.to_string())?)
}

fn to_git2(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}

fn to_signature(sig: &git2::Signature<'_>) -> Signature {
    Signature {
        name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
        email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
        time: sig.when().seconds(),
        offset_minutes: sig.when().offset_minutes(),
    }
}

fn display_path(file: git2::DiffFile<'_>) -> Option<String> {
    file.path().map(|p| p.to_string_lossy().into_owned())
}

/// `original` itself while it still reads as `wanted`, so identities libgit2
/// would refuse to build (empty email, odd whitespace, non-UTF-8 bytes) are
/// copied verbatim. A fresh signature otherwise.
fn carry_signature<'a>(
    original: Option<git2::Signature<'a>>,
    wanted: &Signature,
) -> Result<git2::Signature<'a>, GitError> {
    match original {
        Some(sig) if to_signature(&sig) == *wanted => Ok(sig),
        _ => from_signature(wanted),
    }
}

/// Refuse to replay a message git2 would rewrite: one whose bytes are not
/// UTF-8 or that declares another encoding.
fn ensure_replayable_message(commit: &git2::Commit<'_>) -> Result<(), GitError> {
    let declared = commit
        .message_encoding()
        .filter(|enc| !enc.eq_ignore_ascii_case("utf-8") && !enc.eq_ignore_ascii_case("utf8"));
    let encoding = match (declared, std::str::from_utf8(commit.message_bytes())) {
        (Some(enc), _) => enc.to_string(),
        (None, Err(_)) => "invalid UTF-8".to_string(),
        (None, Ok(_)) => return Ok(()),
    };
    Err(GitError::UnsupportedEncoding {
        oid: commit.id().to_string(),
        encoding,
    })
}

fn from_signature(sig: &Signature) -> Result<git2::Signature<'static>, GitError> {
    let when = git2::Time::new(sig.time, sig.offset_minutes);
    git2::Signature::new(&sig.name, &sig.email, &when)
        .map_err(|e| GitError::from_git2(e, &format!("signature {sig}")))
}

/// The single interface to a Git repository.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository. Succeeding
    /// here is what it means for a path to be a valid repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Get repository locations.
    pub fn info(&self) -> Result<RepoInfo, GitError> {
        let git_dir = self.repo.path().to_path_buf();
        let common_dir = self.repo.commondir().to_path_buf();
        let work_dir = self.repo.workdir().ok_or(GitError::BareRepo)?.to_path_buf();

        Ok(RepoInfo {
            git_dir,
            common_dir,
            work_dir,
        })
    }

    /// Name, path and current branch, for display.
    pub fn repo_summary(&self) -> Result<RepoSummary, GitError> {
        let info = self.info()?;
        let name = info
            .work_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let branch = self
            .current_branch()?
            .map(|b| b.to_string())
            .unwrap_or_else(|| "HEAD".to_string());

        Ok(RepoSummary {
            name,
            path: info.work_dir.display().to_string(),
            branch,
        })
    }

    // =========================================================================
    // Ref Resolution
    // =========================================================================

    /// Get HEAD commit OID.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if HEAD is unborn (new repository)
    pub fn head_oid(&self) -> Result<Oid, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        let oid = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?
            .id();

        to_oid(oid)
    }

    /// Resolve a revision (full or abbreviated hash, branch, `HEAD~2`, ...)
    /// to a commit id.
    pub fn resolve_commit(&self, revspec: &str) -> Result<Oid, GitError> {
        let commit = self
            .repo
            .revparse_single(revspec)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| match e.code() {
                git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec => {
                    GitError::ObjectNotFound {
                        oid: revspec.to_string(),
                    }
                }
                _ => GitError::from_git2(e, revspec),
            })?;
        to_oid(commit.id())
    }

    // =========================================================================
    // History Queries
    // =========================================================================

    /// Walk history from HEAD, newest first by commit time. Children always
    /// come before their parents, even when timestamps tie.
    ///
    /// An unborn HEAD has no history and yields nothing.
    fn walk_head(&self) -> Result<Vec<CommitSummary>, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;
        match revwalk.push_head() {
            Ok(()) => {}
            Err(e)
                if matches!(
                    e.code(),
                    git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound
                ) =>
            {
                return Ok(Vec::new())
            }
            Err(e) => return Err(GitError::from_git2(e, "HEAD")),
        }

        revwalk
            .map(|id| {
                let id = id?;
                let commit = self
                    .repo
                    .find_commit(id)
                    .map_err(|e| GitError::from_git2(e, &id.to_string()))?;
                Self::summarize(&commit)
            })
            .collect()
    }

    fn summarize(commit: &git2::Commit<'_>) -> Result<CommitSummary, GitError> {
        let author = to_signature(&commit.author());
        let hash = commit.id().to_string();
        Ok(CommitSummary {
            short_hash: hash.chars().take(7).collect(),
            hash,
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            author: author.name,
            email: author.email,
            date: commit.time().seconds(),
            parent_ids: commit.parent_ids().map(|id| id.to_string()).collect(),
        })
    }

    /// A page of history reachable from HEAD.
    pub fn list_commits(&self, offset: usize, limit: usize) -> Result<CommitPage, GitError> {
        Ok(CommitPage::paginate(self.walk_head()?, offset, limit))
    }

    /// A page of the commits reachable from HEAD that match `query`.
    ///
    /// Case-insensitive: the hash matches by prefix, the message, author name
    /// and email by substring. `total_count` counts matches, not history.
    pub fn search_commits(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<CommitPage, GitError> {
        let query = query.to_lowercase();
        let matching = self
            .walk_head()?
            .into_iter()
            .filter(|c| c.matches(&query))
            .collect();
        Ok(CommitPage::paginate(matching, offset, limit))
    }

    /// Local branches, the current one first and the rest by name.
    pub fn list_branch_info(&self) -> Result<Vec<BranchInfo>, GitError> {
        let current = self.current_branch()?;
        let mut result = Vec::new();

        for entry in self.repo.branches(Some(git2::BranchType::Local))? {
            let (branch, _) = entry?;
            if let Some(name) = branch.name()? {
                result.push(BranchInfo {
                    is_current: current.as_ref().is_some_and(|c| c.as_str() == name),
                    name: name.to_string(),
                });
            }
        }

        sort_branches(&mut result);
        Ok(result)
    }

    /// Diff a commit against its first parent (the empty tree for a root).
    pub fn commit_diff(&self, oid: &Oid) -> Result<CommitDiff, GitError> {
        let commit = self
            .repo
            .find_commit(to_git2(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        let tree = commit.tree()?;
        let parent_tree = match commit.parents().next() {
            Some(parent) => Some(parent.tree()?),
            None => None,
        };

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
        let stats = diff.stats()?;

        let mut files = Vec::new();
        for (idx, delta) in diff.deltas().enumerate() {
            let status = match delta.status() {
                git2::Delta::Added => FileStatus::Added,
                git2::Delta::Deleted => FileStatus::Deleted,
                git2::Delta::Modified => FileStatus::Modified,
                git2::Delta::Renamed => FileStatus::Renamed,
                git2::Delta::Copied => FileStatus::Copied,
                _ => FileStatus::Unknown,
            };
            let path = display_path(delta.new_file())
                .or_else(|| display_path(delta.old_file()))
                .unwrap_or_default();
            let old_path = match status {
                FileStatus::Renamed => display_path(delta.old_file()),
                _ => None,
            };

            let mut file = FileDiff {
                path,
                status,
                old_path,
                insertions: 0,
                deletions: 0,
                lines: Vec::new(),
            };
            if let Some(patch) = git2::Patch::from_diff(&diff, idx)? {
                Self::collect_lines(&patch, &mut file)?;
            }
            files.push(file);
        }

        let author = to_signature(&commit.author());
        Ok(CommitDiff {
            hash: oid.to_string(),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            author: author.name,
            date: commit.time().seconds(),
            stats: DiffStats {
                insertions: stats.insertions(),
                deletions: stats.deletions(),
                files_changed: stats.files_changed(),
            },
            files,
        })
    }

    fn collect_lines(patch: &git2::Patch<'_>, file: &mut FileDiff) -> Result<(), GitError> {
        for hunk_idx in 0..patch.num_hunks() {
            let (hunk, line_count) = patch.hunk(hunk_idx)?;
            file.lines.push(DiffLine {
                kind: LineKind::Header,
                content: format!(
                    "@@ -{},{} +{},{} @@",
                    hunk.old_start(),
                    hunk.old_lines(),
                    hunk.new_start(),
                    hunk.new_lines()
                ),
                old_line_no: None,
                new_line_no: None,
            });

            for line_idx in 0..line_count {
                let line = patch.line_in_hunk(hunk_idx, line_idx)?;
                let old_no = line.old_lineno().map(|n| n as usize);
                let new_no = line.new_lineno().map(|n| n as usize);
                let (kind, old_line_no, new_line_no) = match line.origin() {
                    '+' => {
                        file.insertions += 1;
                        (LineKind::Add, None, new_no)
                    }
                    '-' => {
                        file.deletions += 1;
                        (LineKind::Delete, old_no, None)
                    }
                    ' ' => (LineKind::Context, old_no, new_no),
                    // "\ No newline at end of file" and friends
                    _ => continue,
                };
                file.lines.push(DiffLine {
                    kind,
                    content: String::from_utf8_lossy(line.content()).into_owned(),
                    old_line_no,
                    new_line_no,
                });
            }
        }
        Ok(())
    }

    /// Index of the stash entry whose commit is `stash`, if still present.
    fn stash_index(&mut self, stash: &git2::Oid) -> Result<Option<usize>, GitError> {
        let mut found = None;
        self.repo.stash_foreach(|index, _message, oid| {
            if oid == stash {
                found = Some(index);
                false
            } else {
                true
            }
        })?;
        Ok(found)
    }
}

impl ObjectStore for Git {
    fn read_commit(&self, oid: &Oid) -> Result<Commit, GitError> {
        let commit = self
            .repo
            .find_commit(to_git2(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let read = Commit {
            id: oid.clone(),
            tree: to_oid(commit.tree_id())?,
            parents: commit.parent_ids().map(to_oid).collect::<Result<_, _>>()?,
            author: to_signature(&commit.author()),
            committer: to_signature(&commit.committer()),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        };
        Ok(read)
    }

    fn write_commit(&self, commit: &NewCommit) -> Result<Oid, GitError> {
        let tree = self
            .repo
            .find_tree(to_git2(&commit.tree)?)
            .map_err(|e| GitError::from_git2(e, commit.tree.as_str()))?;
        let parent = self
            .repo
            .find_commit(to_git2(&commit.parent)?)
            .map_err(|e| GitError::from_git2(e, commit.parent.as_str()))?;
        let source = commit
            .source
            .as_ref()
            .map(|oid| {
                self.repo
                    .find_commit(to_git2(oid)?)
                    .map_err(|e| GitError::from_git2(e, oid.as_str()))
            })
            .transpose()?;

        if let Some(original) = &source {
            if commit.message == String::from_utf8_lossy(original.message_bytes()) {
                ensure_replayable_message(original)?;
            }
        }
        let author = carry_signature(source.as_ref().map(|c| c.author()), &commit.author)?;
        let committer = carry_signature(source.as_ref().map(|c| c.committer()), &commit.committer)?;

        let id = self
            .repo
            .commit(None, &author, &committer, &commit.message, &tree, &[&parent])
            .map_err(|e| GitError::from_git2(e, "write commit"))?;
        to_oid(id)
    }

    fn branch_tip(&self, branch: &BranchName) -> Result<Option<Oid>, GitError> {
        let refname = RefName::for_branch(branch);
        match self.repo.find_reference(refname.as_str()) {
            Ok(reference) => reference.target().map(to_oid).transpose(),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, refname.as_str())),
        }
    }

    /// Uses `reference_matching`, so the compare and the write happen under
    /// libgit2's ref lock.
    fn update_branch(
        &self,
        branch: &BranchName,
        new: &Oid,
        expected: &Oid,
        message: &str,
    ) -> Result<(), GitError> {
        let refname = RefName::for_branch(branch);
        match self.repo.reference_matching(
            refname.as_str(),
            to_git2(new)?,
            true,
            to_git2(expected)?,
            message,
        ) {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.code(), git2::ErrorCode::Modified | git2::ErrorCode::NotFound) => {
                let actual = self
                    .branch_tip(branch)?
                    .map(|oid| oid.to_string())
                    .unwrap_or_else(|| "<none>".to_string());
                Err(GitError::CasFailed {
                    refname: refname.to_string(),
                    expected: expected.to_string(),
                    actual,
                })
            }
            Err(e) => Err(GitError::from_git2(e, refname.as_str())),
        }
    }

    fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                // HEAD names a branch with no commits yet
                return match self.repo.find_reference("HEAD")?.symbolic_target() {
                    Some(target) => Ok(RefName::new(target)?.branch()),
                    None => Ok(None),
                };
            }
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(Some(BranchName::new(name)?));
            }
        }

        Ok(None) // Detached HEAD
    }

    fn state(&self) -> GitState {
        match self.repo.state() {
            git2::RepositoryState::Clean => GitState::Clean,
            git2::RepositoryState::Rebase
            | git2::RepositoryState::RebaseInteractive
            | git2::RepositoryState::RebaseMerge => GitState::Rebase,
            git2::RepositoryState::Merge => GitState::Merge,
            git2::RepositoryState::CherryPick | git2::RepositoryState::CherryPickSequence => {
                GitState::CherryPick
            }
            git2::RepositoryState::Revert | git2::RepositoryState::RevertSequence => {
                GitState::Revert
            }
            git2::RepositoryState::Bisect => GitState::Bisect,
            git2::RepositoryState::ApplyMailbox | git2::RepositoryState::ApplyMailboxOrRebase => {
                GitState::ApplyMailbox
            }
        }
    }

    fn worktree_status(&self, include_untracked: bool) -> Result<WorktreeStatus, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(include_untracked)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(|e| GitError::from_git2(e, "status"))?;

        let mut result = WorktreeStatus::default();

        for entry in statuses.iter() {
            let status = entry.status();

            if status.is_conflicted() {
                result.has_conflicts = true;
            }

            if status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
            {
                result.staged += 1;
            }

            if status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange()
            {
                result.unstaged += 1;
            }

            if status.is_wt_new() {
                result.untracked += 1;
            }
        }

        Ok(result)
    }

    fn stash_save(&mut self, message: &str) -> Result<StashHandle, GitError> {
        let stasher = self
            .repo
            .signature()
            .or_else(|_| git2::Signature::now("git-rewrite", "git-rewrite@localhost"))?;
        let id = self
            .repo
            .stash_save(&stasher, message, None)
            .map_err(|e| GitError::from_git2(e, "stash save"))?;
        Ok(StashHandle(to_oid(id)?))
    }

    fn stash_pop(&mut self, handle: &StashHandle) -> Result<(), GitError> {
        let stash = to_git2(&handle.0)?;
        let index = self
            .stash_index(&stash)?
            .ok_or_else(|| GitError::StashNotFound {
                stash: handle.0.to_string(),
            })?;

        let mut opts = git2::StashApplyOptions::new();
        opts.reinstantiate_index();
        self.repo
            .stash_pop(index, Some(&mut opts))
            .map_err(|e| GitError::StashConflict {
                message: e.message().to_string(),
            })
    }

    fn signature(&self) -> Result<Signature, GitError> {
        let sig = self
            .repo
            .signature()
            .map_err(|e| GitError::from_git2(e, "user.name/user.email"))?;
        Ok(to_signature(&sig))
    }

    /// Safe checkout: refuses to overwrite local modifications.
    fn checkout_branch(&mut self, branch: &BranchName) -> Result<(), GitError> {
        let refname = RefName::for_branch(branch);
        let target = self
            .repo
            .find_reference(refname.as_str())
            .map_err(|e| GitError::from_git2(e, refname.as_str()))?
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, refname.as_str()))?;

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_tree(target.as_object(), Some(&mut checkout))
            .map_err(|e| GitError::from_git2(e, "checkout"))?;
        self.repo
            .set_head(refname.as_str())
            .map_err(|e| GitError::from_git2(e, refname.as_str()))
    }
}
