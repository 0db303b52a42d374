//! core::lock
//!
//! Exclusive per-repository lock for rewrite operations.
//!
//! Stashing, recreating commits and moving a branch are not designed to
//! interleave, so at most one rewrite may run against a repository at a time.
//! The lock file is `<common_dir>/git-rewrite/lock`, shared by every worktree
//! of the repository.
//!
//! # Invariants
//!
//! - The lock is held for the whole operation, stash restore included
//! - Acquisition never blocks: a second process fails fast
//! - The lock is released when the guard is dropped
//!
//! # Example
//!
//! ```no_run
//! use git_rewrite::core::lock::RepoLock;
//! use git_rewrite::core::paths::RewritePaths;
//! use std::path::PathBuf;
//!
//! let paths = RewritePaths::new(PathBuf::from("/repo/.git"), PathBuf::from("/repo/.git"));
//! let lock = RepoLock::acquire(&paths)?;
//! // ... rewrite ...
//! drop(lock);
//! # Ok::<(), git_rewrite::core::lock::LockError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::RewritePaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("another git-rewrite operation is running in this repository")]
    AlreadyLocked,

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on the repository, released on drop.
#[derive(Debug)]
pub struct RepoLock {
    path: PathBuf,
    /// Open handle holding the OS lock; `None` once released.
    file: Option<File>,
}

impl RepoLock {
    /// Acquire the repository lock without blocking.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be taken
    pub fn acquire(paths: &RewritePaths) -> Result<Self, LockError> {
        let dir = paths.tool_dir();
        fs::create_dir_all(&dir).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", dir.display(), e))
        })?;

        let path = paths.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock before the guard goes out of scope.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
