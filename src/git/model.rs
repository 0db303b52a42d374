//! git::model
//!
//! Records exchanged with the object store.
//!
//! These are plain owned values: reading a commit copies it out of the store,
//! and writing one hands the store a [`NewCommit`] to hash and persist. Nothing
//! here borrows from a `git2::Repository`, so the engine can run unchanged
//! against [`MemoryStore`](super::memory::MemoryStore).

use serde::{Deserialize, Serialize};

use crate::core::types::Oid;

/// Identity and timestamp of an author or committer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    /// Seconds since the Unix epoch.
    pub time: i64,
    /// Offset from UTC in minutes.
    pub offset_minutes: i32,
}

impl Signature {
    /// The timestamp with its original UTC offset.
    pub fn datetime(&self) -> chrono::DateTime<chrono::FixedOffset> {
        let offset = chrono::FixedOffset::east_opt(self.offset_minutes * 60)
            .unwrap_or_else(|| chrono::Offset::fix(&chrono::Utc));
        chrono::DateTime::from_timestamp(self.time, 0)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH)
            .with_timezone(&offset)
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// A commit as read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: Oid,
    pub tree: Oid,
    /// Parents in order; the first parent is the mainline.
    pub parents: Vec<Oid>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl Commit {
    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn first_parent(&self) -> Option<&Oid> {
        self.parents.first()
    }
}

/// A single-parent commit to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommit {
    pub tree: Oid,
    pub parent: Oid,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
    /// Existing commit the identities and message come from. Stores copy
    /// whatever still matches it byte for byte instead of re-encoding.
    pub source: Option<Oid>,
}

/// Opaque handle to a stash entry created by this process.
///
/// Wraps the stash commit id, which stays stable while other entries are
/// pushed or dropped around it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StashHandle(pub Oid);

impl std::fmt::Display for StashHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stash {}", self.0.short(7))
    }
}

/// State of in-progress Git operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GitState {
    Clean,
    Rebase,
    Merge,
    CherryPick,
    Revert,
    Bisect,
    ApplyMailbox,
}

impl GitState {
    pub fn is_in_progress(&self) -> bool {
        !matches!(self, GitState::Clean)
    }

    pub fn description(&self) -> &'static str {
        match self {
            GitState::Clean => "clean",
            GitState::Rebase => "rebase",
            GitState::Merge => "merge",
            GitState::CherryPick => "cherry-pick",
            GitState::Revert => "revert",
            GitState::Bisect => "bisect",
            GitState::ApplyMailbox => "apply-mailbox",
        }
    }
}

impl std::fmt::Display for GitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Summary of working tree status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorktreeStatus {
    /// Paths with staged changes.
    pub staged: usize,
    /// Tracked paths with unstaged changes.
    pub unstaged: usize,
    /// Untracked paths (only counted when requested).
    pub untracked: usize,
    pub has_conflicts: bool,
}

impl WorktreeStatus {
    /// No staged or unstaged changes and no conflicts. Untracked files are ignored.
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.unstaged == 0 && !self.has_conflicts
    }

    /// Short human description, e.g. `2 staged, 1 unstaged`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.staged > 0 {
            parts.push(format!("{} staged", self.staged));
        }
        if self.unstaged > 0 {
            parts.push(format!("{} unstaged", self.unstaged));
        }
        if self.has_conflicts {
            parts.push("unresolved conflicts".to_string());
        }
        if parts.is_empty() {
            "clean".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(time: i64, offset_minutes: i32) -> Signature {
        Signature {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            time,
            offset_minutes,
        }
    }

    #[test]
    fn datetime_keeps_offset() {
        let dt = sig(0, 120).datetime();
        assert_eq!(dt.offset().local_minus_utc(), 7200);
        assert_eq!(dt.timestamp(), 0);
    }

    #[test]
    fn signature_display() {
        assert_eq!(sig(0, 0).to_string(), "Ada <ada@example.com>");
    }

    #[test]
    fn commit_shape_helpers() {
        let oid = Oid::new("1".repeat(40)).unwrap();
        let mut commit = Commit {
            id: oid.clone(),
            tree: oid.clone(),
            parents: vec![],
            author: sig(0, 0),
            committer: sig(0, 0),
            message: "subject\n\nbody\n".into(),
        };
        assert_eq!(commit.summary(), "subject");
        assert!(commit.is_root());

        commit.parents = vec![oid.clone(), oid];
        assert!(commit.is_merge());
        assert!(!commit.is_root());
    }

    #[test]
    fn worktree_status_cleanliness() {
        assert!(WorktreeStatus::default().is_clean());
        assert!(WorktreeStatus {
            untracked: 4,
            ..Default::default()
        }
        .is_clean());

        let dirty = WorktreeStatus {
            staged: 2,
            unstaged: 1,
            ..Default::default()
        };
        assert!(!dirty.is_clean());
        assert_eq!(dirty.describe(), "2 staged, 1 unstaged");

        let conflicted = WorktreeStatus {
            has_conflicts: true,
            ..Default::default()
        };
        assert!(!conflicted.is_clean());
    }

    #[test]
    fn state_in_progress() {
        assert!(!GitState::Clean.is_in_progress());
        assert!(GitState::Rebase.is_in_progress());
        assert_eq!(GitState::CherryPick.to_string(), "cherry-pick");
    }
}
