//! git::memory
//!
//! In-memory object store for deterministic testing.
//!
//! # Design
//!
//! `MemoryStore` models just enough of a repository to exercise the rewrite
//! engine without touching disk: content-addressed commits and trees, local
//! branches with reflogs, a symbolic HEAD, an index, a working tree and a
//! stash stack. Trees are flat maps from path to file contents.
//!
//! Ids are SHA-256 digests of a canonical encoding, so identical content
//! always gets an identical id and any change to a commit's fields changes
//! its id.
//!
//! Failures can be injected with [`FailOn`], and a concurrent writer can be
//! simulated with [`MemoryStore::race_branch`]. Every mutating call is
//! recorded as a [`MemoryOp`] for verification.
//!
//! # Example
//!
//! ```
//! use git_rewrite::git::{MemoryStore, ObjectStore};
//!
//! let store = MemoryStore::new();
//! let a = store.commit("A", &[("a.txt", "1")]);
//! let b = store.commit("B", &[("b.txt", "2")]);
//!
//! assert_eq!(store.read_commit(&b).unwrap().parents, vec![a]);
//! assert_eq!(store.tip("main"), Some(b));
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use sha2::{Digest, Sha256};

use crate::core::types::{BranchName, Oid};

use super::model::{Commit, GitState, NewCommit, Signature, StashHandle, WorktreeStatus};
use super::store::ObjectStore;
use super::GitError;

/// Flat tree contents: path to file contents.
pub type Files = BTreeMap<String, String>;

/// Start of the store's clock, seconds since the epoch.
const EPOCH: i64 = 1_700_000_000;

/// Which operation should fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailOn {
    /// `write_commit` fails once this many commits have been written.
    WriteAfter(usize),
    /// `stash_save` fails.
    StashSave,
    /// `stash_pop` fails as if the entry conflicted. The entry is kept.
    StashPop,
    /// `signature` fails as if no identity were configured.
    Signature,
}

/// Recorded mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryOp {
    WriteCommit { parent: Oid },
    UpdateBranch { branch: String, new: Oid },
    StashSave,
    StashPop,
    Checkout { branch: String },
}

/// One reflog line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflogEntry {
    pub old: Option<Oid>,
    pub new: Oid,
    pub message: String,
}

#[derive(Debug, Clone)]
struct StashEntry {
    id: Oid,
    /// HEAD tree when the entry was saved.
    base: Files,
    index: Files,
    /// Working tree contents of every path that was tracked when saving;
    /// absent paths were deleted.
    worktree: Files,
    tracked: BTreeSet<String>,
}

#[derive(Debug)]
struct MemoryStoreInner {
    commits: HashMap<Oid, Commit>,
    trees: HashMap<Oid, Files>,
    branches: BTreeMap<BranchName, Oid>,
    reflogs: HashMap<BranchName, Vec<ReflogEntry>>,
    /// Branch HEAD points at; `None` when detached.
    head: Option<BranchName>,
    /// Commit HEAD points at when detached.
    detached: Option<Oid>,
    index: Files,
    worktree: Files,
    stashes: Vec<StashEntry>,
    state: GitState,
    identity: Signature,
    clock: i64,
    fail_on: Option<FailOn>,
    race: Option<(BranchName, Oid)>,
    operations: Vec<MemoryOp>,
    written: usize,
}

/// In-memory repository implementing [`ObjectStore`].
///
/// Clones share state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

fn digest(kind: &str, parts: &[&str]) -> Oid {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    for part in parts {
        hasher.update([0u8]);
        hasher.update(part.as_bytes());
    }
    // 64 lowercase hex digits always form a valid id
    Oid::new(hex::encode(hasher.finalize())).unwrap_or_else(|_| Oid::zero())
}

fn signature_line(sig: &Signature) -> String {
    format!("{} <{}> {} {}", sig.name, sig.email, sig.time, sig.offset_minutes)
}

fn commit_id(commit: &NewCommit) -> Oid {
    digest(
        "commit",
        &[
            commit.tree.as_str(),
            commit.parent.as_str(),
            &signature_line(&commit.author),
            &signature_line(&commit.committer),
            &commit.message,
        ],
    )
}

fn tree_id(files: &Files) -> Oid {
    let parts: Vec<&str> = files
        .iter()
        .flat_map(|(path, content)| [path.as_str(), content.as_str()])
        .collect();
    digest("tree", &parts)
}

impl MemoryStoreInner {
    fn tree_of(&self, commit: &Oid) -> Files {
        self.commits
            .get(commit)
            .and_then(|c| self.trees.get(&c.tree))
            .cloned()
            .unwrap_or_default()
    }

    fn head_oid(&self) -> Option<Oid> {
        match &self.head {
            Some(branch) => self.branches.get(branch).cloned(),
            None => self.detached.clone(),
        }
    }

    fn head_tree(&self) -> Files {
        self.head_oid()
            .map(|oid| self.tree_of(&oid))
            .unwrap_or_default()
    }

    fn tracked_paths(&self, head: &Files) -> BTreeSet<String> {
        self.index.keys().chain(head.keys()).cloned().collect()
    }

    fn status(&self, include_untracked: bool) -> WorktreeStatus {
        let head = self.head_tree();
        let staged = self
            .tracked_paths(&head)
            .iter()
            .filter(|path| self.index.get(*path) != head.get(*path))
            .count();
        let unstaged = self
            .index
            .keys()
            .filter(|path| self.worktree.get(*path) != self.index.get(*path))
            .count();
        let untracked = if include_untracked {
            self.worktree
                .keys()
                .filter(|path| !self.index.contains_key(*path))
                .count()
        } else {
            0
        };

        WorktreeStatus {
            staged,
            unstaged,
            untracked,
            has_conflicts: false,
        }
    }

    /// Replace tracked content with `files`, leaving untracked paths alone.
    fn reset_to(&mut self, files: &Files) {
        let head = self.head_tree();
        for path in self.tracked_paths(&head) {
            self.worktree.remove(&path);
        }
        self.worktree
            .extend(files.iter().map(|(p, c)| (p.clone(), c.clone())));
        self.index = files.clone();
    }

    fn tick(&mut self) -> i64 {
        self.clock += 60;
        self.clock
    }

    fn stamp(&mut self) -> Signature {
        let time = self.tick();
        Signature {
            time,
            ..self.identity.clone()
        }
    }

    fn store_tree(&mut self, files: Files) -> Oid {
        let id = tree_id(&files);
        self.trees.insert(id.clone(), files);
        id
    }

    /// Advance HEAD's branch (or detached HEAD) to `new`.
    fn advance_head(&mut self, new: &Oid, message: &str) {
        match self.head.clone() {
            Some(branch) => {
                let old = self.branches.insert(branch.clone(), new.clone());
                self.reflogs.entry(branch).or_default().push(ReflogEntry {
                    old,
                    new: new.clone(),
                    message: message.to_string(),
                });
            }
            None => self.detached = Some(new.clone()),
        }
    }
}

/// Three-way merge of one path. `None` on conflict.
fn merge_path(
    base: Option<&String>,
    ours: Option<&String>,
    theirs: Option<&String>,
) -> Option<Option<String>> {
    if theirs == base || theirs == ours {
        Some(ours.cloned())
    } else if ours == base {
        Some(theirs.cloned())
    } else {
        None
    }
}

impl MemoryStore {
    /// An empty repository on an unborn `main` branch.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryStoreInner {
                commits: HashMap::new(),
                trees: HashMap::new(),
                branches: BTreeMap::new(),
                reflogs: HashMap::new(),
                head: BranchName::new("main").ok(),
                detached: None,
                index: Files::new(),
                worktree: Files::new(),
                stashes: Vec::new(),
                state: GitState::Clean,
                identity: Signature {
                    name: "Test User".to_string(),
                    email: "test@example.com".to_string(),
                    time: EPOCH,
                    offset_minutes: 0,
                },
                clock: EPOCH,
                fail_on: None,
                race: None,
                operations: Vec::new(),
                written: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // =========================================================================
    // History setup
    // =========================================================================

    /// Commit `changes` on top of HEAD and advance it. Index and working
    /// tree follow the new commit; untracked files are kept.
    pub fn commit(&self, message: &str, changes: &[(&str, &str)]) -> Oid {
        let mut inner = self.lock();
        let parents: Vec<Oid> = inner.head_oid().into_iter().collect();
        let mut files = inner.head_tree();
        files.extend(changes.iter().map(|(p, c)| (p.to_string(), c.to_string())));
        Self::commit_locked(&mut inner, message, files, parents)
    }

    /// Commit HEAD's tree with several parents (a merge) and advance HEAD.
    pub fn commit_merge(&self, message: &str, other_parents: &[Oid]) -> Oid {
        let mut inner = self.lock();
        let mut parents: Vec<Oid> = inner.head_oid().into_iter().collect();
        parents.extend(other_parents.iter().cloned());
        let files = inner.head_tree();
        Self::commit_locked(&mut inner, message, files, parents)
    }

    fn commit_locked(
        inner: &mut MemoryStoreInner,
        message: &str,
        files: Files,
        parents: Vec<Oid>,
    ) -> Oid {
        let tree = inner.store_tree(files.clone());
        let author = inner.stamp();
        let mut parts = vec![tree.to_string()];
        parts.extend(parents.iter().map(|p| p.to_string()));
        parts.push(signature_line(&author));
        parts.push(message.to_string());
        let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
        let id = digest("commit", &refs);

        inner.commits.insert(
            id.clone(),
            Commit {
                id: id.clone(),
                tree,
                parents,
                author: author.clone(),
                committer: author,
                message: message.to_string(),
            },
        );
        inner.reset_to(&files);
        inner.advance_head(&id, &format!("commit: {message}"));
        id
    }

    /// Create (or reset) a branch at `at` without touching HEAD.
    pub fn create_branch(&self, name: &str, at: &Oid) {
        let branch = BranchName::new(name).unwrap_or_else(|e| panic!("{e}"));
        self.lock().branches.insert(branch, at.clone());
    }

    /// Point HEAD at a new unborn branch, as `git checkout --orphan` does.
    pub fn orphan(&self, name: &str) {
        let branch = BranchName::new(name).unwrap_or_else(|e| panic!("{e}"));
        let mut inner = self.lock();
        inner.head = Some(branch);
        inner.index.clear();
    }

    // =========================================================================
    // Working tree
    // =========================================================================

    /// Write a file into the working tree without staging it.
    pub fn write_file(&self, path: &str, content: &str) {
        self.lock()
            .worktree
            .insert(path.to_string(), content.to_string());
    }

    /// Copy a path from the working tree into the index.
    pub fn stage(&self, path: &str) {
        let mut inner = self.lock();
        match inner.worktree.get(path).cloned() {
            Some(content) => {
                inner.index.insert(path.to_string(), content);
            }
            None => {
                inner.index.remove(path);
            }
        }
    }

    pub fn worktree_files(&self) -> Files {
        self.lock().worktree.clone()
    }

    pub fn index_files(&self) -> Files {
        self.lock().index.clone()
    }

    /// Contents of a tree; empty if unknown.
    pub fn tree_files(&self, tree: &Oid) -> Files {
        self.lock().trees.get(tree).cloned().unwrap_or_default()
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Tip of a branch by name.
    pub fn tip(&self, name: &str) -> Option<Oid> {
        let branch = BranchName::new(name).ok()?;
        self.lock().branches.get(&branch).cloned()
    }

    pub fn reflog(&self, name: &str) -> Vec<ReflogEntry> {
        BranchName::new(name)
            .ok()
            .and_then(|b| self.lock().reflogs.get(&b).cloned())
            .unwrap_or_default()
    }

    pub fn stash_count(&self) -> usize {
        self.lock().stashes.len()
    }

    /// Number of commits written through [`ObjectStore::write_commit`].
    pub fn written_count(&self) -> usize {
        self.lock().written
    }

    pub fn operations(&self) -> Vec<MemoryOp> {
        self.lock().operations.clone()
    }

    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    // =========================================================================
    // Fault injection
    // =========================================================================

    pub fn fail_on(&self, fail_on: FailOn) {
        self.lock().fail_on = Some(fail_on);
    }

    /// Move `name` to `to` just before the next `update_branch`, as a
    /// concurrent writer would.
    pub fn race_branch(&self, name: &str, to: &Oid) {
        let branch = BranchName::new(name).unwrap_or_else(|e| panic!("{e}"));
        self.lock().race = Some((branch, to.clone()));
    }

    pub fn set_state(&self, state: GitState) {
        self.lock().state = state;
    }

    pub fn set_identity(&self, name: &str, email: &str) {
        let mut inner = self.lock();
        inner.identity.name = name.to_string();
        inner.identity.email = email.to_string();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MemoryStore {
    fn read_commit(&self, oid: &Oid) -> Result<Commit, GitError> {
        self.lock()
            .commits
            .get(oid)
            .cloned()
            .ok_or_else(|| GitError::ObjectNotFound {
                oid: oid.to_string(),
            })
    }

    fn write_commit(&self, commit: &NewCommit) -> Result<Oid, GitError> {
        let mut inner = self.lock();
        if let Some(FailOn::WriteAfter(limit)) = inner.fail_on {
            if inner.written >= limit {
                return Err(GitError::AccessError {
                    message: "object database is read-only".to_string(),
                });
            }
        }
        if !inner.trees.contains_key(&commit.tree) {
            return Err(GitError::ObjectNotFound {
                oid: commit.tree.to_string(),
            });
        }
        if !inner.commits.contains_key(&commit.parent) {
            return Err(GitError::ObjectNotFound {
                oid: commit.parent.to_string(),
            });
        }

        let id = commit_id(commit);
        inner.commits.insert(
            id.clone(),
            Commit {
                id: id.clone(),
                tree: commit.tree.clone(),
                parents: vec![commit.parent.clone()],
                author: commit.author.clone(),
                committer: commit.committer.clone(),
                message: commit.message.clone(),
            },
        );
        inner.written += 1;
        inner.operations.push(MemoryOp::WriteCommit {
            parent: commit.parent.clone(),
        });
        Ok(id)
    }

    fn branch_tip(&self, branch: &BranchName) -> Result<Option<Oid>, GitError> {
        Ok(self.lock().branches.get(branch).cloned())
    }

    fn update_branch(
        &self,
        branch: &BranchName,
        new: &Oid,
        expected: &Oid,
        message: &str,
    ) -> Result<(), GitError> {
        let mut inner = self.lock();
        if let Some((raced, to)) = inner.race.take() {
            inner.branches.insert(raced, to);
        }

        let refname = format!("refs/heads/{branch}");
        let current = inner.branches.get(branch).cloned();
        if current.as_ref() != Some(expected) {
            return Err(GitError::CasFailed {
                refname,
                expected: expected.to_string(),
                actual: current
                    .map(|oid| oid.to_string())
                    .unwrap_or_else(|| "<none>".to_string()),
            });
        }
        if !inner.commits.contains_key(new) {
            return Err(GitError::ObjectNotFound {
                oid: new.to_string(),
            });
        }

        inner.branches.insert(branch.clone(), new.clone());
        inner
            .reflogs
            .entry(branch.clone())
            .or_default()
            .push(ReflogEntry {
                old: current,
                new: new.clone(),
                message: message.to_string(),
            });
        inner.operations.push(MemoryOp::UpdateBranch {
            branch: branch.to_string(),
            new: new.clone(),
        });
        Ok(())
    }

    fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        Ok(self.lock().head.clone())
    }

    fn state(&self) -> GitState {
        self.lock().state.clone()
    }

    fn worktree_status(&self, include_untracked: bool) -> Result<WorktreeStatus, GitError> {
        Ok(self.lock().status(include_untracked))
    }

    fn stash_save(&mut self, message: &str) -> Result<StashHandle, GitError> {
        let mut inner = self.lock();
        if inner.fail_on == Some(FailOn::StashSave) {
            return Err(GitError::AccessError {
                message: "cannot write stash".to_string(),
            });
        }
        if inner.status(false).is_clean() {
            return Err(GitError::Internal {
                message: "stash save: no local changes to save".to_string(),
            });
        }

        let base = inner.head_tree();
        let tracked = inner.tracked_paths(&base);
        let worktree: Files = inner
            .worktree
            .iter()
            .filter(|(path, _)| tracked.contains(*path))
            .map(|(p, c)| (p.clone(), c.clone()))
            .collect();

        let serial = inner.stashes.len().to_string();
        let time = inner.tick().to_string();
        let id = digest(
            "stash",
            &[
                message,
                &serial,
                &time,
                tree_id(&inner.index).as_str(),
                tree_id(&worktree).as_str(),
            ],
        );

        let entry = StashEntry {
            id: id.clone(),
            base: base.clone(),
            index: inner.index.clone(),
            worktree,
            tracked,
        };
        inner.reset_to(&base);
        inner.stashes.push(entry);
        inner.operations.push(MemoryOp::StashSave);
        Ok(StashHandle(id))
    }

    /// Three-way merges the entry onto the current HEAD, path by path, and
    /// refuses the whole pop if any path conflicts.
    fn stash_pop(&mut self, handle: &StashHandle) -> Result<(), GitError> {
        let mut inner = self.lock();
        inner.operations.push(MemoryOp::StashPop);
        if inner.fail_on == Some(FailOn::StashPop) {
            return Err(GitError::StashConflict {
                message: "injected conflict".to_string(),
            });
        }

        let position = inner
            .stashes
            .iter()
            .position(|entry| entry.id == handle.0)
            .ok_or_else(|| GitError::StashNotFound {
                stash: handle.0.to_string(),
            })?;
        let entry = inner.stashes[position].clone();

        let ours = inner.head_tree();
        let paths: BTreeSet<String> = entry
            .tracked
            .iter()
            .chain(entry.index.keys())
            .chain(ours.keys())
            .cloned()
            .collect();

        let mut index = Files::new();
        let mut worktree = Files::new();
        for path in &paths {
            let base = entry.base.get(path);
            let merged_index = merge_path(base, ours.get(path), entry.index.get(path));
            let merged_tree = merge_path(base, ours.get(path), entry.worktree.get(path));
            match (merged_index, merged_tree) {
                (Some(i), Some(w)) => {
                    if let Some(content) = i {
                        index.insert(path.clone(), content);
                    }
                    if let Some(content) = w {
                        worktree.insert(path.clone(), content);
                    }
                }
                _ => {
                    return Err(GitError::StashConflict {
                        message: format!("{path}: local changes conflict with HEAD"),
                    })
                }
            }
        }

        let current_tracked = inner.tracked_paths(&ours);
        for path in paths.iter().chain(current_tracked.iter()) {
            inner.worktree.remove(path);
        }
        inner.worktree.extend(worktree);
        inner.index = index;
        inner.stashes.remove(position);
        Ok(())
    }

    fn signature(&self) -> Result<Signature, GitError> {
        let mut inner = self.lock();
        if inner.fail_on == Some(FailOn::Signature) {
            return Err(GitError::Internal {
                message: "user.name/user.email: config value not found".to_string(),
            });
        }
        Ok(inner.stamp())
    }

    fn checkout_branch(&mut self, branch: &BranchName) -> Result<(), GitError> {
        let mut inner = self.lock();
        let target = inner
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| GitError::RefNotFound {
                refname: format!("refs/heads/{branch}"),
            })?;
        if !inner.status(false).is_clean() {
            return Err(GitError::Internal {
                message: "checkout: local changes would be overwritten".to_string(),
            });
        }

        let files = inner.tree_of(&target);
        inner.reset_to(&files);
        inner.head = Some(branch.clone());
        inner.detached = None;
        inner.operations.push(MemoryOp::Checkout {
            branch: branch.to_string(),
        });
        Ok(())
    }
}
