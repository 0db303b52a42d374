//! git-rewrite - edit commit messages and squash commits safely
//!
//! git-rewrite changes history the only way a content-addressed store
//! allows: by writing new commit objects and moving a branch to them. Trees
//! are reused verbatim, so file contents never change, and the previous tip
//! always stays reachable through the branch reflog.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Guard, linearize, plan, recreate and advance pipeline
//! - [`core`] - Domain types, configuration, paths and locking
//! - [`git`] - Object store trait, the git2 adapter and an in-memory store
//! - [`ui`] - Output formatting
//!
//! # Correctness Invariants
//!
//! 1. Commits and trees are never mutated, only created
//! 2. A branch moves by a single compare-and-set or not at all
//! 3. Local changes are never lost: stashed and restored, or the rewrite is refused
//! 4. At most one git-rewrite process mutates a repository at a time

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
