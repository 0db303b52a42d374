//! engine
//!
//! History rewrite engine: edits commit messages and squashes commits by
//! recreating commit objects, never by mutating them.
//!
//! # Architecture
//!
//! A rewrite is a pipeline of small components, each owning one concern:
//!
//! 1. **Guard** ([`guard`]): keep local changes safe, stashing them if allowed
//! 2. **Linearize** ([`linearize`]): find the first-parent chain to recreate
//! 3. **Plan** ([`plan`]): decide tree, message and signatures of each new commit
//! 4. **Recreate** ([`exec`]): write the new commits, re-chaining parents
//! 5. **Advance** ([`refs`]): move the branch by compare-and-set
//!
//! [`runner`] ties them together and is the only entry point callers need.
//! Every component works against the [`ObjectStore`](crate::git::ObjectStore)
//! trait, so the whole pipeline runs unchanged on a real repository or on
//! [`MemoryStore`](crate::git::MemoryStore).
//!
//! # Invariants
//!
//! - Commits and trees are never modified, only created
//! - The branch reference moves once, atomically, or not at all
//! - The previous tip is always recorded in the branch reflog

pub mod error;
pub mod exec;
pub mod guard;
pub mod linearize;
pub mod plan;
pub mod refs;
pub mod runner;
pub mod switch;

pub use error::EngineError;
pub use exec::{Recreated, RewrittenCommit};
pub use guard::{Guarded, StashScope};
pub use linearize::Chain;
pub use plan::{PlanStep, Rewrite, RewritePlan, StepKind};
pub use runner::{edit_message, rewrite, squash, RewriteOptions, RewriteOutcome, RewriteRequest};
pub use switch::{switch_branch, SwitchOutcome};

use std::path::PathBuf;

/// Execution context for commands.
///
/// Global settings derived from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Print machine-readable JSON instead of text.
    pub json: bool,
}

impl Context {
    /// The directory commands operate in.
    pub fn working_dir(&self) -> std::io::Result<PathBuf> {
        match &self.cwd {
            Some(path) => Ok(path.clone()),
            None => std::env::current_dir(),
        }
    }
}
