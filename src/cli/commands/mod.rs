//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the repository and loads configuration through [`Session`]
//! 2. Takes the repository lock if it changes anything
//! 3. Calls the engine or a read-only query
//! 4. Formats and displays output, as text or `--json`

mod branches;
mod completion;
mod config_cmd;
mod info;
mod log_cmd;
mod rewrite;
mod show;
mod switch;

pub use branches::branches;
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use info::info;
pub use log_cmd::log;
pub use rewrite::{reword, squash};
pub use show::show;
pub use switch::switch;

use crate::cli::args::{Command, ConfigAction};
use crate::core::config::Config;
use crate::core::lock::RepoLock;
use crate::core::paths::RewritePaths;
use crate::core::types::BranchName;
use crate::engine::Context;
use crate::git::{Git, ObjectStore};
use crate::ui::output::Verbosity;
use anyhow::{bail, Context as _, Result};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Reword {
            commit,
            message,
            branch,
            reset_committer,
            stash,
        } => rewrite::reword(
            ctx,
            &commit,
            &message,
            branch.as_deref(),
            reset_committer,
            stash,
        ),
        Command::Squash {
            commits,
            message,
            branch,
            reset_committer,
            stash,
        } => rewrite::squash(
            ctx,
            &commits,
            &message,
            branch.as_deref(),
            reset_committer,
            stash,
        ),
        Command::Log {
            offset,
            limit,
            search,
        } => log_cmd::log(ctx, offset, limit, search.as_deref()),
        Command::Branches => branches::branches(ctx),
        Command::Show { commit } => show::show(ctx, &commit),
        Command::Switch { branch, stash } => switch::switch(ctx, &branch, stash),
        Command::Info => info::info(ctx),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value, global } => config_cmd::set(ctx, &key, &value, global),
            ConfigAction::List => config_cmd::list(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// An open repository with its storage paths and configuration.
pub(crate) struct Session {
    pub git: Git,
    pub paths: RewritePaths,
    pub config: Config,
}

impl Session {
    /// Open the repository containing the context's working directory.
    pub fn open(ctx: &Context) -> Result<Self> {
        let cwd = ctx
            .working_dir()
            .context("Failed to determine working directory")?;
        let git = Git::open(&cwd).context("Failed to open repository")?;
        let info = git.info().context("Failed to read repository layout")?;
        let paths = RewritePaths::from_repo_info(&info);
        let config = Config::load(Some(&paths)).context("Failed to load config")?;
        Ok(Self { git, paths, config })
    }

    /// Take the exclusive repository lock for a mutating command.
    pub fn lock(&self) -> Result<RepoLock> {
        RepoLock::acquire(&self.paths).context("Failed to lock repository")
    }

    /// The named branch, or the one HEAD points at.
    pub fn branch(&self, name: Option<&str>) -> Result<BranchName> {
        match name {
            Some(name) => BranchName::new(name).context("Invalid branch name"),
            None => match self.git.current_branch()? {
                Some(branch) => Ok(branch),
                None => bail!("HEAD is detached; pass --branch to choose a branch"),
            },
        }
    }
}

pub(crate) fn verbosity(ctx: &Context) -> Verbosity {
    Verbosity::from_flags(ctx.quiet || ctx.json, ctx.debug)
}
