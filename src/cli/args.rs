//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// git-rewrite - Rewrite commit messages and squash commits safely
#[derive(Parser, Debug)]
#[command(name = "git-rewrite")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if git-rewrite was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Auto-stash flags shared by commands that touch the working tree.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct StashArgs {
    /// Stash uncommitted changes and restore them afterwards
    #[arg(long, conflicts_with = "no_auto_stash")]
    pub auto_stash: bool,

    /// Refuse to run with uncommitted changes, even if configured otherwise
    #[arg(long)]
    pub no_auto_stash: bool,
}

impl StashArgs {
    /// Resolve the flags against the configured default.
    pub fn resolve(&self, configured: bool) -> bool {
        if self.auto_stash {
            true
        } else if self.no_auto_stash {
            false
        } else {
            configured
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Change the message of a commit
    #[command(
        name = "reword",
        long_about = "Change the message of a commit.\n\n\
            The commit and every commit after it on the branch are recreated with \
            new parents; file contents are never changed. The previous tip stays \
            in the branch reflog, so `git reset --hard <branch>@{1}` undoes the rewrite.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Fix a typo in the last commit message
    git-rewrite reword HEAD -m \"fix login bug\"

    # Reword an older commit while you have local edits
    git-rewrite reword HEAD~3 -m \"add tests\" --auto-stash

    # Rewrite a branch that is not checked out
    git-rewrite reword topic~1 -m \"refactor parser\" --branch topic"
    )]
    Reword {
        /// Commit to reword (any revision, e.g. HEAD~2 or a hash prefix)
        commit: String,

        /// New commit message
        #[arg(short, long)]
        message: String,

        /// Branch to rewrite (defaults to the current branch)
        #[arg(short, long)]
        branch: Option<String>,

        /// Record yourself as committer of the recreated commits
        #[arg(long)]
        reset_committer: bool,

        #[command(flatten)]
        stash: StashArgs,
    },

    /// Combine several commits into one
    #[command(
        name = "squash",
        long_about = "Combine several commits into one.\n\n\
            The squashed commit takes the file contents of the newest selected \
            commit and the author of the oldest. Commits after it are recreated \
            on top with their original contents and messages.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Squash the last three commits
    git-rewrite squash HEAD~2 HEAD~1 HEAD -m \"implement feature\"

    # Order does not matter; commits are placed by their position on the branch
    git-rewrite squash a1b2c3d 9f8e7d6 -m \"fix bug with test\""
    )]
    Squash {
        /// Commits to squash (at least two)
        #[arg(required = true, num_args = 1..)]
        commits: Vec<String>,

        /// Message of the squashed commit
        #[arg(short, long)]
        message: String,

        /// Branch to rewrite (defaults to the current branch)
        #[arg(short, long)]
        branch: Option<String>,

        /// Record yourself as committer of the recreated commits
        #[arg(long)]
        reset_committer: bool,

        #[command(flatten)]
        stash: StashArgs,
    },

    /// List commits reachable from HEAD, newest first
    #[command(
        name = "log",
        after_help = "\
WORKFLOW EXAMPLES:
    # First page
    git-rewrite log

    # Next page of 20
    git-rewrite log --offset 20 --limit 20

    # Commits mentioning 'login' in hash, message, author or email
    git-rewrite log --search login"
    )]
    Log {
        /// Number of commits to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Page size (defaults to the configured page_size)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Case-insensitive filter on hash prefix, message, author or email
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List local branches, current first
    Branches,

    /// Show a commit and its diff against its first parent
    Show {
        /// Commit to show (defaults to HEAD)
        #[arg(default_value = "HEAD")]
        commit: String,
    },

    /// Check out a local branch
    Switch {
        /// Branch to switch to
        branch: String,

        #[command(flatten)]
        stash: StashArgs,
    },

    /// Show repository name, path and current branch
    Info,

    /// Get, set, or list configuration values
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
INSTALLATION:
    # Bash
    git-rewrite completion bash > ~/.local/share/bash-completion/completions/git-rewrite

    # Zsh
    git-rewrite completion zsh > ~/.zfunc/_git-rewrite

    # Fish
    git-rewrite completion fish > ~/.config/fish/completions/git-rewrite.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,

        /// Write to the global config instead of the repository's
        #[arg(long)]
        global: bool,
    },

    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn stash_flags_override_config() {
        let none = StashArgs::default();
        assert!(none.resolve(true));
        assert!(!none.resolve(false));

        let on = StashArgs {
            auto_stash: true,
            no_auto_stash: false,
        };
        assert!(on.resolve(false));

        let off = StashArgs {
            auto_stash: false,
            no_auto_stash: true,
        };
        assert!(!off.resolve(true));
    }

    #[test]
    fn squash_parses_many_commits() {
        let cli = Cli::try_parse_from(["git-rewrite", "squash", "a", "b", "c", "-m", "msg"]).unwrap();
        match cli.command {
            Command::Squash {
                commits, message, ..
            } => {
                assert_eq!(commits, vec!["a", "b", "c"]);
                assert_eq!(message, "msg");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn conflicting_stash_flags_rejected() {
        let result = Cli::try_parse_from([
            "git-rewrite",
            "reword",
            "HEAD",
            "-m",
            "x",
            "--auto-stash",
            "--no-auto-stash",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["git-rewrite", "log", "--json", "-q"]).unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
    }
}
