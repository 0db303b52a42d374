//! cli
//!
//! Command-line interface layer for git-rewrite.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the tracing subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, resolves
//! configuration and dispatches to the [`crate::engine`]. History is only
//! ever changed through the engine's rewrite pipeline.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        json: cli.json,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Log to stderr. `RUST_LOG` wins; otherwise `--debug` shows this crate's
/// debug events and everything else is limited to warnings.
fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { "warn,git_rewrite=debug" } else { "warn" })
    });

    // A second init (tests calling run twice) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
