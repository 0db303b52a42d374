//! ui
//!
//! User-facing output.
//!
//! All command output goes through [`output`] so that `--quiet` and `--json`
//! behave the same everywhere. Engine internals log through `tracing`
//! instead and never print.

pub mod output;
