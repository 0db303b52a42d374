//! config command - Get, set, or list configuration values

use super::{verbosity, Session};
use crate::core::config::{Config, FileConfig};
use crate::engine::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};
use std::collections::BTreeMap;

/// Configuration of the current repository, or global only outside one.
fn load(ctx: &Context) -> Result<Config> {
    match Session::open(ctx) {
        Ok(session) => Ok(session.config),
        Err(_) => Config::load(None).context("Failed to load config"),
    }
}

/// Get a configuration value.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let value = load(ctx)?.value(key)?;
    if ctx.json {
        output::json(&BTreeMap::from([(key, value)]))?;
    } else {
        println!("{}", value);
    }
    Ok(())
}

/// Set a configuration value in the repository or global file.
pub fn set(ctx: &Context, key: &str, value: &str, global: bool) -> Result<()> {
    let (path, current) = if global {
        let config = Config::load(None).context("Failed to load config")?;
        let path = match config.global_config_loaded_from() {
            Some(path) => path.to_path_buf(),
            None => Config::global_config_path()?,
        };
        (path, config.global)
    } else {
        let session = Session::open(ctx)?;
        let path = session.paths.config_path();
        (path, session.config.repo.unwrap_or_default())
    };

    let mut updated: FileConfig = current;
    updated.set(key, value)?;
    Config::write_file(&path, &updated).context("Failed to write config")?;

    output::success(
        format!("Set {} = {} in {}", key, value, path.display()),
        verbosity(ctx),
    );
    Ok(())
}

/// List every key with its effective value.
pub fn list(ctx: &Context) -> Result<()> {
    let config = load(ctx)?;
    let values = FileConfig::KEYS
        .iter()
        .map(|key| Ok((*key, config.value(key)?)))
        .collect::<Result<BTreeMap<_, _>>>()?;

    if ctx.json {
        output::json(&values)?;
        return Ok(());
    }

    for (key, value) in &values {
        println!("{} = {}", key, value);
    }
    if let Some(path) = config.global_config_loaded_from() {
        output::debug(format!("global config: {}", path.display()), verbosity(ctx));
    }
    if let Some(path) = config.repo_config_loaded_from() {
        output::debug(format!("repo config: {}", path.display()), verbosity(ctx));
    }
    Ok(())
}
