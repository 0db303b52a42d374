//! core::config::schema
//!
//! Configuration file schema.
//!
//! The global file and the repository file share one schema; every key is
//! optional so that a repository file only overrides what it names.
//!
//! ```toml
//! auto_stash = true
//! reset_committer = false
//! page_size = 50
//! ```

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Upper bound for `page_size`.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Contents of one configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Stash uncommitted changes around rewrites instead of refusing to run.
    pub auto_stash: Option<bool>,

    /// Use the current user as committer of rewritten commits.
    pub reset_committer: Option<bool>,

    /// Number of commits per page in `log`.
    pub page_size: Option<usize>,
}

impl FileConfig {
    /// Keys accepted by [`FileConfig::get`] and [`FileConfig::set`].
    pub const KEYS: &'static [&'static str] = &["auto_stash", "reset_committer", "page_size"];

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(size) = self.page_size {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(ConfigError::InvalidValue(format!(
                    "page_size must be between 1 and {MAX_PAGE_SIZE}, got {size}"
                )));
            }
        }
        Ok(())
    }

    /// Read a key as a display string. `None` when unset.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match key {
            "auto_stash" => Ok(self.auto_stash.map(|v| v.to_string())),
            "reset_committer" => Ok(self.reset_committer.map(|v| v.to_string())),
            "page_size" => Ok(self.page_size.map(|v| v.to_string())),
            other => Err(unknown_key(other)),
        }
    }

    /// Parse `value` and store it under `key`.
    ///
    /// Leaves `self` untouched when the value is rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut next = self.clone();
        match key {
            "auto_stash" => next.auto_stash = Some(parse_bool(key, value)?),
            "reset_committer" => next.reset_committer = Some(parse_bool(key, value)?),
            "page_size" => {
                let size = value.parse().map_err(|_| {
                    ConfigError::InvalidValue(format!("page_size must be a number, got '{value}'"))
                })?;
                next.page_size = Some(size);
            }
            other => return Err(unknown_key(other)),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue(format!(
            "{key} must be true or false, got '{value}'"
        ))),
    }
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::InvalidValue(format!(
        "unknown key '{}', expected one of: {}",
        key,
        FileConfig::KEYS.join(", ")
    ))
}
