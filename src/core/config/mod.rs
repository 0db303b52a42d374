//! core::config
//!
//! Configuration loading with global and repository scopes.
//!
//! # Precedence
//!
//! Later sources override earlier ones:
//! 1. Built-in defaults
//! 2. Global config file
//! 3. Repository config file
//! 4. CLI flags (applied by the caller)
//!
//! # Global Config Locations
//!
//! The first existing file wins:
//! 1. `$GIT_REWRITE_CONFIG`
//! 2. `$XDG_CONFIG_HOME/git-rewrite/config.toml`
//! 3. `~/.git-rewrite/config.toml` (canonical write location)
//!
//! # Repo Config Location
//!
//! `<common_dir>/git-rewrite/config.toml`, see [`RewritePaths::config_path`].
//!
//! # Example
//!
//! ```no_run
//! use git_rewrite::core::config::Config;
//!
//! let config = Config::load(None)?;
//! println!("auto-stash: {}", config.auto_stash());
//! # Ok::<(), git_rewrite::core::config::ConfigError>(())
//! ```

pub mod schema;

pub use schema::FileConfig;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::paths::RewritePaths;

/// Page size used by `log` when nothing is configured.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Merged configuration from all file sources.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: FileConfig,
    pub repo: Option<FileConfig>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Missing files are not an error; files that exist but do not parse
    /// or validate are.
    pub fn load(paths: Option<&RewritePaths>) -> Result<Config, ConfigError> {
        let global_path = Self::find_global();
        let repo_path = paths.map(RewritePaths::config_path);
        Self::from_files(global_path.as_deref(), repo_path.as_deref())
    }

    /// Load from explicit file locations. Either file may be absent.
    pub fn from_files(global: Option<&Path>, repo: Option<&Path>) -> Result<Config, ConfigError> {
        let (global, global_path) = match global.filter(|p| p.exists()) {
            Some(path) => (Self::read_file(path)?, Some(path.to_path_buf())),
            None => (FileConfig::default(), None),
        };
        let (repo, repo_path) = match repo.filter(|p| p.exists()) {
            Some(path) => (Some(Self::read_file(path)?), Some(path.to_path_buf())),
            None => (None, None),
        };

        Ok(Config {
            global,
            repo,
            global_path,
            repo_path,
        })
    }

    fn find_global() -> Option<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var("GIT_REWRITE_CONFIG") {
            candidates.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(xdg_home).join("git-rewrite/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".git-rewrite/config.toml"));
        }
        candidates.into_iter().find(|p| p.exists())
    }

    fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Canonical global config path: `~/.git-rewrite/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".git-rewrite/config.toml"))
    }

    /// Write `config` to `path` atomically (temp file, then rename).
    pub fn write_file(path: &Path, config: &FileConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let write_err = |source| ConfigError::WriteError {
            path: temp_path.clone(),
            source,
        };
        let mut file = fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    // =========================================================================
    // Accessors with precedence applied
    // =========================================================================

    fn pick<T: Copy>(&self, field: impl Fn(&FileConfig) -> Option<T>) -> Option<T> {
        self.repo.as_ref().and_then(&field).or_else(|| field(&self.global))
    }

    /// Defaults to `false`: a dirty working tree blocks rewrites.
    pub fn auto_stash(&self) -> bool {
        self.pick(|c| c.auto_stash).unwrap_or(false)
    }

    /// Defaults to `false`: committers are carried over verbatim.
    pub fn reset_committer(&self) -> bool {
        self.pick(|c| c.reset_committer).unwrap_or(false)
    }

    pub fn page_size(&self) -> usize {
        self.pick(|c| c.page_size).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Effective value of `key` as a display string, defaults included.
    pub fn value(&self, key: &str) -> Result<String, ConfigError> {
        if let Some(value) = self.repo.as_ref().map(|r| r.get(key)).transpose()?.flatten() {
            return Ok(value);
        }
        if let Some(value) = self.global.get(key)? {
            return Ok(value);
        }
        Ok(match key {
            "auto_stash" => self.auto_stash().to_string(),
            "reset_committer" => self.reset_committer().to_string(),
            _ => self.page_size().to_string(),
        })
    }

    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}
