//! Global context for packager operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};

use crate::util::config::{load_config, Config};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PKGBUILDER_CONFIG";

/// Project directories for the packager
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("edu", "csdms", "packagebuilder"));

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// User home directory
    home: PathBuf,

    /// Merged configuration
    config: Config,
}

impl GlobalContext {
    /// Create a context, loading the global config and `explicit_config` on top.
    pub fn new(explicit_config: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let home = BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .unwrap_or_else(|| cwd.clone());

        let global_path = PROJECT_DIRS
            .as_ref()
            .map(|dirs| dirs.config_dir().join("config.toml"));
        let config = load_config(global_path.as_deref(), explicit_config)?;

        Ok(GlobalContext {
            cwd,
            home,
            config,
        })
    }

    /// Create a context from explicit parts, bypassing the filesystem.
    pub fn with_parts(cwd: PathBuf, home: PathBuf, config: Config) -> Self {
        GlobalContext {
            cwd,
            home,
            config,
        }
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the merged configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the rpmbuild top directory (`~/rpmbuild` unless configured).
    pub fn rpmbuild_dir(&self) -> PathBuf {
        self.config
            .build
            .rpmbuild_dir
            .clone()
            .unwrap_or_else(|| self.home.join("rpmbuild"))
    }

    /// Resolve a user-supplied path against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}
