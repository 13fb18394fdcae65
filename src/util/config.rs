//! Configuration file support.
//!
//! Two configuration files are consulted:
//! - Global: `<config dir>/config.toml`, e.g. `~/.config/packagebuilder/config.toml`
//! - Explicit: the file named by `--config` or `PKGBUILDER_CONFIG`
//!
//! The explicit file takes precedence over the global one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default archive URL template. `{repo}` is the `owner/name` identifier.
pub const DEFAULT_ARCHIVE_URL: &str = "https://github.com/{repo}/archive/{branch}.zip";

/// Branch whose snapshot is downloaded from each repository.
pub const DEFAULT_BRANCH: &str = "master";

/// Install prefix handed to rpmbuild when none is given.
pub const DEFAULT_PREFIX: &str = "/usr/local";

/// Packager configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository catalog settings
    pub catalog: CatalogConfig,

    /// rpmbuild settings
    pub build: BuildConfig,

    /// Network settings
    pub net: NetConfig,
}

/// Where and how modules are searched for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog file; the built-in catalog is used when unset
    pub path: Option<PathBuf>,

    /// Branch to download from each repository
    pub branch: Option<String>,

    /// Archive URL template with `{repo}` and `{branch}` placeholders
    pub url_template: Option<String>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Install prefix passed to rpmbuild as `_prefix`
    pub prefix: Option<String>,

    /// rpmbuild top directory (defaults to `~/rpmbuild`)
    pub rpmbuild_dir: Option<PathBuf>,
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Request timeout in seconds; reqwest's 30 second default applies when unset
    pub timeout_secs: Option<u64>,

    /// User-Agent header for archive downloads
    pub user_agent: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.catalog.path.is_some() {
            self.catalog.path = other.catalog.path;
        }
        if other.catalog.branch.is_some() {
            self.catalog.branch = other.catalog.branch;
        }
        if other.catalog.url_template.is_some() {
            self.catalog.url_template = other.catalog.url_template;
        }

        if other.build.prefix.is_some() {
            self.build.prefix = other.build.prefix;
        }
        if other.build.rpmbuild_dir.is_some() {
            self.build.rpmbuild_dir = other.build.rpmbuild_dir;
        }

        if other.net.timeout_secs.is_some() {
            self.net.timeout_secs = other.net.timeout_secs;
        }
        if other.net.user_agent.is_some() {
            self.net.user_agent = other.net.user_agent;
        }
    }

    /// Branch to download, with the default applied.
    pub fn branch(&self) -> &str {
        self.catalog.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    /// Archive URL template, with the default applied.
    pub fn url_template(&self) -> &str {
        self.catalog
            .url_template
            .as_deref()
            .unwrap_or(DEFAULT_ARCHIVE_URL)
    }

    /// Install prefix, with the default applied.
    pub fn prefix(&self) -> &str {
        self.build.prefix.as_deref().unwrap_or(DEFAULT_PREFIX)
    }
}

/// Load merged configuration.
///
/// Order of precedence (highest to lowest):
/// 1. Explicit config file (must load if given)
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, explicit_path: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    if let Some(explicit_path) = explicit_path {
        config.merge(Config::load(explicit_path)?);
    }

    Ok(config)
}
