//! Repository catalog and the bracketed list file format.
//!
//! Both the catalog and a module's `dependencies.txt` are "bracketed list
//! files": one entry per line, where the first and last line are
//! delimiters and are always discarded.
//!
//! ```text
//!
//! csdms/rpm_models
//! csdms/rpm_tools
//!
//! ```
//!
//! The delimiters are dropped whatever they contain, so a file written
//! without the leading or trailing blank line loses a real entry. Existing
//! data files rely on this layout, so it is kept as is.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::errors::PackagerError;

/// Catalog used when no catalog file is configured. Official models come
/// before tools.
pub const BUILTIN_CATALOG: &str = "\ncsdms/rpm_models\ncsdms/rpm_tools\n";

/// Parse bracketed list text, dropping the first and last line.
pub fn parse_bracketed_list(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() <= 2 {
        return Vec::new();
    }

    lines[1..lines.len() - 1]
        .iter()
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Read a bracketed list file.
pub fn read_bracketed_list(path: &Path) -> std::io::Result<Vec<String>> {
    std::fs::read_to_string(path).map(|text| parse_bracketed_list(&text))
}

/// An `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryId(String);

impl RepositoryId {
    pub fn new(id: impl Into<String>) -> Self {
        RepositoryId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the identifier (`rpm_models` for `csdms/rpm_models`).
    pub fn base_name(&self) -> &str {
        let trimmed = self.0.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered list of repositories searched for modules.
///
/// Order is search priority: the first repository holding a module wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    repositories: Vec<RepositoryId>,
}

impl Catalog {
    /// Build a catalog from bracketed list text.
    pub fn parse(text: &str) -> Self {
        Catalog {
            repositories: parse_bracketed_list(text)
                .into_iter()
                .map(RepositoryId::new)
                .collect(),
        }
    }

    /// The built-in catalog.
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_CATALOG)
    }

    /// Read a catalog file. A missing or unreadable file is fatal.
    pub fn load(path: &Path) -> Result<Self, PackagerError> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            PackagerError::CatalogUnreadable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(Self::parse(&text))
    }

    /// Read the configured catalog, or fall back to the built-in one.
    pub fn from_config(path: Option<&PathBuf>) -> Result<Self, PackagerError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn repositories(&self) -> &[RepositoryId] {
        &self.repositories
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}
