//! Build requirements of a module.
//!
//! A module declares what it needs at build time in `dependencies.txt`, a
//! bracketed list file. Modules without the file still get a value, since
//! rpmbuild expects a `_buildrequires` definition.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

use crate::sources::catalog::read_bracketed_list;

/// Name of the dependency file in a module directory.
pub const DEPENDENCY_FILE: &str = "dependencies.txt";

/// Build requirement used when a module declares none.
pub const DEFAULT_BUILD_REQUIRES: &str = "rpm";

/// A module's build requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependencies {
    /// Entries read from `dependencies.txt`, in file order.
    Declared(Vec<String>),
    /// No dependency file; stands for [`DEFAULT_BUILD_REQUIRES`].
    Default,
}

impl Dependencies {
    /// Read the dependency file in `location`.
    ///
    /// A missing file yields [`Dependencies::Default`]. A file that exists
    /// but cannot be read is an error.
    pub fn read(location: &Path) -> Result<Self> {
        let path = location.join(DEPENDENCY_FILE);
        if !path.is_file() {
            tracing::debug!("no {} in {}", DEPENDENCY_FILE, location.display());
            return Ok(Dependencies::Default);
        }

        let entries = read_bracketed_list(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Dependencies::Declared(entries))
    }

    /// The entries, with the default spelled out.
    pub fn entries(&self) -> Vec<&str> {
        match self {
            Dependencies::Declared(entries) => entries.iter().map(String::as_str).collect(),
            Dependencies::Default => vec![DEFAULT_BUILD_REQUIRES],
        }
    }

    /// Comma-separated form passed to rpmbuild as `_buildrequires`.
    pub fn as_build_requires(&self) -> String {
        self.entries().join(", ")
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Dependencies::Default)
    }
}

impl fmt::Display for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_build_requires())
    }
}
