//! Module lookup across the repository catalog.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::sources::archive::ArchiveFetcher;
use crate::sources::catalog::{Catalog, RepositoryId};

/// Where a module was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedModule {
    /// Repository holding the module
    pub repository: RepositoryId,
    /// Module directory inside the extracted repository
    pub path: PathBuf,
}

/// Finds a module's metadata directory in the catalog's repositories.
///
/// Repositories are tried in catalog order and the search stops at the
/// first one holding a directory named after the module, so only
/// repositories up to the match are ever downloaded.
pub struct ModuleLocator<'a> {
    catalog: &'a Catalog,
    fetcher: &'a dyn ArchiveFetcher,
}

impl<'a> ModuleLocator<'a> {
    pub fn new(catalog: &'a Catalog, fetcher: &'a dyn ArchiveFetcher) -> Self {
        ModuleLocator { catalog, fetcher }
    }

    /// Search for `module`, downloading archives into `work_dir`.
    ///
    /// Returns `Ok(None)` when no repository holds the module. Download
    /// failures propagate.
    pub fn locate(&self, module: &str, work_dir: &Path) -> Result<Option<LocatedModule>> {
        for repo in self.catalog.repositories() {
            tracing::info!("Searching {} for {}", repo, module);

            let archive = self.fetcher.download(repo, work_dir)?;
            let root = self
                .fetcher
                .extract(&archive, work_dir)
                .with_context(|| format!("failed to unpack repository archive for {}", repo))?;

            std::fs::remove_file(&archive)
                .with_context(|| format!("failed to remove {}", archive.display()))?;

            let candidate = root.join(module);
            if candidate.is_dir() {
                tracing::debug!("found {} at {}", module, candidate.display());
                return Ok(Some(LocatedModule {
                    repository: repo.clone(),
                    path: candidate,
                }));
            }
        }

        Ok(None)
    }
}
