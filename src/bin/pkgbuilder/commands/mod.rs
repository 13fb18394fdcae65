//! Command implementations

pub mod completions;
pub mod deps;
pub mod fetch;
pub mod locate;
pub mod rpm;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use packagebuilder::sources::{Catalog, HttpArchiveFetcher};
use packagebuilder::util::fs::expand_path;
use packagebuilder::util::{GlobalContext, Shell};

/// State shared by the commands that resolve a module.
pub struct Session {
    pub ctx: GlobalContext,
    pub shell: Arc<Shell>,
}

impl Session {
    pub fn new(config: Option<&Path>, shell: Arc<Shell>) -> Result<Self> {
        let ctx = GlobalContext::new(config)?;
        Ok(Session { ctx, shell })
    }

    /// The `--local` value as given; module resolution expands it.
    pub fn local_dir(&self, raw: Option<&str>) -> Option<PathBuf> {
        raw.map(PathBuf::from)
    }

    /// The repository catalog. Local modules never consult it, so a
    /// broken catalog setting does not get in their way.
    pub fn catalog(&self, local: bool) -> Result<Catalog> {
        if local {
            return Ok(Catalog::builtin());
        }
        let path = self
            .ctx
            .config()
            .catalog
            .path
            .as_ref()
            .map(|p| self.ctx.resolve_path(&expand_path(&p.to_string_lossy())));
        Ok(Catalog::from_config(path.as_ref())?)
    }

    pub fn fetcher(&self) -> Result<HttpArchiveFetcher> {
        HttpArchiveFetcher::from_config(self.ctx.config(), Arc::clone(&self.shell))
    }
}
