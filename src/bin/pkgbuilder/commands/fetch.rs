//! `pkgbuilder fetch` command

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::FetchArgs;
use crate::commands::Session;
use packagebuilder::ops::fetch::{fetch, FetchOptions};
use packagebuilder::util::{Shell, SystemExecutor};

pub fn execute(args: FetchArgs, config: Option<&Path>, shell: Arc<Shell>) -> Result<()> {
    let session = Session::new(config, shell)?;
    let local = session.local_dir(args.target.local.as_deref());
    let catalog = session.catalog(local.is_some())?;
    let fetcher = session.fetcher()?;

    let dest = match args.dest {
        Some(dest) => session.ctx.resolve_path(&dest),
        None => session.ctx.cwd().to_path_buf(),
    };

    let opts = FetchOptions {
        module: args.target.module,
        version: args.tag,
        local,
        dest,
    };

    let tarball = fetch(&opts, &catalog, &fetcher, &SystemExecutor, &session.shell)?;
    println!("{}", tarball.display());

    Ok(())
}
