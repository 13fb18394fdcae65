//! `pkgbuilder deps` command

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::ModuleArgs;
use crate::commands::Session;
use packagebuilder::core::ModuleDescriptor;
use packagebuilder::util::Shell;

pub fn execute(args: ModuleArgs, config: Option<&Path>, shell: Arc<Shell>) -> Result<()> {
    let session = Session::new(config, shell)?;
    let local = session.local_dir(args.local.as_deref());
    let catalog = session.catalog(local.is_some())?;
    let fetcher = session.fetcher()?;

    let module = ModuleDescriptor::create(&args.module, None, local.as_deref(), &catalog, &fetcher)?;

    if module.dependencies().is_default() {
        session.shell.verbose(format!("{} declares no dependencies", module.name()));
    }
    println!("{}", module.dependencies());

    module.cleanup()
}
