//! `pkgbuilder locate` command
//!
//! Prints the module directory for local modules, and
//! `<repository>/<module>` for modules found in the catalog, whose
//! download is discarded afterwards.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::ModuleArgs;
use crate::commands::Session;
use packagebuilder::core::ModuleDescriptor;
use packagebuilder::util::shell::Status;
use packagebuilder::util::Shell;

pub fn execute(args: ModuleArgs, config: Option<&Path>, shell: Arc<Shell>) -> Result<()> {
    let session = Session::new(config, shell)?;
    let local = session.local_dir(args.local.as_deref());
    let catalog = session.catalog(local.is_some())?;
    let fetcher = session.fetcher()?;

    let module = ModuleDescriptor::create(&args.module, None, local.as_deref(), &catalog, &fetcher)?;

    match module.repository() {
        Some(repo) => {
            session
                .shell
                .status(Status::Located, format!("{} in {}", module.name(), repo));
            println!("{}/{}", repo, module.name());
        }
        None => println!("{}", module.location().display()),
    }

    module.cleanup()
}
