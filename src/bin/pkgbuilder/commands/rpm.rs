//! `pkgbuilder rpm` command

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::RpmArgs;
use crate::commands::Session;
use packagebuilder::ops::rpm_build::{build_rpm, RpmBuildOptions};
use packagebuilder::util::flavor::{ensure_supported_os, is_debian};
use packagebuilder::util::process::find_executable;
use packagebuilder::util::{Shell, SystemExecutor};

pub fn execute(args: RpmArgs, config: Option<&Path>, quiet: bool, shell: Arc<Shell>) -> Result<()> {
    ensure_supported_os()?;

    let session = Session::new(config, shell)?;
    if find_executable("rpmbuild").is_none() {
        session.shell.warn("`rpmbuild` was not found in PATH; install rpm-build");
    }

    let local = session.local_dir(args.target.local.as_deref());
    let catalog = session.catalog(local.is_some())?;
    let fetcher = session.fetcher()?;

    // CLI overrides config
    let prefix = args
        .prefix
        .unwrap_or_else(|| session.ctx.config().prefix().to_string());

    let opts = RpmBuildOptions {
        module: args.target.module,
        version: args.tag,
        local,
        prefix,
        rpmbuild_dir: session.ctx.rpmbuild_dir(),
        quiet,
        debian: is_debian(),
    };

    let result = build_rpm(&opts, &catalog, &fetcher, &SystemExecutor, &session.shell)?;
    println!("{}", result.rpms_dir.display());
    println!("{}", result.srpms_dir.display());

    Ok(())
}
