//! Implementation of `pkgbuilder rpm`.
//!
//! Builds binary and source RPMs for a module:
//!
//! 1. locate the module and read its dependencies
//! 2. recreate the rpmbuild tree (`BUILD`, `BUILDROOT`, `RPMS`, `SOURCES`,
//!    `SPECS`, `SRPMS`)
//! 3. retrieve the module source as `<name>-<version>.tar.gz`
//! 4. copy the spec file into `SPECS`, and the tarball, patches (`*.patch`)
//!    and scripts (`*.sh`, `*.py`) into `SOURCES`
//! 5. run `rpmbuild -ba`
//!
//! The module's temporary directory is removed whether or not the build
//! succeeds.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::errors::PackagerError;
use crate::core::module::ModuleDescriptor;
use crate::sources::archive::ArchiveFetcher;
use crate::sources::catalog::Catalog;
use crate::util::config::DEFAULT_PREFIX;
use crate::util::fs::{copy_into, ensure_dir, glob_files, remove_dir_all_if_exists};
use crate::util::process::{CommandExecutor, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Subdirectories of the rpmbuild top directory.
pub const RPMBUILD_SUBDIRS: [&str; 6] = ["BUILD", "BUILDROOT", "RPMS", "SOURCES", "SPECS", "SRPMS"];

/// Module files copied next to the tarball in `SOURCES`.
const EXTRA_SOURCE_PATTERNS: [&str; 3] = ["*.patch", "*.sh", "*.py"];

/// Options for the rpm command.
#[derive(Debug, Clone)]
pub struct RpmBuildOptions {
    /// Module to build
    pub module: String,

    /// Version to build (`head` if unset)
    pub version: Option<String>,

    /// Directory holding the module files, instead of the catalog
    pub local: Option<PathBuf>,

    /// Install prefix passed as `_prefix`
    pub prefix: String,

    /// rpmbuild top directory, usually `~/rpmbuild`
    pub rpmbuild_dir: PathBuf,

    /// Pass `--quiet` to rpmbuild
    pub quiet: bool,

    /// Debian hosts get no `_buildrequires` definition
    pub debian: bool,
}

impl RpmBuildOptions {
    pub fn new(module: impl Into<String>, rpmbuild_dir: impl Into<PathBuf>) -> Self {
        RpmBuildOptions {
            module: module.into(),
            version: None,
            local: None,
            prefix: DEFAULT_PREFIX.to_string(),
            rpmbuild_dir: rpmbuild_dir.into(),
            quiet: false,
            debian: false,
        }
    }
}

/// Paths inside a prepared rpmbuild tree.
#[derive(Debug, Clone)]
pub struct RpmbuildTree {
    pub top: PathBuf,
    pub sources: PathBuf,
    pub specs: PathBuf,
}

/// What a successful build produced.
#[derive(Debug, Clone)]
pub struct RpmBuildResult {
    /// Source tarball, in the module directory
    pub tarball: PathBuf,
    /// Spec file copied into `SPECS`
    pub spec: PathBuf,
    /// Directory rpmbuild writes binary RPMs to
    pub rpms_dir: PathBuf,
    /// Directory rpmbuild writes source RPMs to
    pub srpms_dir: PathBuf,
}

/// Build RPMs for `opts.module`.
pub fn build_rpm(
    opts: &RpmBuildOptions,
    catalog: &Catalog,
    fetcher: &dyn ArchiveFetcher,
    executor: &dyn CommandExecutor,
    shell: &Shell,
) -> Result<RpmBuildResult> {
    let module = ModuleDescriptor::create(
        &opts.module,
        opts.version.as_deref(),
        opts.local.as_deref(),
        catalog,
        fetcher,
    )?;
    shell.status(
        Status::Located,
        format!("{} {} ({})", module.name(), module.version(), module.location().display()),
    );

    let result = build_located(&module, opts, executor, shell);
    let cleaned = module.cleanup();

    let result = result?;
    cleaned?;
    shell.status(
        Status::Finished,
        format!("RPMs for {} in {}", opts.module, result.rpms_dir.display()),
    );
    Ok(result)
}

fn build_located(
    module: &ModuleDescriptor,
    opts: &RpmBuildOptions,
    executor: &dyn CommandExecutor,
    shell: &Shell,
) -> Result<RpmBuildResult> {
    let tree = prepare_rpmbuild_tree(&opts.rpmbuild_dir)?;

    shell.status(Status::Fetching, module.tarball_name());
    let tarball = module.retrieve_source(executor, None)?;

    shell.status(Status::Copying, format!("module files to {}", tree.top.display()));
    let spec = copy_module_files(module, &tarball, &tree)?;

    let cmd = rpmbuild_command(&spec, module, opts);
    shell.status(Status::Building, module.name());
    shell.verbose(cmd.display_command());
    tracing::debug!("running `{}`", cmd.display_command());

    let build_failed = || PackagerError::BuildFailed {
        module: module.name().to_string(),
    };
    let status = executor.run(&cmd).map_err(|e| {
        tracing::warn!("{:#}", e);
        build_failed()
    })?;
    if !status.success() {
        return Err(build_failed().into());
    }

    Ok(RpmBuildResult {
        tarball,
        spec,
        rpms_dir: tree.top.join("RPMS"),
        srpms_dir: tree.top.join("SRPMS"),
    })
}

/// Recreate an empty rpmbuild tree at `top`.
///
/// Anything left over from a previous build is removed.
pub fn prepare_rpmbuild_tree(top: &Path) -> Result<RpmbuildTree> {
    tracing::info!("Setting up {}", top.display());
    remove_dir_all_if_exists(top)?;
    for sub in RPMBUILD_SUBDIRS {
        ensure_dir(&top.join(sub))?;
    }

    Ok(RpmbuildTree {
        top: top.to_path_buf(),
        sources: top.join("SOURCES"),
        specs: top.join("SPECS"),
    })
}

/// Copy the spec file into `SPECS` and the sources into `SOURCES`.
///
/// Returns the copied spec file.
pub fn copy_module_files(module: &ModuleDescriptor, tarball: &Path, tree: &RpmbuildTree) -> Result<PathBuf> {
    let spec_file = module.location().join(format!("{}.spec", module.name()));
    let spec = copy_into(&spec_file, &tree.specs)
        .with_context(|| format!("module `{}` has no spec file", module.name()))?;

    copy_into(tarball, &tree.sources)?;
    for extra in glob_files(module.location(), &EXTRA_SOURCE_PATTERNS)? {
        tracing::debug!("copying {}", extra.display());
        copy_into(&extra, &tree.sources)?;
    }

    Ok(spec)
}

/// Compose the rpmbuild invocation.
pub fn rpmbuild_command(spec: &Path, module: &ModuleDescriptor, opts: &RpmBuildOptions) -> ProcessBuilder {
    let mut cmd = ProcessBuilder::new("rpmbuild").arg("-ba");
    if opts.quiet {
        cmd = cmd.arg("--quiet");
    }
    cmd = cmd
        .arg(spec)
        .arg("--define")
        .arg(format!("_prefix {}", opts.prefix))
        .arg("--define")
        .arg(format!("_version {}", module.version()));
    if !opts.debian {
        cmd = cmd
            .arg("--define")
            .arg(format!("_buildrequires {}", module.dependencies().as_build_requires()));
    }
    cmd
}
