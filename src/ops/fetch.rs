//! Implementation of `pkgbuilder fetch`.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::module::ModuleDescriptor;
use crate::sources::archive::ArchiveFetcher;
use crate::sources::catalog::Catalog;
use crate::util::process::CommandExecutor;
use crate::util::shell::{Shell, Status};

/// Options for the fetch command.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Module to fetch
    pub module: String,

    /// Version to fetch (`head` if unset)
    pub version: Option<String>,

    /// Directory holding the module files, instead of the catalog
    pub local: Option<PathBuf>,

    /// Directory the tarball is written to
    pub dest: PathBuf,
}

/// Retrieve the source tarball of `opts.module` into `opts.dest`.
///
/// Returns the tarball path. The module's temporary directory is removed
/// before returning, so the destination must lie outside it.
pub fn fetch(
    opts: &FetchOptions,
    catalog: &Catalog,
    fetcher: &dyn ArchiveFetcher,
    executor: &dyn CommandExecutor,
    shell: &Shell,
) -> Result<PathBuf> {
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

    let dest = opts.dest.join(module.tarball_name());
    if dest.is_file() {
        shell.status(Status::Fresh, dest.display());
    } else {
        shell.status(Status::Fetching, module.tarball_name());
    }

    let tarball = module.retrieve_source(executor, Some(&opts.dest));
    let cleaned = module.cleanup();

    let tarball = tarball?;
    cleaned?;
    shell.status(Status::Finished, tarball.display());
    Ok(tarball)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::{find_packager_error, ErrorKind};
    use crate::test_support::{LocalArchiveFetcher, MockExecutor, ModuleFixture, RepositoryFixture};
    use crate::util::process::ProcessBuilder;
    use tempfile::TempDir;

    fn fake_download(cmd: &ProcessBuilder) -> std::io::Result<()> {
        std::fs::write(cmd.get_args().last().unwrap(), b"archive")
    }

    #[test]
    fn test_fetch_remote_module() {
        let archives = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let repos = vec![RepositoryFixture::new("csdms/rpm_tools").with_module(
            ModuleFixture::new("babel").with_source("curl -s https://example.org/babel-{version}.tar.gz"),
        )];
        let fetcher = LocalArchiveFetcher::with_repositories(archives.path(), &repos).unwrap();
        let catalog = Catalog::parse("\ncsdms/rpm_tools\n");
        let exec = MockExecutor::new().on_with("curl", 0, fake_download);

        let opts = FetchOptions {
            module: "babel".to_string(),
            version: Some("1.4.0".to_string()),
            local: None,
            dest: out.path().to_path_buf(),
        };
        let tarball = fetch(&opts, &catalog, &fetcher, &exec, &Shell::quiet()).unwrap();

        assert_eq!(tarball, out.path().join("babel-1.4.0.tar.gz"));
        assert_eq!(std::fs::read(&tarball).unwrap(), b"archive");
        assert!(exec.calls()[0].starts_with("curl -s https://example.org/babel-1.4.0.tar.gz -f -L -o "));
    }

    #[test]
    fn test_fetch_existing_tarball_runs_nothing() {
        let tmp = TempDir::new().unwrap();
        let dir = ModuleFixture::new("cem").write_to(tmp.path()).unwrap();
        let out = tmp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("cem-head.tar.gz"), b"cached").unwrap();
        let exec = MockExecutor::new();

        let opts = FetchOptions {
            module: "cem".to_string(),
            version: None,
            local: Some(dir),
            dest: out.clone(),
        };
        let tarball = fetch(&opts, &Catalog::builtin(), &LocalArchiveFetcher::new(), &exec, &Shell::quiet())
            .unwrap();

        assert_eq!(tarball, out.join("cem-head.tar.gz"));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn test_fetch_unknown_module() {
        let archives = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let repos = vec![RepositoryFixture::new("csdms/rpm_models")];
        let fetcher = LocalArchiveFetcher::with_repositories(archives.path(), &repos).unwrap();

        let opts = FetchOptions {
            module: "cem".to_string(),
            version: None,
            local: None,
            dest: out.path().to_path_buf(),
        };
        let err = fetch(
            &opts,
            &Catalog::parse("\ncsdms/rpm_models\n"),
            &fetcher,
            &MockExecutor::new(),
            &Shell::quiet(),
        )
        .unwrap_err();

        assert_eq!(
            find_packager_error(&err).map(|e| e.kind()),
            Some(ErrorKind::ModuleNotFound)
        );
    }
}
