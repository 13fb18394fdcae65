//! Located modules.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::dependency::Dependencies;
use crate::core::errors::PackagerError;
use crate::sources::archive::ArchiveFetcher;
use crate::sources::catalog::{Catalog, RepositoryId};
use crate::sources::locator::ModuleLocator;
use crate::sources::retrieve::{tarball_name, SourceRetriever};
use crate::util::fs::{expand_path, normalize_lexically};
use crate::util::process::CommandExecutor;

/// Version used when none is given.
pub const DEFAULT_VERSION: &str = "head";

/// A module whose packaging metadata directory has been found.
///
/// Remote modules live in a private temporary directory owned by the
/// descriptor. Call [`ModuleDescriptor::cleanup`] once the source has been
/// retrieved and the package built; dropping the descriptor also removes
/// the directory, but silently.
#[derive(Debug)]
pub struct ModuleDescriptor {
    name: String,
    version: String,
    location: PathBuf,
    dependencies: Dependencies,
    origin: Option<RemoteOrigin>,
}

/// Repository a remote module came from, and the directory it was
/// unpacked into.
#[derive(Debug)]
struct RemoteOrigin {
    repository: RepositoryId,
    work_dir: TempDir,
}

impl ModuleDescriptor {
    /// Locate `name` and read its dependencies.
    ///
    /// With `local`, the module is taken from that directory (either the
    /// module directory itself or its parent) and nothing is downloaded.
    /// `~` and environment variables in `local` are expanded and relative
    /// paths are taken from the working directory. Otherwise the catalog's
    /// repositories are searched in order.
    pub fn create(
        name: &str,
        version: Option<&str>,
        local: Option<&Path>,
        catalog: &Catalog,
        fetcher: &dyn ArchiveFetcher,
    ) -> Result<Self> {
        let version = version.unwrap_or(DEFAULT_VERSION).to_string();

        let (location, origin) = match local {
            Some(dir) => (resolve_local(name, dir)?, None),
            None => {
                let (location, origin) = locate_remote(name, catalog, fetcher)?;
                (location, Some(origin))
            }
        };

        let dependencies = Dependencies::read(&location)?;
        tracing::debug!(
            "{} {} at {} requires {}",
            name,
            version,
            location.display(),
            dependencies
        );

        Ok(ModuleDescriptor {
            name: name.to_string(),
            version,
            location,
            dependencies,
            origin,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Directory holding `source.txt`, the spec file and patches.
    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Whether the module was downloaded rather than given locally.
    pub fn is_remote(&self) -> bool {
        self.origin.is_some()
    }

    /// Repository a remote module was found in.
    pub fn repository(&self) -> Option<&RepositoryId> {
        self.origin.as_ref().map(|origin| &origin.repository)
    }

    /// `<name>-<version>.tar.gz`
    pub fn tarball_name(&self) -> String {
        tarball_name(&self.name, &self.version)
    }

    /// Retrieve the module source into `dest`, or into the module
    /// directory when no destination is given.
    pub fn retrieve_source(&self, executor: &dyn CommandExecutor, dest: Option<&Path>) -> Result<PathBuf> {
        let dest = dest.unwrap_or(&self.location);
        SourceRetriever::new(executor).retrieve(&self.name, &self.version, &self.location, dest)
    }

    /// Remove the temporary directory of a remote module.
    pub fn cleanup(self) -> Result<()> {
        if let Some(RemoteOrigin { work_dir, .. }) = self.origin {
            let path = work_dir.path().to_path_buf();
            work_dir
                .close()
                .with_context(|| format!("failed to remove {}", path.display()))?;
            tracing::debug!("removed {}", path.display());
        }
        Ok(())
    }
}

/// Find `name` in a caller-supplied directory.
///
/// `dir` may be the module directory itself (its last component is the
/// module name) or a directory containing it. It is normalized first with
/// [`normalize_local`].
pub fn resolve_local(name: &str, dir: &Path) -> Result<PathBuf, PackagerError> {
    let dir = normalize_local(dir);
    let invalid = || PackagerError::LocalOverrideInvalid {
        module: name.to_string(),
        path: dir.clone(),
    };

    if dir.file_name().is_some_and(|base| base == name) {
        return if dir.is_dir() {
            Ok(dir.to_path_buf())
        } else {
            Err(invalid())
        };
    }

    let nested = dir.join(name);
    if is_plain_name(name) && nested.is_dir() {
        Ok(nested)
    } else {
        Err(invalid())
    }
}

/// Expand `~` and `$VAR`, make the path absolute and drop `.` and `..`.
pub fn normalize_local(dir: &Path) -> PathBuf {
    let expanded = expand_path(&dir.to_string_lossy());
    match std::path::absolute(&expanded) {
        Ok(absolute) => normalize_lexically(&absolute),
        Err(_) => expanded,
    }
}

fn locate_remote(
    name: &str,
    catalog: &Catalog,
    fetcher: &dyn ArchiveFetcher,
) -> Result<(PathBuf, RemoteOrigin)> {
    let not_found = || PackagerError::ModuleNotFound {
        module: name.to_string(),
    };
    if !is_plain_name(name) {
        return Err(not_found().into());
    }

    let work_dir = tempfile::Builder::new()
        .prefix("packagebuilder-")
        .tempdir()
        .context("failed to create temporary directory")?;

    match ModuleLocator::new(catalog, fetcher).locate(name, work_dir.path())? {
        Some(found) => Ok((
            found.path,
            RemoteOrigin {
                repository: found.repository,
                work_dir,
            },
        )),
        None => Err(not_found().into()),
    }
}

/// Module names are single path components.
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::{find_packager_error, ErrorKind};
    use crate::sources::retrieve::list_tarball;
    use crate::test_support::{LocalArchiveFetcher, MockExecutor, ModuleFixture, RepositoryFixture};
    use crate::util::process::ProcessBuilder;

    fn repositories() -> Vec<RepositoryFixture> {
        vec![
            RepositoryFixture::new("csdms/rpm_models").with_module(
                ModuleFixture::new("hydrotrend").with_dependencies("\nbabel\nlibxml2-devel\n"),
            ),
            RepositoryFixture::new("csdms/rpm_tools").with_module(ModuleFixture::new("babel")),
        ]
    }

    fn fake_checkout(cmd: &ProcessBuilder) -> std::io::Result<()> {
        let target = PathBuf::from(cmd.get_args().last().unwrap());
        std::fs::create_dir_all(&target)?;
        std::fs::write(target.join("hydrotrend.c"), "int main(void) { return 0; }\n")
    }

    #[test]
    fn test_hydrotrend_end_to_end() {
        let archives = TempDir::new().unwrap();
        let fetcher = LocalArchiveFetcher::with_repositories(archives.path(), &repositories()).unwrap();
        let catalog = Catalog::builtin();

        let module = ModuleDescriptor::create("hydrotrend", None, None, &catalog, &fetcher).unwrap();

        assert_eq!(module.version(), "head");
        assert!(module.is_remote());
        assert_eq!(module.repository().map(|r| r.as_str()), Some("csdms/rpm_models"));
        assert!(module.location().ends_with("hydrotrend"));
        assert!(module.location().starts_with(std::env::temp_dir()));
        assert_eq!(module.dependencies().as_build_requires(), "babel, libxml2-devel");

        let exec = MockExecutor::new().on_with("git", 0, fake_checkout);
        let tarball = module.retrieve_source(&exec, None).unwrap();
        assert_eq!(tarball, module.location().join("hydrotrend-head.tar.gz"));
        assert!(list_tarball(&tarball)
            .unwrap()
            .contains(&PathBuf::from("hydrotrend-head/hydrotrend.c")));

        let location = module.location().to_path_buf();
        module.cleanup().unwrap();
        assert!(!location.exists());
    }

    #[test]
    fn test_remote_module_without_dependency_file() {
        let archives = TempDir::new().unwrap();
        let fetcher = LocalArchiveFetcher::with_repositories(archives.path(), &repositories()).unwrap();

        let module =
            ModuleDescriptor::create("babel", Some("1.4.0"), None, &Catalog::builtin(), &fetcher).unwrap();

        assert_eq!(module.version(), "1.4.0");
        assert_eq!(module.tarball_name(), "babel-1.4.0.tar.gz");
        assert!(module.dependencies().is_default());
        assert_eq!(module.dependencies().as_build_requires(), "rpm");
        module.cleanup().unwrap();
    }

    #[test]
    fn test_unknown_module_is_not_found() {
        let archives = TempDir::new().unwrap();
        let fetcher = LocalArchiveFetcher::with_repositories(archives.path(), &repositories()).unwrap();

        let err = ModuleDescriptor::create("sedflux", None, None, &Catalog::builtin(), &fetcher)
            .unwrap_err();
        assert_eq!(
            find_packager_error(&err).map(|e| e.kind()),
            Some(ErrorKind::ModuleNotFound)
        );

        let err = ModuleDescriptor::create("../etc", None, None, &Catalog::builtin(), &fetcher)
            .unwrap_err();
        assert_eq!(
            find_packager_error(&err).map(|e| e.kind()),
            Some(ErrorKind::ModuleNotFound)
        );
    }

    #[test]
    fn test_local_module_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = ModuleFixture::new("cem").write_to(tmp.path()).unwrap();
        let fetcher = LocalArchiveFetcher::new();

        let module =
            ModuleDescriptor::create("cem", None, Some(&dir), &Catalog::builtin(), &fetcher).unwrap();

        assert_eq!(module.location(), dir);
        assert!(!module.is_remote());
        assert!(module.repository().is_none());
        assert!(fetcher.downloads().is_empty());

        module.cleanup().unwrap();
        assert!(dir.exists());
    }

    #[test]
    fn test_local_parent_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = ModuleFixture::new("cem").write_to(tmp.path()).unwrap();

        assert_eq!(resolve_local("cem", tmp.path()).unwrap(), dir);
    }

    #[test]
    fn test_local_directory_without_module() {
        let tmp = TempDir::new().unwrap();
        ModuleFixture::new("cem").write_to(tmp.path()).unwrap();

        let err = resolve_local("hydrotrend", tmp.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocalOverrideInvalid);

        let missing = tmp.path().join("nowhere/cem");
        let err = resolve_local("cem", &missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocalOverrideInvalid);
    }

    #[test]
    fn test_local_path_with_parent_segments() {
        let tmp = TempDir::new().unwrap();
        let dir = ModuleFixture::new("cem").write_to(&tmp.path().join("x")).unwrap();
        let raw = tmp.path().join("missing/../x");

        let module =
            ModuleDescriptor::create("cem", None, Some(&raw), &Catalog::builtin(), &LocalArchiveFetcher::new())
                .unwrap();

        assert_eq!(module.location(), dir);
    }

    #[test]
    fn test_local_path_with_environment_variable() {
        let tmp = TempDir::new().unwrap();
        let dir = ModuleFixture::new("cem").write_to(&tmp.path().join("x")).unwrap();
        std::env::set_var("PKGBUILDER_TEST_LOCAL_MODELS", tmp.path().join("x"));

        let module = ModuleDescriptor::create(
            "cem",
            None,
            Some(Path::new("$PKGBUILDER_TEST_LOCAL_MODELS")),
            &Catalog::builtin(),
            &LocalArchiveFetcher::new(),
        )
        .unwrap();

        assert_eq!(module.location(), dir);
    }

    #[test]
    fn test_local_path_under_home() {
        let Some(dirs) = directories::BaseDirs::new() else {
            return;
        };
        let home = dirs.home_dir();
        if !home.is_dir() {
            return;
        }
        let tmp = match tempfile::Builder::new().prefix(".pkgbuilder-test-").tempdir_in(home) {
            Ok(tmp) => tmp,
            Err(_) => return,
        };
        let dir = ModuleFixture::new("cem").write_to(tmp.path()).unwrap();
        let base = tmp.path().file_name().unwrap().to_string_lossy().into_owned();

        let resolved = resolve_local("cem", Path::new(&format!("~/{}", base))).unwrap();
        assert_eq!(resolved, dir);

        let resolved = resolve_local("cem", Path::new(&format!("~/{}/./cem", base))).unwrap();
        assert_eq!(resolved, dir);
    }

    #[test]
    fn test_relative_local_path_is_made_absolute() {
        let normalized = normalize_local(Path::new("rpm_models/./cem"));
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("rpm_models/cem"));
    }

    #[test]
    fn test_retrieve_into_destination() {
        let tmp = TempDir::new().unwrap();
        let dir = ModuleFixture::new("hydrotrend").write_to(tmp.path()).unwrap();
        let dest = tmp.path().join("dist");
        let module =
            ModuleDescriptor::create("hydrotrend", Some("3.0"), Some(&dir), &Catalog::builtin(), &LocalArchiveFetcher::new())
                .unwrap();
        let exec = MockExecutor::new().on_with("git", 0, fake_checkout);

        let tarball = module.retrieve_source(&exec, Some(&dest)).unwrap();

        assert_eq!(tarball, dest.join("hydrotrend-3.0.tar.gz"));
        assert!(!dir.join("hydrotrend-3.0.tar.gz").exists());
    }
}
