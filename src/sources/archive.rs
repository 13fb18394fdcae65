//! Repository archive download and extraction.
//!
//! A repository is fetched as a zip snapshot of one branch. Hosting
//! services wrap the snapshot in a single `<repo>-<branch>/` directory;
//! extraction returns that directory as the effective root.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::core::errors::PackagerError;
use crate::sources::catalog::RepositoryId;
use crate::util::config::{Config, DEFAULT_ARCHIVE_URL, DEFAULT_BRANCH};
use crate::util::shell::Shell;

/// Downloads and unpacks repository archives.
pub trait ArchiveFetcher {
    /// Download the archive of `repo` into `dest`, returning the archive path.
    fn download(&self, repo: &RepositoryId, dest: &Path) -> Result<PathBuf>;

    /// Extract `archive` into `dest`, returning the extraction root.
    fn extract(&self, archive: &Path, dest: &Path) -> Result<PathBuf> {
        extract_zip(archive, dest)
    }
}

/// Fetches branch snapshots over HTTPS.
pub struct HttpArchiveFetcher {
    client: reqwest::blocking::Client,
    url_template: String,
    branch: String,
    shell: Arc<Shell>,
}

impl HttpArchiveFetcher {
    /// Create a fetcher for GitHub `master` snapshots.
    pub fn new(shell: Arc<Shell>) -> Result<Self> {
        Self::builder(DEFAULT_ARCHIVE_URL, DEFAULT_BRANCH, None, None, shell)
    }

    /// Create a fetcher from the `[catalog]` and `[net]` settings.
    pub fn from_config(config: &Config, shell: Arc<Shell>) -> Result<Self> {
        Self::builder(
            config.url_template(),
            config.branch(),
            config.net.timeout_secs.map(Duration::from_secs),
            config.net.user_agent.as_deref(),
            shell,
        )
    }

    fn builder(
        url_template: &str,
        branch: &str,
        timeout: Option<Duration>,
        user_agent: Option<&str>,
        shell: Arc<Shell>,
    ) -> Result<Self> {
        let user_agent = user_agent
            .map(str::to_string)
            .unwrap_or_else(|| format!("packagebuilder/{}", env!("CARGO_PKG_VERSION")));

        let mut builder = reqwest::blocking::Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to create HTTP client")?;

        Ok(HttpArchiveFetcher {
            client,
            url_template: url_template.to_string(),
            branch: branch.to_string(),
            shell,
        })
    }

    /// Snapshot URL for a repository.
    pub fn archive_url(&self, repo: &RepositoryId) -> Result<Url> {
        archive_url(&self.url_template, repo, &self.branch)
    }
}

impl ArchiveFetcher for HttpArchiveFetcher {
    fn download(&self, repo: &RepositoryId, dest: &Path) -> Result<PathBuf> {
        let url = self.archive_url(repo)?;
        let local_file = dest.join(format!("{}.zip", repo.base_name()));
        let fetch_failed = |reason: String| PackagerError::ArchiveFetchFailed {
            repository: repo.to_string(),
            url: url.to_string(),
            reason,
        };

        tracing::info!("Downloading {} from {}", repo, url);

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| fetch_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_failed(format!("HTTP {}", response.status())).into());
        }

        let progress = self
            .shell
            .bytes_progress(format!("{}.zip", repo.base_name()), response.content_length());

        let file = File::create(&local_file)
            .with_context(|| format!("failed to create {}", local_file.display()))?;
        let mut writer = ProgressWriter {
            inner: file,
            progress: &progress,
        };
        let copied = response.copy_to(&mut writer);
        progress.finish();
        copied.map_err(|e| fetch_failed(e.to_string()))?;
        writer.flush()?;

        Ok(local_file)
    }
}

/// Expand a URL template for a repository and branch.
pub fn archive_url(template: &str, repo: &RepositoryId, branch: &str) -> Result<Url> {
    let raw = template
        .replace("{repo}", repo.as_str())
        .replace("{branch}", branch);
    Url::parse(&raw).with_context(|| format!("invalid archive URL: {}", raw))
}

struct ProgressWriter<'a, W> {
    inner: W,
    progress: &'a crate::util::shell::Progress,
}

impl<W: Write> Write for ProgressWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.progress.inc(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Extract a zip archive into `dest`.
///
/// Returns `dest` joined with the path prefix shared by every entry, which
/// for hosted snapshots is the single `<repo>-<branch>` directory. Entries
/// that would escape `dest` are skipped.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<PathBuf> {
    let file = File::open(archive_path)
        .with_context(|| format!("failed to open archive: {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("not a zip archive: {}", archive_path.display()))?;

    std::fs::create_dir_all(dest)
        .with_context(|| format!("failed to create directory: {}", dest.display()))?;

    let mut names = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("failed to read entry {} of {}", i, archive_path.display()))?;

        let relative = match entry.enclosed_name() {
            Some(p) => p,
            None => {
                tracing::warn!("skipping unsafe archive entry: {}", entry.name());
                continue;
            }
        };
        let out_path = dest.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)
                .with_context(|| format!("failed to create directory: {}", out_path.display()))?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory: {}", parent.display()))?;
            }
            let mut outfile = File::create(&out_path)
                .with_context(|| format!("failed to create file: {}", out_path.display()))?;
            io::copy(&mut entry, &mut outfile)
                .with_context(|| format!("failed to extract file: {}", out_path.display()))?;

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))?;
            }
        }

        names.push(relative);
    }

    // A lone file entry shares its whole path with itself; that is not a root.
    let root = dest.join(common_prefix(&names));
    if root.is_dir() {
        Ok(root)
    } else {
        Ok(dest.to_path_buf())
    }
}

/// Longest path prefix shared by all entry paths.
///
/// Comparison is per path component, so `a-master/x` and `a-main/y` share
/// nothing rather than the partial name `a-ma`.
fn common_prefix(names: &[PathBuf]) -> PathBuf {
    let Some((first, rest)) = names.split_first() else {
        return PathBuf::new();
    };

    let mut prefix: Vec<Component<'_>> = first.components().collect();
    for name in rest {
        let shared = prefix
            .iter()
            .zip(name.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        prefix.truncate(shared);
    }

    prefix.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ModuleFixture, RepositoryFixture};
    use tempfile::TempDir;

    #[test]
    fn test_archive_url() {
        let repo = RepositoryId::new("csdms/rpm_models");
        let url = archive_url(DEFAULT_ARCHIVE_URL, &repo, DEFAULT_BRANCH).unwrap();
        assert_eq!(
            url.as_str(),
            "https://github.com/csdms/rpm_models/archive/master.zip"
        );

        let url = archive_url("https://mirror.example.org/{repo}@{branch}.zip", &repo, "main").unwrap();
        assert_eq!(url.as_str(), "https://mirror.example.org/csdms/rpm_models@main.zip");

        assert!(archive_url("not a url {repo}", &repo, "main").is_err());
    }

    #[test]
    fn test_fetcher_uses_configured_template() {
        let mut config = Config::default();
        config.catalog.branch = Some("develop".to_string());
        let fetcher = HttpArchiveFetcher::from_config(&config, Arc::new(Shell::quiet())).unwrap();

        let url = fetcher.archive_url(&RepositoryId::new("csdms/rpm_tools")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://github.com/csdms/rpm_tools/archive/develop.zip"
        );
    }

    #[test]
    fn test_extract_returns_wrapping_directory() {
        let tmp = TempDir::new().unwrap();
        let repo = RepositoryFixture::new("csdms/rpm_models")
            .with_module(ModuleFixture::new("cem").with_dependencies("\nlibcem\n"));
        let zip_path = repo.write_zip(tmp.path()).unwrap();

        let dest = tmp.path().join("work");
        let root = extract_zip(&zip_path, &dest).unwrap();

        assert_eq!(root, dest.join("rpm_models-master"));
        assert!(root.join("cem").is_dir());
        assert!(root.join("cem/source.txt").is_file());
        assert_eq!(
            std::fs::read_to_string(root.join("cem/dependencies.txt")).unwrap(),
            "\nlibcem\n"
        );
    }

    #[test]
    fn test_extract_without_shared_directory() {
        let tmp = TempDir::new().unwrap();
        let zip_path = tmp.path().join("flat.zip");
        {
            let file = File::create(&zip_path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("README", options).unwrap();
            zip.write_all(b"readme").unwrap();
            zip.start_file("cem/source.txt", options).unwrap();
            zip.write_all(b"wget http://example.org/cem.tar.gz").unwrap();
            zip.finish().unwrap();
        }

        let dest = tmp.path().join("work");
        assert_eq!(extract_zip(&zip_path, &dest).unwrap(), dest);
        assert!(dest.join("cem/source.txt").is_file());
    }

    #[test]
    fn test_extract_single_file_archive() {
        let tmp = TempDir::new().unwrap();
        let zip_path = tmp.path().join("single.zip");
        {
            let file = File::create(&zip_path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            zip.start_file("only.txt", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"x").unwrap();
            zip.finish().unwrap();
        }

        let dest = tmp.path().join("work");
        assert_eq!(extract_zip(&zip_path, &dest).unwrap(), dest);
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let tmp = TempDir::new().unwrap();
        let bogus = tmp.path().join("bogus.zip");
        std::fs::write(&bogus, "<html>404</html>").unwrap();
        assert!(extract_zip(&bogus, &tmp.path().join("work")).is_err());
    }

    #[test]
    fn test_common_prefix_is_per_component() {
        let names = vec![
            PathBuf::from("a-master/x"),
            PathBuf::from("a-main/y"),
        ];
        assert_eq!(common_prefix(&names), PathBuf::new());

        let names = vec![
            PathBuf::from("rpm_tools-master"),
            PathBuf::from("rpm_tools-master/babel"),
            PathBuf::from("rpm_tools-master/babel/source.txt"),
        ];
        assert_eq!(common_prefix(&names), PathBuf::from("rpm_tools-master"));
        assert_eq!(common_prefix(&[]), PathBuf::new());
    }
}
