//! Source retrieval: turning a module's recipe into `<name>-<version>.tar.gz`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::core::errors::PackagerError;
use crate::sources::recipe::SourceRecipe;
use crate::util::fs::remove_dir_all_if_exists;
use crate::util::process::{CommandExecutor, CommandStatus, ProcessBuilder};

/// Name of the recipe file in a module directory.
pub const SOURCE_RECIPE_FILE: &str = "source.txt";

/// File name of the source archive for a module version.
pub fn tarball_name(name: &str, version: &str) -> String {
    format!("{}-{}.tar.gz", name, version)
}

/// Runs a module's source recipe and normalizes the result to a tarball.
pub struct SourceRetriever<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> SourceRetriever<'a> {
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        SourceRetriever { executor }
    }

    /// Produce `<dest>/<name>-<version>.tar.gz` from the recipe in `location`.
    ///
    /// An existing tarball at the destination is returned as is, without
    /// running the recipe. Archives are written under a temporary name and
    /// renamed into place, so an interrupted run leaves no tarball behind.
    pub fn retrieve(&self, name: &str, version: &str, location: &Path, dest: &Path) -> Result<PathBuf> {
        let tarball = dest.join(tarball_name(name, version));
        if tarball.is_file() {
            tracing::info!("Using existing {}", tarball.display());
            return Ok(tarball);
        }

        let recipe = SourceRecipe::read(name, &location.join(SOURCE_RECIPE_FILE))?
            .expand(name, version);

        std::fs::create_dir_all(dest)
            .with_context(|| format!("failed to create directory: {}", dest.display()))?;

        match &recipe {
            SourceRecipe::DirectFile { tool, program, args } => {
                let partial = dest.join(format!("{}.part", tarball_name(name, version)));
                let cmd = ProcessBuilder::new(program)
                    .args(args)
                    .args(tool.output_args(&partial))
                    .cwd(dest);

                if let Err(e) = self.run(name, &cmd) {
                    let _ = std::fs::remove_file(&partial);
                    return Err(e);
                }
                if !partial.is_file() {
                    return Err(PackagerError::SourceRetrievalFailed {
                        module: name.to_string(),
                        reason: format!("`{}` produced no file", cmd.display_command()),
                    }
                    .into());
                }

                std::fs::rename(&partial, &tarball).with_context(|| {
                    format!("failed to move {} to {}", partial.display(), tarball.display())
                })?;
            }
            SourceRecipe::Checkout { program, args, .. } => {
                let dir_name = format!("{}-{}", name, version);
                let checkout = dest.join(&dir_name);
                if checkout.exists() {
                    tracing::warn!("removing stale checkout {}", checkout.display());
                    remove_dir_all_if_exists(&checkout)?;
                }

                let cmd = ProcessBuilder::new(program)
                    .args(args)
                    .arg(&checkout)
                    .cwd(dest);

                if let Err(e) = self.run(name, &cmd) {
                    let _ = remove_dir_all_if_exists(&checkout);
                    return Err(e);
                }
                if !checkout.is_dir() {
                    return Err(PackagerError::SourceRetrievalFailed {
                        module: name.to_string(),
                        reason: format!("`{}` produced no checkout", cmd.display_command()),
                    }
                    .into());
                }

                tracing::info!("Packing {} into {}", dir_name, tarball.display());
                pack_directory(&checkout, &dir_name, &tarball)?;
                remove_dir_all_if_exists(&checkout)?;
            }
        }

        Ok(tarball)
    }

    fn run(&self, module: &str, cmd: &ProcessBuilder) -> Result<()> {
        tracing::debug!("retrieving {} with `{}`", module, cmd.display_command());

        let status = self.executor.run(cmd).map_err(|e| PackagerError::SourceRetrievalFailed {
            module: module.to_string(),
            reason: format!("{:#}", e),
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(PackagerError::SourceRetrievalFailed {
                module: module.to_string(),
                reason: format!("`{}` {}", cmd.display_command(), describe_status(status)),
            }
            .into())
        }
    }
}

fn describe_status(status: CommandStatus) -> String {
    match status.code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

/// Write `dir` as a gzip-compressed tar whose entries live under `root`.
///
/// Symlinks are stored as links, not followed.
pub fn pack_directory(dir: &Path, root: &str, tarball: &Path) -> Result<()> {
    let parent = tarball.parent().unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;

    {
        let encoder = GzEncoder::new(tmp.as_file(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(false);
        builder
            .append_dir_all(root, dir)
            .with_context(|| format!("failed to archive {}", dir.display()))?;
        builder
            .into_inner()
            .and_then(|encoder| encoder.finish())
            .with_context(|| format!("failed to write {}", tarball.display()))?;
    }

    tmp.persist(tarball)
        .with_context(|| format!("failed to write {}", tarball.display()))?;
    Ok(())
}

/// Entry paths of a gzip-compressed tar, in archive order.
#[cfg(test)]
pub(crate) fn list_tarball(path: &Path) -> Result<Vec<PathBuf>> {
    let file = std::fs::File::open(path)?;
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    let mut names = Vec::new();
    for entry in archive.entries()? {
        names.push(entry?.path()?.into_owned());
    }
    Ok(names)
}
