//! Test utilities and mocks for packager unit tests.
//!
//! Provides a scripted [`MockExecutor`] for the commands that retrieve
//! sources and build packages, and a [`LocalArchiveFetcher`] that serves
//! repository archives from disk instead of the network.
//!
//! # Example
//!
//! ```rust,ignore
//! use packagebuilder::test_support::{MockExecutor, RepositoryFixture, ModuleFixture};
//!
//! #[test]
//! fn test_example() {
//!     let exec = MockExecutor::new().on("git", 0);
//!     let repo = RepositoryFixture::new("csdms/rpm_models").with_module(ModuleFixture::new("cem"));
//!     // Use mocks in tests...
//! }
//! ```

pub mod fixtures;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::errors::PackagerError;
use crate::sources::archive::ArchiveFetcher;
use crate::sources::catalog::RepositoryId;
use crate::util::process::{CommandExecutor, CommandStatus, ProcessBuilder};

pub use fixtures::*;

type Effect = Box<dyn Fn(&ProcessBuilder) -> std::io::Result<()>>;

struct MockResponse {
    program: String,
    code: i32,
    effect: Option<Effect>,
}

/// Mock process executor.
///
/// Responds to commands by program name, optionally running a side effect
/// (such as creating the directory a checkout would produce), and records
/// every command it sees.
#[derive(Default)]
pub struct MockExecutor {
    responses: Vec<MockResponse>,
    calls: RefCell<Vec<String>>,
}

impl MockExecutor {
    /// Create a mock that knows no commands.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any invocation of `program` with exit `code`.
    pub fn on(mut self, program: &str, code: i32) -> Self {
        self.responses.push(MockResponse {
            program: program.to_string(),
            code,
            effect: None,
        });
        self
    }

    /// Answer `program` with exit `code` after running `effect`.
    pub fn on_with(
        mut self,
        program: &str,
        code: i32,
        effect: impl Fn(&ProcessBuilder) -> std::io::Result<()> + 'static,
    ) -> Self {
        self.responses.push(MockResponse {
            program: program.to_string(),
            code,
            effect: Some(Box::new(effect)),
        });
        self
    }

    /// Commands run so far, as display strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandExecutor for MockExecutor {
    fn run(&self, cmd: &ProcessBuilder) -> Result<CommandStatus> {
        self.calls.borrow_mut().push(cmd.display_command());

        let program = cmd
            .get_program()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let Some(response) = self.responses.iter().find(|r| r.program == program) else {
            bail!("unexpected command: {}", cmd.display_command());
        };

        if let Some(effect) = &response.effect {
            effect(cmd)?;
        }
        Ok(CommandStatus::from_code(response.code))
    }
}

/// Serves repository archives from local zip files.
#[derive(Default)]
pub struct LocalArchiveFetcher {
    archives: HashMap<String, PathBuf>,
    downloads: RefCell<Vec<String>>,
}

impl LocalArchiveFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write each repository's archive under `dir` and serve it.
    pub fn with_repositories(dir: &Path, repos: &[RepositoryFixture]) -> std::io::Result<Self> {
        let mut fetcher = Self::new();
        for repo in repos {
            let zip = repo.write_zip(dir)?;
            fetcher.archives.insert(repo.id.clone(), zip);
        }
        Ok(fetcher)
    }

    /// Repository identifiers downloaded so far, in order.
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.borrow().clone()
    }
}

impl ArchiveFetcher for LocalArchiveFetcher {
    fn download(&self, repo: &RepositoryId, dest: &Path) -> Result<PathBuf> {
        self.downloads.borrow_mut().push(repo.to_string());

        let Some(source) = self.archives.get(repo.as_str()) else {
            return Err(PackagerError::ArchiveFetchFailed {
                repository: repo.to_string(),
                url: format!("file://{}", repo),
                reason: "HTTP 404 Not Found".to_string(),
            }
            .into());
        };

        let local_file = dest.join(format!("{}.zip", repo.base_name()));
        std::fs::copy(source, &local_file)?;
        Ok(local_file)
    }
}
