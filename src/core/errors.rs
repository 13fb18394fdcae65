//! Fatal error conditions and their process exit codes.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Coarse classification of a fatal condition.
///
/// The binary maps each kind to its own exit status so that callers can
/// tell the failures apart without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedOs,
    CatalogUnreadable,
    ModuleNotFound,
    LocalOverrideInvalid,
    SourceRetrievalFailed,
    BuildFailed,
}

impl ErrorKind {
    /// Process exit status for this kind.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::UnsupportedOs => 2,
            ErrorKind::ModuleNotFound => 3,
            ErrorKind::LocalOverrideInvalid => 4,
            ErrorKind::SourceRetrievalFailed => 5,
            ErrorKind::BuildFailed => 6,
            ErrorKind::CatalogUnreadable => 7,
        }
    }
}

/// Exit status for failures that carry no [`PackagerError`].
pub const GENERIC_EXIT_CODE: i32 = 1;

/// Error raised while resolving, fetching, or building a module.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum PackagerError {
    #[error("the repository catalog `{}` cannot be read", path.display())]
    #[diagnostic(
        code(packagebuilder::catalog::unreadable),
        help("Check the `[catalog] path` setting in your configuration")
    )]
    CatalogUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("the module `{module}` cannot be located")]
    #[diagnostic(
        code(packagebuilder::locate::not_found),
        help("Check the module name, or point `--local` at a directory of module files")
    )]
    ModuleNotFound { module: String },

    #[error("the specified local directory `{}` does not hold the module `{module}`", path.display())]
    #[diagnostic(
        code(packagebuilder::locate::local_invalid),
        help("Pass either the module directory itself or its parent directory")
    )]
    LocalOverrideInvalid { module: String, path: PathBuf },

    #[error("unable to download repository archive `{repository}` from {url}: {reason}")]
    #[diagnostic(
        code(packagebuilder::fetch::archive),
        help("Check your network connection")
    )]
    ArchiveFetchFailed {
        repository: String,
        url: String,
        reason: String,
    },

    #[error("unable to download the source of `{module}`: {reason}")]
    #[diagnostic(code(packagebuilder::fetch::source))]
    SourceRetrievalFailed { module: String, reason: String },

    #[error("unrecognized fetch tool `{tool}` in the source recipe of `{module}`")]
    #[diagnostic(
        code(packagebuilder::fetch::unknown_tool),
        help("Supported tools are wget, curl, git, svn, hg and bzr")
    )]
    UnknownFetchTool { module: String, tool: String },

    #[error("invalid source recipe for `{module}`: {reason}")]
    #[diagnostic(code(packagebuilder::fetch::invalid_recipe))]
    InvalidSourceRecipe { module: String, reason: String },

    #[error("error in building the RPM for `{module}`")]
    #[diagnostic(
        code(packagebuilder::build::failed),
        help("Run with `--verbose` to see the rpmbuild command line")
    )]
    BuildFailed { module: String },

    #[error("this OS is not supported")]
    #[diagnostic(code(packagebuilder::platform::unsupported))]
    UnsupportedOs,
}

impl PackagerError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PackagerError::CatalogUnreadable { .. } => ErrorKind::CatalogUnreadable,
            PackagerError::ModuleNotFound { .. } => ErrorKind::ModuleNotFound,
            PackagerError::LocalOverrideInvalid { .. } => ErrorKind::LocalOverrideInvalid,
            PackagerError::ArchiveFetchFailed { .. }
            | PackagerError::SourceRetrievalFailed { .. }
            | PackagerError::UnknownFetchTool { .. }
            | PackagerError::InvalidSourceRecipe { .. } => ErrorKind::SourceRetrievalFailed,
            PackagerError::BuildFailed { .. } => ErrorKind::BuildFailed,
            PackagerError::UnsupportedOs => ErrorKind::UnsupportedOs,
        }
    }

    /// Convert to a user-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string());

        match self {
            PackagerError::CatalogUnreadable { path, source } => {
                diag = diag.with_location(path).with_context(source.to_string());
            }
            PackagerError::LocalOverrideInvalid { path, .. } => {
                diag = diag.with_location(path);
            }
            _ => {}
        }

        if let Some(help) = MietteDiagnostic::help(self) {
            diag = diag.with_suggestion(help.to_string());
        }

        diag
    }
}

/// Find the first [`PackagerError`] in an error chain.
pub fn find_packager_error(err: &anyhow::Error) -> Option<&PackagerError> {
    err.chain().find_map(|cause| cause.downcast_ref::<PackagerError>())
}

/// Exit status for an arbitrary error.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    find_packager_error(err)
        .map(|e| e.kind().exit_code())
        .unwrap_or(GENERIC_EXIT_CODE)
}
