//! Shared utilities

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod flavor;
pub mod fs;
pub mod process;
pub mod shell;

pub use config::Config;
pub use context::GlobalContext;
pub use diagnostic::Diagnostic;
pub use process::{CommandExecutor, ProcessBuilder, SystemExecutor};
pub use shell::Shell;
