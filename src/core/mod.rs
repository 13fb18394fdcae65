//! Core data structures.
//!
//! - [`ModuleDescriptor`]: a located module with its version and location
//! - [`Dependencies`]: its build requirements
//! - [`PackagerError`]: fatal conditions and their exit codes

pub mod dependency;
pub mod errors;
pub mod module;

pub use dependency::Dependencies;
pub use errors::{ErrorKind, PackagerError};
pub use module::ModuleDescriptor;
