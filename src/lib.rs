//! packagebuilder - builds RPMs for CSDMS models and tools
//!
//! This crate provides the library behind `pkgbuilder`: locating a
//! module's packaging metadata across a catalog of repositories,
//! retrieving its source as a tarball, and driving `rpmbuild`.

pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for packager unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a scripted command executor and an archive
/// fetcher that serves repository fixtures from disk.
#[cfg(test)]
pub mod test_support;

pub use core::{Dependencies, ErrorKind, ModuleDescriptor, PackagerError};
pub use sources::Catalog;
pub use util::context::GlobalContext;
