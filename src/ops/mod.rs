//! High-level operations.
//!
//! This module contains the implementation of pkgbuilder commands.

pub mod fetch;
pub mod rpm_build;

pub use fetch::{fetch, FetchOptions};
pub use rpm_build::{build_rpm, RpmBuildOptions, RpmBuildResult};
