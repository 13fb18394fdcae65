//! Where module metadata and module sources come from.
//!
//! Module metadata lives in repositories listed by a [`Catalog`]; each
//! repository is fetched as a zip snapshot and searched by a
//! [`ModuleLocator`]. A located module's `source.txt` is a
//! [`SourceRecipe`] that a [`SourceRetriever`] turns into a tarball.

pub mod archive;
pub mod catalog;
pub mod locator;
pub mod recipe;
pub mod retrieve;

pub use archive::{ArchiveFetcher, HttpArchiveFetcher};
pub use catalog::{Catalog, RepositoryId};
pub use locator::{LocatedModule, ModuleLocator};
pub use recipe::SourceRecipe;
pub use retrieve::SourceRetriever;
