//! Catalog assembly engine
//!
//! Pulls release artifacts from external source repositories and
//! materializes them into a canonical on-disk layout for downstream
//! signing and distribution. Each release is expected to attach two
//! artifacts: a contract manifest (`catalog.yaml`) enumerating resources
//! with their SHA-256 checksums, and a resource bundle
//! (`resources.tar.gz`) holding the content the manifest describes.
//!
//! The engine lists each repository's releases, filters them through an
//! exact-tag ignore list, validates every resource against its declared
//! checksum, merges all repositories into one catalog (rejecting key
//! collisions), and writes the result to a target directory with an
//! `index.yaml` summarizing the written entries.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use catalog_assembler::{
//!     fetch_from_externals, generate_filesystem, ExternalSpec, GithubClient, RepositorySpec,
//! };
//!
//! # fn main() -> catalog_assembler::Result<()> {
//! let external = ExternalSpec {
//!     repositories: vec![RepositorySpec::new(
//!         "https://github.com/openshift-pipelines/task-containers",
//!         "tasks",
//!     )],
//! };
//! let client = GithubClient::new();
//! let catalog = fetch_from_externals(&external, &client)?;
//! generate_filesystem(Path::new("/path/to/catalog"), &catalog, "tasks")?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod contract;
pub mod core;
pub mod external;
pub mod fetch;
pub mod generate;
pub mod tarball;

pub use catalog::{Catalog, CatalogKey, RepositoryResources, ResourceArtifact};
pub use client::{GithubClient, ReleaseRef};
pub use contract::ContractEntry;
pub use crate::core::error::{CatalogError, Result};
pub use crate::core::output;
pub use external::{ExternalSpec, RepositorySpec};
pub use fetch::{fetch_from_externals, fetch_from_externals_with, FetchOptions};
pub use generate::{generate_filesystem, CatalogIndex, IndexEntry};
