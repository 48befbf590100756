//! In-memory catalog model and the cross-repository merge
//!
//! A [`Catalog`] maps `(type, name, version)` to one validated resource.
//! Two repositories claiming the same key is a hard error, never a silent
//! overwrite: an ambiguous entry in a catalog that will be signed is worse
//! than no catalog at all.

use std::collections::BTreeMap;
use std::fmt;

use crate::contract::ContractEntry;
use crate::core::error::{CatalogError, Result};

/// Identity of one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CatalogKey {
    pub resource_type: String,
    pub name: String,
    pub version: String,
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.resource_type, self.name, self.version)
    }
}

/// A resource whose content has passed digest verification.
#[derive(Debug, Clone)]
pub struct ResourceArtifact {
    pub entry: ContractEntry,
    pub content: Vec<u8>,
    /// Display name of the repository that contributed this resource.
    pub source_repository: String,
}

impl ResourceArtifact {
    pub fn key(&self) -> CatalogKey {
        CatalogKey {
            resource_type: self.entry.resource_type.clone(),
            name: self.entry.name.clone(),
            version: self.entry.version.clone(),
        }
    }
}

/// Everything one repository contributed, in the order it was fetched.
#[derive(Debug)]
pub struct RepositoryResources {
    pub repository: String,
    pub artifacts: Vec<ResourceArtifact>,
}

/// Merged catalog across every configured repository.
///
/// Backed by a BTreeMap so iteration order is deterministic, which the
/// filesystem generator relies on for byte-identical re-runs.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: BTreeMap<CatalogKey, ResourceArtifact>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &CatalogKey) -> Option<&ResourceArtifact> {
        self.entries.get(key)
    }

    /// All entries, ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (&CatalogKey, &ResourceArtifact)> {
        self.entries.iter()
    }

    /// Entries of one resource type, ordered by key.
    pub fn of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a CatalogKey, &'a ResourceArtifact)> {
        self.entries
            .iter()
            .filter(move |(key, _)| key.resource_type == resource_type)
    }
}

/// Fold per-repository results into one catalog.
///
/// `results` must be in repository declaration order; that order decides
/// which repository is blamed first when a key collides.
pub fn merge(results: Vec<RepositoryResources>) -> Result<Catalog> {
    let mut catalog = Catalog::default();
    for result in results {
        for artifact in result.artifacts {
            let key = artifact.key();
            if let Some(existing) = catalog.entries.get(&key) {
                return Err(CatalogError::Collision {
                    key: key.to_string(),
                    first: existing.source_repository.clone(),
                    second: artifact.source_repository,
                });
            }
            catalog.entries.insert(key, artifact);
        }
    }
    Ok(catalog)
}
