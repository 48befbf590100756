//! Resource tarball unpacking and integrity validation
//!
//! The resource bundle attached to each release is a gzipped tarball. It is
//! unpacked in memory (resource payloads are small definition files) and
//! every contract entry is checked against it: the declared path must exist
//! inside the archive root, and the SHA-256 of the member bytes must equal
//! the checksum the contract declares. A manifest that disagrees with its
//! own artifacts indicates a corrupted or tampered release, so any mismatch
//! fails the whole repository.

use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use crate::catalog::ResourceArtifact;
use crate::contract::ContractEntry;
use crate::core::error::{CatalogError, Result};

/// Unpack a gzipped tarball into a path → content map.
///
/// Only regular files are kept. Entries with absolute paths or `..`
/// components are rejected outright: even though nothing is written to
/// disk here, a traversal path in a release bundle is never legitimate.
pub fn unpack(tarball: &[u8]) -> Result<BTreeMap<PathBuf, Vec<u8>>> {
    let mut archive = tar::Archive::new(GzDecoder::new(tarball));
    let mut files = BTreeMap::new();

    for entry in archive
        .entries()
        .map_err(|e| CatalogError::Integrity(format!("tarball read error: {e}")))?
    {
        let mut entry =
            entry.map_err(|e| CatalogError::Integrity(format!("tarball entry error: {e}")))?;

        let path = entry
            .path()
            .map_err(|e| CatalogError::Integrity(format!("tarball path error: {e}")))?
            .into_owned();

        if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
            return Err(CatalogError::Integrity(format!(
                "tarball contains unsafe path: {}",
                path.display()
            )));
        }

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(|e| CatalogError::Integrity(format!("tarball read error: {e}")))?;

        files.insert(normalize(&path), content);
    }

    Ok(files)
}

/// Validate one contract entry against the unpacked tarball, producing a
/// [`ResourceArtifact`] only when the content digest matches the contract.
pub fn validate(
    entry: ContractEntry,
    files: &BTreeMap<PathBuf, Vec<u8>>,
    source_repository: &str,
) -> Result<ResourceArtifact> {
    let path = Path::new(&entry.path);
    if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
        return Err(CatalogError::Integrity(format!(
            "resource {} declares a path outside the tarball root: {}",
            entry.name, entry.path
        )));
    }

    let content = files.get(&normalize(path)).ok_or_else(|| {
        CatalogError::Integrity(format!(
            "resource {} missing from tarball: {}",
            entry.name, entry.path
        ))
    })?;

    let actual = hex::encode(Sha256::digest(content));
    if actual != entry.checksum {
        return Err(CatalogError::ChecksumMismatch {
            name: entry.name,
            version: entry.version,
            expected: entry.checksum,
            actual,
        });
    }

    Ok(ResourceArtifact {
        entry,
        content: content.clone(),
        source_repository: source_repository.to_string(),
    })
}

// Lexically normalize a relative path so "./a/b" and "a/b" address the same
// archive member. Traversal components are rejected before this runs.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}
