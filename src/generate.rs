//! Filesystem generation for the partial catalog
//!
//! Projects a merged catalog onto a target directory, filtered to one
//! resource type. Layout per entry: `<type>/<name>/<version>/<file>`, plus
//! an `index.yaml` at the target root enumerating every written entry so
//! the downstream signing step can operate without re-deriving state.
//!
//! Every write goes through a temporary file in the destination directory
//! followed by a rename, so a failed run never leaves a half-written file
//! that could pass for a complete one. Catalog iteration order is sorted,
//! which makes re-running with an unchanged catalog byte-identical.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::core::error::{CatalogError, Result};

/// Index filename written at the target root.
pub const INDEX_NAME: &str = "index.yaml";

/// Index written at the target root, the contract consumed by the
/// signing step that follows generation.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogIndex {
    pub resources: Vec<IndexEntry>,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub version: String,
    pub checksum: String,
    /// Path of the written resource, relative to the target root.
    pub path: String,
}

/// Write the catalog entries of `resource_type` under `target`.
pub fn generate_filesystem(target: &Path, catalog: &Catalog, resource_type: &str) -> Result<()> {
    std::fs::create_dir_all(target)?;

    let mut rows = Vec::new();
    for (key, artifact) in catalog.of_type(resource_type) {
        let file_name = Path::new(&artifact.entry.path)
            .file_name()
            .ok_or_else(|| {
                CatalogError::Integrity(format!(
                    "resource {} has a path without a file name: {}",
                    key.name, artifact.entry.path
                ))
            })?;

        let relative = PathBuf::from(&key.resource_type)
            .join(&key.name)
            .join(&key.version)
            .join(file_name);
        let dest = target.join(&relative);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_atomic(&dest, &artifact.content)?;

        rows.push(IndexEntry {
            resource_type: key.resource_type.clone(),
            name: key.name.clone(),
            version: key.version.clone(),
            checksum: artifact.entry.checksum.clone(),
            path: relative.to_string_lossy().into_owned(),
        });
    }

    // Index last: it only ever describes resource files that are complete.
    let index = CatalogIndex { resources: rows };
    let body = serde_yaml::to_string(&index).map_err(std::io::Error::other)?;
    write_atomic(&target.join(INDEX_NAME), body.as_bytes())?;
    Ok(())
}

/// Write to a temporary file in the destination directory, then rename.
fn write_atomic(dest: &Path, content: &[u8]) -> Result<()> {
    let dir = dest
        .parent()
        .ok_or_else(|| std::io::Error::other(format!("no parent for {}", dest.display())))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.persist(dest).map_err(|e| CatalogError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{merge, RepositoryResources, ResourceArtifact};
    use crate::contract::ContractEntry;
    use sha2::{Digest, Sha256};
    use tempfile::tempdir;

    fn artifact(resource_type: &str, name: &str, version: &str, content: &[u8]) -> ResourceArtifact {
        ResourceArtifact {
            entry: ContractEntry {
                resource_type: resource_type.to_string(),
                name: name.to_string(),
                version: version.to_string(),
                checksum: hex::encode(Sha256::digest(content)),
                path: format!("{resource_type}/{name}/{name}.yaml"),
            },
            content: content.to_vec(),
            source_repository: "repo".to_string(),
        }
    }

    fn catalog_of(artifacts: Vec<ResourceArtifact>) -> Catalog {
        merge(vec![RepositoryResources {
            repository: "repo".to_string(),
            artifacts,
        }])
        .unwrap()
    }

    #[test]
    fn test_generate_writes_resource_and_index() {
        let target = tempdir().unwrap();
        let catalog = catalog_of(vec![artifact("tasks", "hello", "0.1.0", b"kind: Task\n")]);

        generate_filesystem(target.path(), &catalog, "tasks").unwrap();

        let resource = target.path().join("tasks/hello/0.1.0/hello.yaml");
        assert_eq!(std::fs::read(&resource).unwrap(), b"kind: Task\n");

        let index: CatalogIndex =
            serde_yaml::from_str(&std::fs::read_to_string(target.path().join(INDEX_NAME)).unwrap())
                .unwrap();
        assert_eq!(index.resources.len(), 1);
        assert_eq!(index.resources[0].name, "hello");
        assert_eq!(index.resources[0].path, "tasks/hello/0.1.0/hello.yaml");
    }

    #[test]
    fn test_generate_filters_by_type() {
        let target = tempdir().unwrap();
        let catalog = catalog_of(vec![
            artifact("tasks", "hello", "0.1.0", b"task"),
            artifact("pipelines", "release", "1.0.0", b"pipeline"),
        ]);

        generate_filesystem(target.path(), &catalog, "tasks").unwrap();

        assert!(target.path().join("tasks/hello/0.1.0/hello.yaml").exists());
        assert!(!target.path().join("pipelines").exists());

        let index: CatalogIndex =
            serde_yaml::from_str(&std::fs::read_to_string(target.path().join(INDEX_NAME)).unwrap())
                .unwrap();
        assert_eq!(index.resources.len(), 1);
        assert_eq!(index.resources[0].resource_type, "tasks");
    }

    #[test]
    fn test_generate_empty_filter_writes_empty_index() {
        let target = tempdir().unwrap();
        let catalog = catalog_of(vec![artifact("pipelines", "release", "1.0.0", b"p")]);

        generate_filesystem(target.path(), &catalog, "tasks").unwrap();

        let index: CatalogIndex =
            serde_yaml::from_str(&std::fs::read_to_string(target.path().join(INDEX_NAME)).unwrap())
                .unwrap();
        assert!(index.resources.is_empty());
    }

    #[test]
    fn test_generate_is_idempotent() {
        let target = tempdir().unwrap();
        let catalog = catalog_of(vec![
            artifact("tasks", "hello", "0.1.0", b"one"),
            artifact("tasks", "world", "0.2.0", b"two"),
        ]);

        generate_filesystem(target.path(), &catalog, "tasks").unwrap();
        let before = snapshot(target.path());
        generate_filesystem(target.path(), &catalog, "tasks").unwrap();
        let after = snapshot(target.path());

        assert_eq!(before, after);
    }

    #[test]
    fn test_generate_leaves_no_temporary_files() {
        let target = tempdir().unwrap();
        let catalog = catalog_of(vec![artifact("tasks", "hello", "0.1.0", b"content")]);

        generate_filesystem(target.path(), &catalog, "tasks").unwrap();

        for entry in walkdir::WalkDir::new(target.path()) {
            let entry = entry.unwrap();
            if entry.file_type().is_file() {
                let name = entry.file_name().to_string_lossy();
                assert!(
                    name == INDEX_NAME || name.ends_with(".yaml"),
                    "unexpected file left behind: {name}"
                );
            }
        }
    }

    #[test]
    fn test_generate_creates_missing_target() {
        let base = tempdir().unwrap();
        let target = base.path().join("nested/catalog");
        let catalog = catalog_of(vec![artifact("tasks", "hello", "0.1.0", b"content")]);

        generate_filesystem(&target, &catalog, "tasks").unwrap();
        assert!(target.join(INDEX_NAME).exists());
    }

    /// Path → content for every file under root.
    fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
            let entry = entry.unwrap();
            if entry.file_type().is_file() {
                files.push((
                    entry.path().strip_prefix(root).unwrap().to_path_buf(),
                    std::fs::read(entry.path()).unwrap(),
                ));
            }
        }
        files
    }
}
