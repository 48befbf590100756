//! Contract manifest parsing
//!
//! Each release attaches a YAML manifest enumerating the resources bundled
//! in its tarball, with a SHA-256 checksum per resource. Parsing is pure
//! (no I/O) and is the single place the manifest schema lives.
//!
//! ## Manifest format
//!
//! ```yaml
//! resources:
//!   - type: tasks          # optional, defaults to the requesting type
//!     name: hello-world
//!     version: 0.1.0
//!     checksum: 5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03
//!     path: tasks/hello-world/hello-world.yaml
//! ```

use serde::Deserialize;

use crate::core::error::{CatalogError, Result};

/// Default manifest artifact filename.
pub const FILENAME: &str = "catalog.yaml";

/// Default resource bundle artifact filename.
pub const RESOURCES_NAME: &str = "resources.tar.gz";

/// Hex length of a SHA-256 digest.
const CHECKSUM_HEX_LEN: usize = 64;

/// One resource row decoded from a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractEntry {
    pub resource_type: String,
    pub name: String,
    pub version: String,
    /// Lowercase SHA-256 hex digest of the resource content.
    pub checksum: String,
    /// Location of the resource inside the release tarball.
    pub path: String,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    resources: Vec<ManifestEntry>,
}

// Fields default to empty so a missing field reports as "empty", with the
// entry name attached, rather than as a bare serde error.
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    #[serde(rename = "type", default)]
    resource_type: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    checksum: String,
    #[serde(default)]
    path: String,
}

/// Decode a manifest into contract entries.
///
/// Entries that omit `type` inherit `default_type` (the classification the
/// requesting repository was declared with). Checksums are normalized to
/// lowercase; anything that is not a full-length hex digest is rejected.
pub fn parse(manifest: &[u8], default_type: &str) -> Result<Vec<ContractEntry>> {
    let decoded: Manifest = serde_yaml::from_slice(manifest)
        .map_err(|e| CatalogError::Format(format!("cannot decode manifest: {e}")))?;

    let mut entries = Vec::with_capacity(decoded.resources.len());
    for (index, raw) in decoded.resources.into_iter().enumerate() {
        let label = if raw.name.is_empty() {
            format!("resource #{}", index + 1)
        } else {
            format!("resource {}", raw.name)
        };

        if raw.name.is_empty() {
            return Err(CatalogError::Format(format!("{label} has no name")));
        }
        if raw.version.is_empty() {
            return Err(CatalogError::Format(format!("{label} has no version")));
        }
        if raw.path.is_empty() {
            return Err(CatalogError::Format(format!("{label} has no path")));
        }

        let checksum = raw.checksum.to_lowercase();
        if checksum.len() != CHECKSUM_HEX_LEN
            || !checksum.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(CatalogError::Format(format!(
                "{label} has an invalid checksum: expected a {CHECKSUM_HEX_LEN}-char hex digest, got \"{}\"",
                raw.checksum
            )));
        }

        let resource_type = match raw.resource_type {
            Some(t) if !t.is_empty() => t,
            _ => default_type.to_string(),
        };

        entries.push(ContractEntry {
            resource_type,
            name: raw.name,
            version: raw.version,
            checksum,
            path: raw.path,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA256_EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn manifest_with(entry_fields: &str) -> String {
        format!("resources:\n  - {}\n", entry_fields.replace('\n', "\n    "))
    }

    #[test]
    fn test_parse_complete_entry() {
        let yaml = manifest_with(&format!(
            "type: pipelines\nname: build\nversion: 1.0.0\nchecksum: {SHA256_EMPTY}\npath: pipelines/build.yaml"
        ));
        let entries = parse(yaml.as_bytes(), "tasks").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].resource_type, "pipelines");
        assert_eq!(entries[0].name, "build");
        assert_eq!(entries[0].version, "1.0.0");
        assert_eq!(entries[0].path, "pipelines/build.yaml");
    }

    #[test]
    fn test_parse_type_defaults_to_requested() {
        let yaml = manifest_with(&format!(
            "name: build\nversion: 1.0.0\nchecksum: {SHA256_EMPTY}\npath: p.yaml"
        ));
        let entries = parse(yaml.as_bytes(), "tasks").unwrap();
        assert_eq!(entries[0].resource_type, "tasks");
    }

    #[test]
    fn test_parse_checksum_normalized_to_lowercase() {
        let yaml = manifest_with(&format!(
            "name: build\nversion: 1.0.0\nchecksum: {}\npath: p.yaml",
            SHA256_EMPTY.to_uppercase()
        ));
        let entries = parse(yaml.as_bytes(), "tasks").unwrap();
        assert_eq!(entries[0].checksum, SHA256_EMPTY);
    }

    #[test]
    fn test_parse_empty_manifest_yields_no_entries() {
        let entries = parse(b"resources: []\n", "tasks").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_parse_rejects_undecodable_yaml() {
        let err = parse(b"resources: [unclosed", "tasks").unwrap_err();
        assert!(err.to_string().contains("cannot decode manifest"));
    }

    #[test]
    fn test_parse_rejects_missing_name() {
        let yaml = manifest_with(&format!(
            "version: 1.0.0\nchecksum: {SHA256_EMPTY}\npath: p.yaml"
        ));
        let err = parse(yaml.as_bytes(), "tasks").unwrap_err();
        assert!(err.to_string().contains("has no name"));
    }

    #[test]
    fn test_parse_rejects_missing_version() {
        let yaml = manifest_with(&format!("name: build\nchecksum: {SHA256_EMPTY}\npath: p.yaml"));
        let err = parse(yaml.as_bytes(), "tasks").unwrap_err();
        assert!(err.to_string().contains("resource build has no version"));
    }

    #[test]
    fn test_parse_rejects_missing_path() {
        let yaml = manifest_with(&format!("name: build\nversion: 1.0.0\nchecksum: {SHA256_EMPTY}"));
        let err = parse(yaml.as_bytes(), "tasks").unwrap_err();
        assert!(err.to_string().contains("has no path"));
    }

    #[test]
    fn test_parse_rejects_short_checksum() {
        let yaml = manifest_with("name: build\nversion: 1.0.0\nchecksum: abc123\npath: p.yaml");
        let err = parse(yaml.as_bytes(), "tasks").unwrap_err();
        assert!(err.to_string().contains("invalid checksum"));
    }

    #[test]
    fn test_parse_rejects_non_hex_checksum() {
        let bad = "z".repeat(64);
        let yaml = manifest_with(&format!(
            "name: build\nversion: 1.0.0\nchecksum: {bad}\npath: p.yaml"
        ));
        let err = parse(yaml.as_bytes(), "tasks").unwrap_err();
        assert!(err.to_string().contains("invalid checksum"));
    }
}
