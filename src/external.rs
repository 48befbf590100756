//! Declarative configuration for external repositories
//!
//! An [`ExternalSpec`] lists the repositories whose releases feed the
//! catalog. Raw string inputs (comma-separated ignore lists, URLs) are
//! parsed here, at the boundary, so the engine never reasons about
//! free-form strings internally.
//!
//! ## Example config file
//!
//! ```yaml
//! repositories:
//!   - name: task-containers
//!     url: https://github.com/openshift-pipelines/task-containers
//!     type: tasks
//!     ignore-versions: ["v0.1.0"]
//! ```

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

use crate::contract;
use crate::core::error::{CatalogError, Result};

/// One external repository to pull releases from.
///
/// `catalog_name` and `resources_tarball_name` default to the contract
/// artifact names every release is expected to attach.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositorySpec {
    /// Display name; derived from the last URL segment when empty.
    #[serde(default)]
    pub name: String,

    /// Source location, e.g. "https://github.com/owner/repo".
    pub url: String,

    /// Resource classification applied to contract entries that omit one.
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Exact release tags to skip. String equality, not version ranges.
    #[serde(default)]
    pub ignore_versions: BTreeSet<String>,

    /// Manifest artifact filename attached to each release.
    #[serde(default = "default_catalog_name")]
    pub catalog_name: String,

    /// Resource bundle filename attached to each release.
    #[serde(default = "default_resources_tarball_name")]
    pub resources_tarball_name: String,
}

fn default_catalog_name() -> String {
    contract::FILENAME.to_string()
}

fn default_resources_tarball_name() -> String {
    contract::RESOURCES_NAME.to_string()
}

impl RepositorySpec {
    pub fn new(url: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            url: url.into(),
            resource_type: resource_type.into(),
            ignore_versions: BTreeSet::new(),
            catalog_name: default_catalog_name(),
            resources_tarball_name: default_resources_tarball_name(),
        }
    }

    /// Name used in output and error attribution.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            url_base(&self.url)
        } else {
            &self.name
        }
    }

    /// The "owner/repo" pair the hosting API addresses this repository by.
    pub fn api_slug(&self) -> Result<String> {
        let trimmed = self.url.trim_end_matches('/');
        let without_scheme = trimmed
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(trimmed);
        let segments: Vec<&str> = without_scheme.split('/').filter(|s| !s.is_empty()).collect();
        // host/owner/repo at minimum
        if segments.len() < 3 {
            return Err(CatalogError::Config(format!(
                "cannot derive owner/repo from url: {}",
                self.url
            )));
        }
        let owner = segments[segments.len() - 2];
        let repo = segments[segments.len() - 1].trim_end_matches(".git");
        Ok(format!("{owner}/{repo}"))
    }

    /// Assert the spec is complete enough to fetch from.
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(CatalogError::Config("repository url is required".to_string()));
        }
        if self.resource_type.is_empty() {
            return Err(CatalogError::Config(format!(
                "repository {} has no resource type",
                self.display_name()
            )));
        }
        if self.catalog_name.is_empty() || self.resources_tarball_name.is_empty() {
            return Err(CatalogError::Config(format!(
                "repository {} has empty artifact names",
                self.display_name()
            )));
        }
        self.api_slug()?;
        Ok(())
    }
}

fn url_base(url: &str) -> &str {
    url.trim_end_matches('/')
        .rsplit('/')
        .find(|s| !s.is_empty())
        .map(|s| s.trim_end_matches(".git"))
        .unwrap_or("repository")
}

/// Ordered list of external repositories. Declaration order is identity:
/// duplicates are not rejected here, they surface later as merge collisions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalSpec {
    #[serde(default)]
    pub repositories: Vec<RepositorySpec>,
}

impl ExternalSpec {
    /// Load an externals config from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_yaml::from_slice(&bytes).map_err(|e| {
            CatalogError::Config(format!("cannot parse {}: {}", path.display(), e))
        })
    }
}

/// Split a comma-separated ignore list into exact tags.
/// Empty segments are dropped, so trailing commas are harmless.
pub fn parse_ignore_versions(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
