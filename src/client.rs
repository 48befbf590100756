//! GitHub REST client for release listings and asset downloads
//!
//! The client is an explicit dependency constructed per engine invocation,
//! never process-global state, so the engine can run against any base URL
//! (the mock-server tests rely on this). It performs no retries and no
//! caching; rate-limit responses are surfaced as their own error so the
//! caller can decide whether to back off and re-invoke the run.

use serde::Deserialize;
use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

use crate::core::error::{CatalogError, Result};
use crate::external::RepositorySpec;

/// Default GitHub API base URL
const GITHUB_API_BASE: &str = "https://api.github.com";

/// Default HTTP timeout in seconds
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Releases fetched per listing page
const RELEASES_PER_PAGE: usize = 100;

const USER_AGENT: &str = concat!("catalog-assembler/", env!("CARGO_PKG_VERSION"));

/// Get HTTP timeout from environment variable or use default.
/// Cached for performance (only reads env var once).
fn http_timeout() -> Duration {
    static TIMEOUT: OnceLock<Duration> = OnceLock::new();
    *TIMEOUT.get_or_init(|| {
        let secs = std::env::var("CATALOG_HTTP_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        // Clamp to reasonable range (5-300 seconds)
        Duration::from_secs(secs.clamp(5, 300))
    })
}

/// One discovered release, in the order the hosting API reported it
/// (newest first, per upstream convention).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRef {
    pub tag: String,
}

#[derive(Debug, Deserialize)]
struct ReleasePayload {
    tag_name: String,
    #[serde(default)]
    assets: Vec<AssetPayload>,
}

#[derive(Debug, Deserialize)]
struct AssetPayload {
    name: String,
    url: String,
}

/// Client for a GitHub-style hosting API.
pub struct GithubClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl GithubClient {
    /// Client against api.github.com, authenticating with GITHUB_TOKEN
    /// when the variable is set.
    pub fn new() -> Self {
        Self::with_base(GITHUB_API_BASE).with_token(std::env::var("GITHUB_TOKEN").ok())
    }

    /// Client against an alternative base URL (unauthenticated).
    pub fn with_base(base_url: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(http_timeout()).build(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// List every release of a repository, following pagination until the
    /// upstream runs out of pages.
    pub fn list_releases(&self, repo: &RepositorySpec) -> Result<Vec<ReleaseRef>> {
        let slug = repo.api_slug()?;
        let mut releases = Vec::new();
        let mut page = 1;
        loop {
            let url = format!(
                "{}/repos/{}/releases?per_page={}&page={}",
                self.base_url, slug, RELEASES_PER_PAGE, page
            );
            let response = self
                .request(&url)
                .set("Accept", "application/vnd.github+json")
                .call()
                .map_err(|e| self.map_error(&url, &format!("repository {slug}"), e))?;

            let batch: Vec<ReleasePayload> = response.into_json().map_err(|e| {
                CatalogError::Network {
                    url: url.clone(),
                    reason: format!("invalid release listing: {e}"),
                }
            })?;

            let fetched = batch.len();
            releases.extend(batch.into_iter().map(|r| ReleaseRef { tag: r.tag_name }));
            if fetched < RELEASES_PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(releases)
    }

    /// Download a named asset from one release.
    pub fn download_asset(
        &self,
        repo: &RepositorySpec,
        tag: &str,
        filename: &str,
    ) -> Result<Vec<u8>> {
        let slug = repo.api_slug()?;
        let url = format!("{}/repos/{}/releases/tags/{}", self.base_url, slug, tag);
        let release: ReleasePayload = self
            .request(&url)
            .set("Accept", "application/vnd.github+json")
            .call()
            .map_err(|e| self.map_error(&url, &format!("release {tag} of {slug}"), e))?
            .into_json()
            .map_err(|e| CatalogError::Network {
                url: url.clone(),
                reason: format!("invalid release body: {e}"),
            })?;

        let asset = release
            .assets
            .iter()
            .find(|a| a.name == filename)
            .ok_or_else(|| {
                CatalogError::NotFound(format!("asset {filename} in release {tag} of {slug}"))
            })?;

        let response = self
            .request(&asset.url)
            .set("Accept", "application/octet-stream")
            .call()
            .map_err(|e| self.map_error(&asset.url, &format!("asset {filename}"), e))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| CatalogError::Network {
                url: asset.url.clone(),
                reason: format!("read error: {e}"),
            })?;
        Ok(bytes)
    }

    fn request(&self, url: &str) -> ureq::Request {
        let mut request = self.agent.get(url).set("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        request
    }

    fn map_error(&self, url: &str, what: &str, err: ureq::Error) -> CatalogError {
        match err {
            ureq::Error::Status(403, _) | ureq::Error::Status(429, _) => CatalogError::RateLimit {
                url: url.to_string(),
            },
            ureq::Error::Status(404, _) => CatalogError::NotFound(what.to_string()),
            other => CatalogError::Network {
                url: url.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}
