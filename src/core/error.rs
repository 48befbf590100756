//! Engine error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur while assembling a catalog.
///
/// Every error is fatal to the run: a catalog silently missing an entry is
/// indistinguishable from one that never needed it, which is unacceptable
/// for an artifact that will be signed downstream.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("invalid repository spec: {0}")]
    Config(String),

    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("rate limit exceeded for {url} (set GITHUB_TOKEN or retry later)")]
    RateLimit { url: String },

    #[error("malformed contract: {0}")]
    Format(String),

    #[error("tarball integrity error: {0}")]
    Integrity(String),

    #[error("checksum mismatch for {name} {version}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        version: String,
        expected: String,
        actual: String,
    },

    #[error("duplicate resource {key}: provided by both {first} and {second}")]
    Collision {
        key: String,
        first: String,
        second: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("repository {repository}: {source}")]
    Repository {
        repository: String,
        #[source]
        source: Box<CatalogError>,
    },
}

impl CatalogError {
    /// Attach the repository this error came from, so the caller can tell
    /// which of the configured repositories failed. Already-attributed
    /// errors pass through unchanged.
    pub fn in_repository(self, repository: &str) -> Self {
        match self {
            CatalogError::Repository { .. } => self,
            other => CatalogError::Repository {
                repository: repository.to_string(),
                source: Box::new(other),
            },
        }
    }
}
