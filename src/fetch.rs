//! Concurrent fetch-and-assemble engine
//!
//! Repositories are fetched on a bounded pool of workers feeding results
//! through a channel to a single collector; the merge runs single-threaded
//! once every repository has completed or failed, since a collision check
//! against a partial set could be a false negative. The first failure sets
//! a shared cancellation flag that every worker checks before each network
//! call, so in-flight work drains out instead of completing uselessly.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use crate::catalog::{self, Catalog, RepositoryResources};
use crate::client::{GithubClient, ReleaseRef};
use crate::contract;
use crate::core::error::{CatalogError, Result};
use crate::external::{ExternalSpec, RepositorySpec};
use crate::tarball;

/// Upper bound on parallel repository fetches; kept low to stay polite
/// toward upstream rate limits.
const MAX_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub concurrency: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            concurrency: num_cpus::get().min(MAX_CONCURRENCY),
        }
    }
}

/// Cooperative cancellation flag shared by the fetch workers.
pub struct CancelToken(AtomicBool);

impl CancelToken {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop releases whose tag exactly matches the ignore set.
///
/// Upstream order is preserved and duplicates are not collapsed here; a
/// duplicate tag is an upstream anomaly that must surface as a merge
/// collision rather than vanish silently.
pub fn select_releases(releases: Vec<ReleaseRef>, ignore: &BTreeSet<String>) -> Vec<ReleaseRef> {
    releases
        .into_iter()
        .filter(|release| !ignore.contains(&release.tag))
        .collect()
}

/// Fetch every configured repository and merge the results into one catalog.
pub fn fetch_from_externals(external: &ExternalSpec, client: &GithubClient) -> Result<Catalog> {
    fetch_from_externals_with(external, client, &FetchOptions::default())
}

pub fn fetch_from_externals_with(
    external: &ExternalSpec,
    client: &GithubClient,
    options: &FetchOptions,
) -> Result<Catalog> {
    for repo in &external.repositories {
        repo.validate()
            .map_err(|e| e.in_repository(repo.display_name()))?;
    }

    let repos = &external.repositories;
    if repos.is_empty() {
        return Ok(Catalog::default());
    }

    let workers = options.concurrency.clamp(1, repos.len());
    let cancel = CancelToken::new();
    let next = AtomicUsize::new(0);
    let mut slots: Vec<Option<RepositoryResources>> = Vec::with_capacity(repos.len());
    slots.resize_with(repos.len(), || None);
    let mut first_error: Option<CatalogError> = None;

    thread::scope(|scope| {
        let (tx, rx) = mpsc::channel();
        for _ in 0..workers {
            let tx = tx.clone();
            let cancel = &cancel;
            let next = &next;
            scope.spawn(move || {
                loop {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    if index >= repos.len() || cancel.is_set() {
                        break;
                    }
                    let repo = &repos[index];
                    let result = fetch_repository(repo, client, cancel)
                        .map_err(|e| e.in_repository(repo.display_name()));
                    if result.is_err() {
                        cancel.set();
                    }
                    if tx.send((index, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        for (index, result) in rx {
            match result {
                Ok(Some(resources)) => slots[index] = Some(resources),
                // Cancelled before completing; its partial work is discarded.
                Ok(None) => {}
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
    });

    if let Some(err) = first_error {
        return Err(err);
    }

    // Declaration order survives the parallel fetch: slots are indexed.
    let per_repository: Vec<RepositoryResources> = slots.into_iter().flatten().collect();
    catalog::merge(per_repository)
}

/// Fetch one repository's retained releases, validating every contract
/// entry against the release tarball. Returns Ok(None) when cancelled.
fn fetch_repository(
    repo: &RepositorySpec,
    client: &GithubClient,
    cancel: &CancelToken,
) -> Result<Option<RepositoryResources>> {
    if cancel.is_set() {
        return Ok(None);
    }
    let releases = client.list_releases(repo)?;
    let retained = select_releases(releases, &repo.ignore_versions);

    let mut artifacts = Vec::new();
    for release in &retained {
        if cancel.is_set() {
            return Ok(None);
        }
        let manifest = client.download_asset(repo, &release.tag, &repo.catalog_name)?;
        let entries = contract::parse(&manifest, &repo.resource_type)?;

        if cancel.is_set() {
            return Ok(None);
        }
        let bundle = client.download_asset(repo, &release.tag, &repo.resources_tarball_name)?;
        let files = tarball::unpack(&bundle)?;
        for entry in entries {
            artifacts.push(tarball::validate(entry, &files, repo.display_name())?);
        }
    }

    Ok(Some(RepositoryResources {
        repository: repo.display_name().to_string(),
        artifacts,
    }))
}
