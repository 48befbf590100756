//! Shared fixtures for the end-to-end tests.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Hex SHA-256 of a byte slice.
pub fn sha256_hex(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Build a gzipped tarball from (path, content) pairs.
pub fn tarball_of(members: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (member_path, content) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, member_path, *content).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Build a contract manifest for (name, version, checksum, path) rows.
pub fn manifest_of(rows: &[(&str, &str, &str, &str)]) -> Vec<u8> {
    let mut yaml = String::from("resources:\n");
    for (name, version, checksum, member_path) in rows {
        yaml.push_str(&format!(
            "  - name: {name}\n    version: \"{version}\"\n    checksum: {checksum}\n    path: {member_path}\n"
        ));
    }
    yaml.into_bytes()
}

/// Mount the release-listing endpoint for a repository.
pub async fn mount_release_listing(server: &MockServer, slug: &str, tags: &[&str]) {
    let body: Vec<_> = tags.iter().map(|t| json!({"tag_name": t})).collect();
    Mock::given(method("GET"))
        .and(path(format!("/repos/{slug}/releases")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(body)))
        .mount(server)
        .await;
}

/// Mount one release with its downloadable assets.
pub async fn mount_release(server: &MockServer, slug: &str, tag: &str, assets: &[(&str, Vec<u8>)]) {
    let descriptors: Vec<_> = assets
        .iter()
        .map(|(name, _)| {
            json!({
                "name": name,
                "url": format!("{}/assets/{slug}/{tag}/{name}", server.uri()),
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/repos/{slug}/releases/tags/{tag}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"tag_name": tag, "assets": descriptors})),
        )
        .mount(server)
        .await;

    for (name, bytes) in assets {
        Mock::given(method("GET"))
            .and(path(format!("/assets/{slug}/{tag}/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.clone()))
            .mount(server)
            .await;
    }
}

/// Path → content for every file under root, sorted by path.
pub fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
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
