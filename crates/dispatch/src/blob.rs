// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object-store seam.
//!
//! Client configuration (S3 endpoints, credentials) is deployment
//! plumbing; the dispatcher only needs these operations. [`FsBlobStore`]
//! is a directory-backed implementation used for local development and
//! tests.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload_file(
        &self,
        file_path: &Path,
        key: &str,
        content_type: Option<&str>,
    ) -> Result<(), BlobError>;

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), BlobError>;

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, BlobError>;

    async fn download_file(&self, key: &str, destination: &Path) -> Result<(), BlobError>;

    /// Download every object under `prefix` into `destination_dir`,
    /// keeping relative paths.
    async fn download_prefix(&self, prefix: &str, destination_dir: &Path)
        -> Result<usize, BlobError>;

    /// Keys under a prefix (relative order unspecified).
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, BlobError>;
}

/// Reject traversal and absolute segments in object keys; they become
/// filesystem paths in [`FsBlobStore`] and download destinations.
pub fn validate_key(key: &str) -> Result<&str, BlobError> {
    let trimmed = key.trim();
    if trimmed.is_empty() || trimmed.starts_with('/') {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(_) => {}
            _ => return Err(BlobError::InvalidKey(key.to_string())),
        }
    }
    Ok(trimmed)
}

/// Directory-backed object store.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, BlobError> {
        Ok(self.root.join(validate_key(key)?))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload_file(
        &self,
        file_path: &Path,
        key: &str,
        _content_type: Option<&str>,
    ) -> Result<(), BlobError> {
        let target = self.object_path(key)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(file_path, &target).await?;
        Ok(())
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<(), BlobError> {
        let target = self.object_path(key)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, body).await?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, BlobError> {
        let path = self.object_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn download_file(&self, key: &str, destination: &Path) -> Result<(), BlobError> {
        let source = self.object_path(key)?;
        if !source.is_file() {
            return Err(BlobError::NotFound(key.to_string()));
        }
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&source, destination).await?;
        Ok(())
    }

    async fn download_prefix(
        &self,
        prefix: &str,
        destination_dir: &Path,
    ) -> Result<usize, BlobError> {
        let keys = self.list_prefix(prefix).await?;
        let normalized = validate_key(prefix)?.trim_end_matches('/').to_string();
        let mut downloaded = 0usize;
        for key in keys {
            let rel = key
                .strip_prefix(&normalized)
                .map(|r| r.trim_start_matches('/'))
                .unwrap_or(&key)
                .to_string();
            if rel.is_empty() {
                continue;
            }
            let destination = destination_dir.join(&rel);
            self.download_file(&key, &destination).await?;
            downloaded += 1;
        }
        Ok(downloaded)
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, BlobError> {
        let normalized = validate_key(prefix)?.trim_end_matches('/').to_string();
        let base = self.root.join(&normalized);
        if !base.exists() {
            return Ok(Vec::new());
        }

        let root = self.root.clone();
        let mut keys = Vec::new();
        let mut stack = vec![base];
        while let Some(dir) = stack.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_symlink() {
                    continue;
                }
                if file_type.is_dir() {
                    stack.push(path);
                } else if file_type.is_file() {
                    if let Ok(rel) = path.strip_prefix(&root) {
                        keys.push(rel.to_string_lossy().replace('\\', "/"));
                    }
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
#[path = "blob_tests.rs"]
mod tests;
