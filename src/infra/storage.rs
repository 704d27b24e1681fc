//! Filesystem-backed blob store for rendered cards.
//!
//! Paths are content-addressed by the caller, so writes are plain overwrites
//! and never need coordination: two concurrent publishes of the same
//! (entity, hash) pair write identical bytes to the identical path. Public
//! URLs are derived from configuration alone; the CDN or reverse proxy in
//! front of the storage root serves the files.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use url::Url;

use crate::application::repos::{BlobStore, BlobStoreError};

#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base: Url,
}

impl FsBlobStore {
    /// Initialise storage rooted at the provided directory, creating it if
    /// necessary.
    pub fn new(root: PathBuf, public_base: Url) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root, public_base })
    }

    /// Resolve the absolute filesystem path for a blob, rejecting anything
    /// that would escape the storage root.
    fn resolve(&self, path: &str) -> Result<PathBuf, BlobStoreError> {
        let relative = Path::new(path);
        if relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(BlobStoreError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }

    /// Read a stored blob back. Used by tests and the occasional manual
    /// inspection path; the serving path goes through `public_url`.
    pub async fn read(&self, path: &str) -> Result<Bytes, BlobStoreError> {
        let absolute = self.resolve(path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(
        &self,
        path: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), BlobStoreError> {
        let absolute = self.resolve(path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&absolute, &bytes).await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        let base = self.public_base.as_str().trim_end_matches('/');
        format!("{base}/{path}")
    }
}
