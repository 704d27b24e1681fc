//! Traits describing persistence adapters: the preview metadata store, the
//! marketplace data source, and the blob store.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{BusinessCard, FundCard, InviteCard, PreviewEntry, ProductCard};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Metadata rows for published preview blobs, keyed on `cache_key`.
///
/// `upsert` has last-writer-wins semantics; concurrent writers for the same
/// key carry equivalent values (same entity state hashes to the same row),
/// so no coordination beyond the conflict clause is needed.
#[async_trait]
pub trait PreviewCacheRepo: Send + Sync {
    async fn lookup(&self, cache_key: &str) -> Result<Option<PreviewEntry>, RepoError>;
    async fn upsert(&self, entry: &PreviewEntry) -> Result<(), RepoError>;
}

/// Read-only view onto the marketplace database: the slice of each entity
/// that a preview card displays, including joined and aggregated fields.
#[async_trait]
pub trait CardSourceRepo: Send + Sync {
    async fn product_card(&self, id: Uuid) -> Result<Option<ProductCard>, RepoError>;
    async fn fund_card(&self, id: Uuid) -> Result<Option<FundCard>, RepoError>;
    async fn business_card(&self, id: Uuid) -> Result<Option<BusinessCard>, RepoError>;
    async fn invite_card(&self, code: &str) -> Result<Option<InviteCard>, RepoError>;
}

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("invalid blob path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Immutable blob storage for rendered cards.
///
/// Paths are content-addressed by the caller, so `put` may overwrite freely:
/// a second write to the same path carries identical bytes. `public_url` is
/// a pure path mapping with no network round-trip.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str)
    -> Result<(), BlobStoreError>;
    fn public_url(&self, path: &str) -> String;
}
