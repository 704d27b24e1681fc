//! The preview cache orchestrator.
//!
//! Per request: build the cache key, look the key up, compare the stored
//! fingerprint against the current entity state, and either redirect to the
//! existing blob or render/publish a fresh one. All coordination between
//! concurrent requests happens through the metadata store's upsert semantics;
//! the service itself holds no mutable state.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::{counter, histogram};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::repos::{BlobStore, CardSourceRepo, PreviewCacheRepo, RepoError};
use crate::domain::entities::PreviewEntry;
use crate::domain::keys::{cache_key, storage_path};
use crate::domain::payload::{CardPayload, fingerprint};
use crate::domain::progress::progress_bucket;
use crate::domain::types::CardKind;

pub const METRIC_PREVIEW_HIT: &str = "cartolina_preview_hit_total";
pub const METRIC_PREVIEW_MISS: &str = "cartolina_preview_miss_total";
pub const METRIC_PREVIEW_STALE: &str = "cartolina_preview_stale_total";
pub const METRIC_PREVIEW_REFRESH: &str = "cartolina_preview_refresh_total";
pub const METRIC_PREVIEW_READ_ERROR: &str = "cartolina_preview_read_error_total";
pub const METRIC_RENDER_FAILURE: &str = "cartolina_render_failure_total";
pub const METRIC_RENDER_MS: &str = "cartolina_render_ms";

pub const CARD_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render transport failed")]
    Transport {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("compositor returned status {status}")]
    Upstream { status: u16 },
    #[error("compositor returned bytes that do not decode as an image")]
    MalformedImage,
}

/// The external render collaborator: a payload in, image bytes out.
/// Opaque to the cache protocol.
#[async_trait]
pub trait CardRenderer: Send + Sync {
    async fn render(&self, payload: &CardPayload) -> Result<Bytes, RenderError>;
}

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("no `{kind}` entity matches the requested identifier")]
    UnknownEntity { kind: CardKind },
    #[error("card data source failed")]
    Source(#[from] RepoError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What the responder should do with a resolved request.
#[derive(Debug, Clone)]
pub enum PreviewOutcome {
    /// Redirect to a cached or freshly published blob.
    Redirect { url: String },
    /// Uncached direct serve: the render succeeded but the blob store write
    /// did not, so the bytes go out once without being recorded.
    Direct { bytes: Bytes },
}

pub struct PreviewService {
    cache: Arc<dyn PreviewCacheRepo>,
    cards: Arc<dyn CardSourceRepo>,
    renderer: Arc<dyn CardRenderer>,
    blobs: Arc<dyn BlobStore>,
    retention: Duration,
}

impl PreviewService {
    pub fn new(
        cache: Arc<dyn PreviewCacheRepo>,
        cards: Arc<dyn CardSourceRepo>,
        renderer: Arc<dyn CardRenderer>,
        blobs: Arc<dyn BlobStore>,
        retention: std::time::Duration,
    ) -> Self {
        Self {
            cache,
            cards,
            renderer,
            blobs,
            retention: Duration::seconds_f64(retention.as_secs_f64()),
        }
    }

    pub async fn product_card(
        &self,
        id: Uuid,
        refresh: bool,
    ) -> Result<PreviewOutcome, PreviewError> {
        let kind = CardKind::Product;
        let card = self
            .cards
            .product_card(id)
            .await?
            .ok_or(PreviewError::UnknownEntity { kind })?;
        let payload = CardPayload::product(&card);
        self.resolve(kind, &id.to_string(), None, payload, refresh)
            .await
    }

    pub async fn fund_card(&self, id: Uuid, refresh: bool) -> Result<PreviewOutcome, PreviewError> {
        let kind = CardKind::Fund;
        let card = self
            .cards
            .fund_card(id)
            .await?
            .ok_or(PreviewError::UnknownEntity { kind })?;
        let bucket = progress_bucket(card.current_amount_cents, card.target_amount_cents);
        let payload = CardPayload::fund(&card, bucket);
        self.resolve(kind, &id.to_string(), Some(bucket), payload, refresh)
            .await
    }

    pub async fn business_card(
        &self,
        id: Uuid,
        refresh: bool,
    ) -> Result<PreviewOutcome, PreviewError> {
        let kind = CardKind::Business;
        let card = self
            .cards
            .business_card(id)
            .await?
            .ok_or(PreviewError::UnknownEntity { kind })?;
        let payload = CardPayload::business(&card);
        self.resolve(kind, &id.to_string(), None, payload, refresh)
            .await
    }

    pub async fn invite_card(
        &self,
        code: &str,
        refresh: bool,
    ) -> Result<PreviewOutcome, PreviewError> {
        let kind = CardKind::AdminInvite;
        let card = self
            .cards
            .invite_card(code)
            .await?
            .ok_or(PreviewError::UnknownEntity { kind })?;
        let payload = CardPayload::admin_invite(&card);
        self.resolve(kind, code, None, payload, refresh).await
    }

    /// LOOKUP → HIT / STALE / MISS → RENDER → PUBLISH → RESPOND.
    async fn resolve(
        &self,
        kind: CardKind,
        entity_id: &str,
        bucket: Option<u8>,
        payload: CardPayload,
        refresh: bool,
    ) -> Result<PreviewOutcome, PreviewError> {
        let cache_key = cache_key(kind, entity_id, bucket);
        let data_hash = fingerprint(&payload);
        let now = OffsetDateTime::now_utc();

        if refresh {
            counter!(METRIC_PREVIEW_REFRESH, "kind" => kind.as_str()).increment(1);
        } else {
            match self.cache.lookup(&cache_key).await {
                Ok(Some(entry)) if !entry.is_expired(now) && entry.data_hash == data_hash => {
                    counter!(METRIC_PREVIEW_HIT, "kind" => kind.as_str()).increment(1);
                    return Ok(PreviewOutcome::Redirect {
                        url: self.blobs.public_url(&entry.storage_path),
                    });
                }
                Ok(Some(entry)) if !entry.is_expired(now) => {
                    counter!(METRIC_PREVIEW_STALE, "kind" => kind.as_str()).increment(1);
                }
                Ok(_) => {
                    // No row, or the row aged past its retention window.
                    counter!(METRIC_PREVIEW_MISS, "kind" => kind.as_str()).increment(1);
                }
                Err(err) => {
                    // Fail open toward a miss: a re-render is correct, if
                    // slower; serving a row we could not verify is not.
                    counter!(METRIC_PREVIEW_READ_ERROR, "kind" => kind.as_str()).increment(1);
                    warn!(
                        target = "cartolina::preview",
                        cache_key = %cache_key,
                        error = %err,
                        "metadata lookup failed, treating as miss"
                    );
                }
            }
        }

        let render_started_at = Instant::now();
        let bytes = match self.renderer.render(&payload).await {
            Ok(bytes) => bytes,
            Err(err) => {
                counter!(METRIC_RENDER_FAILURE, "kind" => kind.as_str()).increment(1);
                return Err(err.into());
            }
        };
        histogram!(METRIC_RENDER_MS, "kind" => kind.as_str())
            .record(render_started_at.elapsed().as_secs_f64() * 1000.0);

        let path = storage_path(kind, entity_id, &data_hash);
        if let Err(err) = self
            .blobs
            .put(&path, bytes.clone(), CARD_CONTENT_TYPE)
            .await
        {
            // The render already succeeded; degrade to an uncached serve and
            // leave the metadata untouched so nothing points at a blob that
            // was never written.
            error!(
                target = "cartolina::preview",
                storage_path = %path,
                error = %err,
                "blob upload failed, serving render directly"
            );
            return Ok(PreviewOutcome::Direct { bytes });
        }

        let entry = PreviewEntry {
            kind,
            entity_id: entity_id.to_string(),
            cache_key,
            storage_path: path.clone(),
            data_hash,
            expires_at: now + self.retention,
        };
        if let Err(err) = self.cache.upsert(&entry).await {
            // Non-fatal: the blob is live, the URL is valid, and the worst
            // case is one duplicate render by the next caller.
            error!(
                target = "cartolina::preview",
                cache_key = %entry.cache_key,
                error = %err,
                "metadata upsert failed after publish"
            );
        }

        Ok(PreviewOutcome::Redirect {
            url: self.blobs.public_url(&path),
        })
    }
}
