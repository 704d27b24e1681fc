//! Domain entities mirrored from persistent storage.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::CardKind;

/// One row of the preview metadata store: a pointer from a cache key to the
/// blob that was last published for it, plus the fingerprint of the data the
/// blob was rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewEntry {
    pub kind: CardKind,
    pub entity_id: String,
    pub cache_key: String,
    pub storage_path: String,
    pub data_hash: String,
    pub expires_at: OffsetDateTime,
}

impl PreviewEntry {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

/// Card-relevant slice of a product, as loaded from the marketplace data
/// source. Joined fields are nullable there and stay optional here.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCard {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub price_cents: i64,
    pub currency: String,
    pub rating: Option<f64>,
    pub review_count: i64,
    pub business_name: Option<String>,
}

/// Card-relevant slice of a crowdfunding fund.
///
/// Carries the raw amounts; the bucketed percentage is derived when the
/// payload is assembled so the raw `current_amount_cents` never reaches the
/// fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct FundCard {
    pub id: Uuid,
    pub title: String,
    pub cover_url: Option<String>,
    pub current_amount_cents: i64,
    pub target_amount_cents: i64,
    pub currency: String,
    pub owner_name: Option<String>,
}

/// Card-relevant slice of a business storefront.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessCard {
    pub id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
    pub tagline: Option<String>,
    pub rating: Option<f64>,
    pub product_count: i64,
}

/// Card-relevant slice of an admin invite link.
#[derive(Debug, Clone, PartialEq)]
pub struct InviteCard {
    pub code: String,
    pub business_name: Option<String>,
    pub role: String,
}
