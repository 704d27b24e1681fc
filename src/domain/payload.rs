//! Render payloads and their persisted fingerprint.
//!
//! A `CardPayload` is the exact set of entity fields that affect rendered
//! pixels, in a shape whose field order is fixed by the struct definitions.
//! It is assembled fresh per request, handed to the compositor, and hashed
//! for change detection; it is never stored.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::entities::{BusinessCard, FundCard, InviteCard, ProductCard};

/// Hex characters kept from the SHA-256 digest. 64 bits is far beyond what
/// change detection needs and keeps storage paths readable.
const FINGERPRINT_LEN: usize = 16;

/// Everything the compositor needs to draw one card.
///
/// Optional fields serialize as `null`, which fingerprints distinctly from an
/// empty string; "no business attached" and "business with an empty name"
/// are different cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CardPayload {
    Product {
        name: String,
        image_url: Option<String>,
        price_cents: i64,
        currency: String,
        rating: Option<f64>,
        review_count: i64,
        business_name: Option<String>,
    },
    Fund {
        title: String,
        cover_url: Option<String>,
        progress_percent: u8,
        target_cents: i64,
        currency: String,
        owner_name: Option<String>,
    },
    Business {
        name: String,
        logo_url: Option<String>,
        tagline: Option<String>,
        rating: Option<f64>,
        product_count: i64,
    },
    AdminInvite {
        code: String,
        business_name: Option<String>,
        role: String,
    },
}

impl CardPayload {
    pub fn product(card: &ProductCard) -> Self {
        Self::Product {
            name: card.name.clone(),
            image_url: card.image_url.clone(),
            price_cents: card.price_cents,
            currency: card.currency.clone(),
            rating: round_rating(card.rating),
            review_count: card.review_count,
            business_name: card.business_name.clone(),
        }
    }

    /// The caller supplies the already-bucketed progress; the raw current
    /// amount must not reach the fingerprint.
    pub fn fund(card: &FundCard, progress_percent: u8) -> Self {
        Self::Fund {
            title: card.title.clone(),
            cover_url: card.cover_url.clone(),
            progress_percent,
            target_cents: card.target_amount_cents,
            currency: card.currency.clone(),
            owner_name: card.owner_name.clone(),
        }
    }

    pub fn business(card: &BusinessCard) -> Self {
        Self::Business {
            name: card.name.clone(),
            logo_url: card.logo_url.clone(),
            tagline: card.tagline.clone(),
            rating: round_rating(card.rating),
            product_count: card.product_count,
        }
    }

    pub fn admin_invite(card: &InviteCard) -> Self {
        Self::AdminInvite {
            code: card.code.clone(),
            business_name: card.business_name.clone(),
            role: card.role.clone(),
        }
    }
}

/// Stable fingerprint of a payload, used as the persisted `data_hash`.
///
/// SHA-256 over the canonical JSON serialization, hex-encoded and truncated.
/// Deterministic across processes and releases; infallible for any payload
/// this crate can construct.
pub fn fingerprint(payload: &CardPayload) -> String {
    let canonical = serde_json::to_vec(payload).expect("card payload serializes to JSON");
    let digest = Sha256::digest(&canonical);
    let mut encoded = hex::encode(digest);
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}

/// Displayed ratings carry one decimal; rounding here keeps float jitter in
/// the SQL average from churning the fingerprint.
fn round_rating(rating: Option<f64>) -> Option<f64> {
    rating.map(|value| (value * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> CardPayload {
        CardPayload::Product {
            name: "Walnut chess set".to_string(),
            image_url: Some("https://cdn.vetrina.example/p/chess.jpg".to_string()),
            price_cents: 12_900,
            currency: "EUR".to_string(),
            rating: Some(4.5),
            review_count: 18,
            business_name: Some("Atelier Legno".to_string()),
        }
    }

    #[test]
    fn identical_payloads_fingerprint_identically() {
        assert_eq!(fingerprint(&sample_product()), fingerprint(&sample_product()));
    }

    #[test]
    fn fingerprint_has_fixed_width() {
        assert_eq!(fingerprint(&sample_product()).len(), FINGERPRINT_LEN);
        assert!(
            fingerprint(&sample_product())
                .chars()
                .all(|c| c.is_ascii_hexdigit())
        );
    }

    fn product_payload(
        name: &str,
        image_url: Option<&str>,
        price_cents: i64,
        currency: &str,
        rating: Option<f64>,
        review_count: i64,
        business_name: Option<&str>,
    ) -> CardPayload {
        CardPayload::Product {
            name: name.to_string(),
            image_url: image_url.map(str::to_string),
            price_cents,
            currency: currency.to_string(),
            rating,
            review_count,
            business_name: business_name.map(str::to_string),
        }
    }

    #[test]
    fn every_tracked_field_moves_the_fingerprint() {
        let image = Some("https://cdn.vetrina.example/p/chess.jpg");
        let shop = Some("Atelier Legno");
        let base = product_payload("Walnut chess set", image, 12_900, "EUR", Some(4.5), 18, shop);
        let base_hash = fingerprint(&base);

        let mutations = vec![
            product_payload("Oak chess set", image, 12_900, "EUR", Some(4.5), 18, shop),
            product_payload("Walnut chess set", None, 12_900, "EUR", Some(4.5), 18, shop),
            product_payload("Walnut chess set", image, 13_900, "EUR", Some(4.5), 18, shop),
            product_payload("Walnut chess set", image, 12_900, "USD", Some(4.5), 18, shop),
            product_payload("Walnut chess set", image, 12_900, "EUR", Some(4.6), 18, shop),
            product_payload("Walnut chess set", image, 12_900, "EUR", None, 18, shop),
            product_payload("Walnut chess set", image, 12_900, "EUR", Some(4.5), 19, shop),
            product_payload("Walnut chess set", image, 12_900, "EUR", Some(4.5), 18, None),
        ];

        for mutated in mutations {
            assert_ne!(
                fingerprint(&mutated),
                base_hash,
                "mutation did not change fingerprint: {mutated:?}"
            );
        }
    }

    #[test]
    fn absent_field_is_not_empty_string() {
        let absent = CardPayload::Business {
            name: "Atelier Legno".to_string(),
            logo_url: None,
            tagline: None,
            rating: None,
            product_count: 4,
        };
        let empty = CardPayload::Business {
            name: "Atelier Legno".to_string(),
            logo_url: Some(String::new()),
            tagline: None,
            rating: None,
            product_count: 4,
        };
        assert_ne!(fingerprint(&absent), fingerprint(&empty));
    }

    #[test]
    fn rating_jitter_below_display_precision_is_ignored() {
        let a = CardPayload::product(&product_card_with_rating(4.41));
        let b = CardPayload::product(&product_card_with_rating(4.44));
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn kind_tag_separates_families() {
        let product = CardPayload::Product {
            name: "Same".to_string(),
            image_url: None,
            price_cents: 0,
            currency: "EUR".to_string(),
            rating: None,
            review_count: 0,
            business_name: None,
        };
        let business = CardPayload::Business {
            name: "Same".to_string(),
            logo_url: None,
            tagline: None,
            rating: None,
            product_count: 0,
        };
        assert_ne!(fingerprint(&product), fingerprint(&business));
    }

    fn product_card_with_rating(rating: f64) -> crate::domain::entities::ProductCard {
        crate::domain::entities::ProductCard {
            id: uuid::Uuid::nil(),
            name: "Walnut chess set".to_string(),
            image_url: None,
            price_cents: 12_900,
            currency: "EUR".to_string(),
            rating: Some(rating),
            review_count: 18,
            business_name: None,
        }
    }
}
