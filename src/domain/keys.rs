//! Cache key and storage path construction.
//!
//! Keys namespace by family first, then identifier, so ids that are only
//! unique per family cannot collide. Storage paths embed the data hash,
//! making every publish to a given path an idempotent overwrite of identical
//! bytes.

use crate::domain::types::CardKind;

/// Canonical lookup key for one cached card slot.
///
/// Bucketed families append their progress bucket so a fund occupies one
/// slot per 10% band instead of one per contribution.
pub fn cache_key(kind: CardKind, entity_id: &str, bucket: Option<u8>) -> String {
    match bucket {
        Some(bucket) => format!("{}_{}_progress{}", kind.as_str(), entity_id, bucket),
        None => format!("{}_{}", kind.as_str(), entity_id),
    }
}

/// Content-addressed blob location for a rendered card.
pub fn storage_path(kind: CardKind, entity_id: &str, data_hash: &str) -> String {
    format!("{}/{}-{}.png", kind.as_str(), entity_id, data_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbucketed_key_is_kind_then_id() {
        assert_eq!(
            cache_key(CardKind::Product, "3f2c", None),
            "product_3f2c".to_string()
        );
        assert_eq!(
            cache_key(CardKind::AdminInvite, "WELCOME-24", None),
            "admin-invite_WELCOME-24".to_string()
        );
    }

    #[test]
    fn bucketed_key_appends_progress_suffix() {
        assert_eq!(
            cache_key(CardKind::Fund, "9a1b", Some(40)),
            "fund_9a1b_progress40".to_string()
        );
        assert_eq!(
            cache_key(CardKind::Fund, "9a1b", Some(50)),
            "fund_9a1b_progress50".to_string()
        );
    }

    #[test]
    fn keys_are_stable_and_distinct_across_kinds() {
        let a = cache_key(CardKind::Product, "same-id", None);
        let b = cache_key(CardKind::Business, "same-id", None);
        assert_ne!(a, b);
        assert_eq!(a, cache_key(CardKind::Product, "same-id", None));
    }

    #[test]
    fn storage_path_embeds_id_and_hash() {
        let path = storage_path(CardKind::Fund, "9a1b", "deadbeef00112233");
        assert_eq!(path, "fund/9a1b-deadbeef00112233.png");
    }
}
