//! Shared domain enumerations aligned with persisted database enums.

use serde::{Deserialize, Serialize};

/// Entity family a preview card belongs to. Selects the compositor template
/// and the cache-key namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "card_kind", rename_all = "kebab-case")]
pub enum CardKind {
    Product,
    Fund,
    Business,
    AdminInvite,
}

impl CardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CardKind::Product => "product",
            CardKind::Fund => "fund",
            CardKind::Business => "business",
            CardKind::AdminInvite => "admin-invite",
        }
    }

    /// Funds quantize their progress into the cache key; everything else is
    /// keyed on identity alone.
    pub fn is_bucketed(self) -> bool {
        matches!(self, CardKind::Fund)
    }
}

impl std::fmt::Display for CardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
