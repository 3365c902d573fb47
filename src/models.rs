//! Domain records persisted in the local store and served by the API

use serde::{Deserialize, Serialize};

/// A themed release grouping of cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Set {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    /// Catalog-reported card count, `None` until first reconciled
    #[serde(default)]
    pub total_cards: Option<i64>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub symbol_url: Option<String>,
}

/// An individual card belonging to exactly one set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    /// Collector number, not necessarily numeric (e.g. "SWSH001")
    pub number: String,
    #[serde(default)]
    pub rarity: Option<String>,
    /// Supertype ("Pokémon", "Trainer", "Energy")
    #[serde(default, rename = "type")]
    pub card_type: Option<String>,
    /// Subtypes joined with ','
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub hp: Option<i64>,
    #[serde(default)]
    pub image_url_small: Option<String>,
    #[serde(default)]
    pub image_url_large: Option<String>,
    pub set_id: String,
}

#[cfg(test)]
pub use tests::{make_test_card, make_test_set};
