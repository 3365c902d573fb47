//! Raw catalog records and their mapping onto the local schema

use crate::error::{CatalogError, Result};
use crate::models::{Card, Set};
use serde::Deserialize;

/// Set record as returned by `/v2/sets`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSet {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub images: Option<SetImages>,
}

#[derive(Debug, Deserialize)]
pub struct SetImages {
    pub logo: Option<String>,
    pub symbol: Option<String>,
}

/// Card record as returned by `/v2/cards`
#[derive(Debug, Deserialize)]
pub struct RawCard {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub supertype: Option<String>,
    #[serde(default)]
    pub subtypes: Option<Vec<String>>,
    /// Usually a digit string ("60"), sometimes absent or junk
    #[serde(default)]
    pub hp: Option<serde_json::Value>,
    #[serde(default)]
    pub images: Option<CardImages>,
}

#[derive(Debug, Deserialize)]
pub struct CardImages {
    pub small: Option<String>,
    pub large: Option<String>,
}

/// Parse hit points; anything that isn't a plain non-negative integer is `None`
pub fn parse_hp(value: Option<&serde_json::Value>) -> Option<i64> {
    match value? {
        serde_json::Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().ok()
        }
        serde_json::Value::Number(n) => n.as_i64().filter(|hp| *hp >= 0),
        _ => None,
    }
}

fn required(field: Option<String>, name: &str) -> Result<String> {
    field
        .filter(|value| !value.is_empty())
        .ok_or_else(|| CatalogError::InvalidRecord(format!("missing {}", name)))
}

/// Id of a raw record, if it has a usable one
pub fn record_id(record: &serde_json::Value) -> Option<&str> {
    record
        .get("id")
        .and_then(|id| id.as_str())
        .filter(|id| !id.is_empty())
}

/// Map a raw set record; `total_cards` is left for card reconciliation
pub fn map_set(record: &serde_json::Value) -> Result<Set> {
    let raw = RawSet::deserialize(record)?;
    let images = raw.images;

    Ok(Set {
        id: required(raw.id, "id")?,
        name: required(raw.name, "name")?,
        series: raw.series,
        release_date: raw.release_date,
        total_cards: None,
        logo_url: images.as_ref().and_then(|i| i.logo.clone()),
        symbol_url: images.as_ref().and_then(|i| i.symbol.clone()),
    })
}

/// Map a raw card record onto `set_id`
pub fn map_card(record: &serde_json::Value, set_id: &str) -> Result<Card> {
    let raw = RawCard::deserialize(record)?;
    let images = raw.images;

    let subtype = raw
        .subtypes
        .filter(|subtypes| !subtypes.is_empty())
        .map(|subtypes| subtypes.join(","));

    Ok(Card {
        id: required(raw.id, "id")?,
        name: required(raw.name, "name")?,
        number: required(raw.number, "number")?,
        rarity: raw.rarity,
        card_type: raw.supertype,
        subtype,
        hp: parse_hp(raw.hp.as_ref()),
        image_url_small: images.as_ref().and_then(|i| i.small.clone()),
        image_url_large: images.as_ref().and_then(|i| i.large.clone()),
        set_id: set_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn map_set_reads_camel_case_and_images() {
        let record = json!({
            "id": "swsh1",
            "name": "Sword & Shield",
            "series": "Sword & Shield",
            "releaseDate": "2020/02/07",
            "printedTotal": 202,
            "total": 216,
            "images": {
                "symbol": "https://images.pokemontcg.io/swsh1/symbol.png",
                "logo": "https://images.pokemontcg.io/swsh1/logo.png"
            }
        });

        let set = map_set(&record).unwrap();
        assert_eq!(set.id, "swsh1");
        assert_eq!(set.release_date.as_deref(), Some("2020/02/07"));
        assert_eq!(
            set.logo_url.as_deref(),
            Some("https://images.pokemontcg.io/swsh1/logo.png")
        );
        // Never taken from the set listing
        assert!(set.total_cards.is_none());
    }

    #[test]
    fn map_set_without_id_is_invalid() {
        let err = map_set(&json!({"name": "Nameless"})).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRecord(_)));
    }

    #[test]
    fn map_card_flattens_subtypes() {
        let record = json!({
            "id": "swsh1-1",
            "name": "Celebi V",
            "number": "1",
            "supertype": "Pokémon",
            "subtypes": ["Basic", "V"],
            "hp": "180",
            "rarity": "Rare Holo V",
            "images": {"small": "s.png", "large": "l.png"}
        });

        let card = map_card(&record, "swsh1").unwrap();
        assert_eq!(card.subtype.as_deref(), Some("Basic,V"));
        assert_eq!(card.card_type.as_deref(), Some("Pokémon"));
        assert_eq!(card.hp, Some(180));
        assert_eq!(card.image_url_large.as_deref(), Some("l.png"));
        assert_eq!(card.set_id, "swsh1");
    }

    #[test]
    fn map_card_with_non_numeric_hp_maps_to_none() {
        let record = json!({"id": "base1-80", "name": "Bill", "number": "80", "hp": "N/A"});
        let card = map_card(&record, "base1").unwrap();
        assert_eq!(card.hp, None);
        assert_eq!(card.subtype, None);
    }

    #[test]
    fn map_card_keeps_alphanumeric_number() {
        let record = json!({"id": "swshp-SWSH001", "name": "Grookey", "number": "SWSH001"});
        let card = map_card(&record, "swshp").unwrap();
        assert_eq!(card.number, "SWSH001");
    }

    #[test]
    fn map_card_with_wrong_field_type_is_parse_error() {
        let record = json!({"id": "x-1", "name": 42, "number": "1"});
        assert!(matches!(map_card(&record, "x"), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn parse_hp_variants() {
        assert_eq!(parse_hp(Some(&json!("60"))), Some(60));
        assert_eq!(parse_hp(Some(&json!(70))), Some(70));
        assert_eq!(parse_hp(Some(&json!("N/A"))), None);
        assert_eq!(parse_hp(Some(&json!(""))), None);
        assert_eq!(parse_hp(Some(&json!("-10"))), None);
        assert_eq!(parse_hp(Some(&json!(null))), None);
        assert_eq!(parse_hp(None), None);
    }

    #[test]
    fn record_id_ignores_empty_and_non_string() {
        assert_eq!(record_id(&json!({"id": "base1"})), Some("base1"));
        assert_eq!(record_id(&json!({"id": ""})), None);
        assert_eq!(record_id(&json!({"id": 7})), None);
        assert_eq!(record_id(&json!({})), None);
    }
}
