//! Card synchronizer: per set, pages through its cards, inserts new ones and
//! reconciles the set's `total_cards` with the catalog's `totalCount`

use crate::catalog::{map_card, record_id, set_query, CatalogSource, Resource};
use crate::database;
use crate::error::{CatalogError, Result};
use crate::models::Card;
use rusqlite::Connection;
use std::collections::HashSet;

/// Result of one card synchronization pass over many sets
#[derive(Debug, Default)]
pub struct CardSyncOutcome {
    /// Sets processed
    pub sets_processed: usize,
    /// Records received from the catalog
    pub fetched: usize,
    /// Cards inserted
    pub added: usize,
    /// Sets whose `total_cards` changed
    pub sets_reconciled: usize,
    /// Sets whose batch was rolled back
    pub sets_failed: usize,
    /// Sets whose pagination stopped on a remote error
    pub sets_fetch_failed: usize,
    /// No API key configured, nothing was requested
    pub credentials_missing: bool,
}

/// Cards gathered for one set before committing
#[derive(Debug, Default)]
struct SetCards {
    cards: Vec<Card>,
    /// `totalCount` of the first page, trusted as-is
    total_count: Option<i64>,
    fetched: usize,
    fetch_failed: bool,
}

/// Stage the page's cards that are neither repeated in this set nor known
fn stage_cards(
    records: &[serde_json::Value],
    set_id: &str,
    seen: &mut HashSet<String>,
    known: &HashSet<String>,
) -> Vec<Card> {
    let mut batch = Vec::new();

    for record in records {
        let Some(id) = record_id(record) else {
            log::warn!("Skipping card record without id in set {}", set_id);
            continue;
        };
        if !seen.insert(id.to_string()) {
            log::debug!("Card {} repeated in set {} listing", id, set_id);
            continue;
        }
        if known.contains(id) {
            continue;
        }
        match map_card(record, set_id) {
            Ok(card) => batch.push(card),
            Err(e) => log::warn!("Skipping card {}: {}", id, e),
        }
    }

    batch
}

/// Page through one set's cards
///
/// Remote errors end pagination but keep what was fetched; only a missing
/// credential is returned as an error.
async fn fetch_set_cards<C>(
    catalog: &C,
    set_id: &str,
    page_size: u32,
    known: &HashSet<String>,
) -> Result<SetCards>
where
    C: CatalogSource + ?Sized,
{
    let query = set_query(set_id);
    let mut fetched = SetCards::default();
    let mut seen = HashSet::new();
    let mut page = 1;

    loop {
        let result = match catalog
            .fetch_page(Resource::Cards, Some(&query), page, page_size)
            .await
        {
            Ok(result) => result,
            Err(CatalogError::MissingApiKey) => return Err(CatalogError::MissingApiKey),
            Err(e) => {
                log::warn!(
                    "Failed to fetch cards page {} for set {}: {}. Skipping rest of set.",
                    page,
                    set_id,
                    e
                );
                fetched.fetch_failed = true;
                break;
            }
        };

        if page == 1 {
            fetched.total_count = result.total_count;
            log::info!("Set {} totalCount from catalog: {:?}", set_id, result.total_count);
        }

        if result.records.is_empty() {
            break;
        }

        let page_len = result.records.len();
        fetched.fetched += page_len;
        log::info!(
            "Fetched {} cards on page {} for set {} ({} total)",
            page_len,
            page,
            set_id,
            fetched.fetched
        );

        fetched
            .cards
            .extend(stage_cards(&result.records, set_id, &mut seen, known));

        if page_len < page_size as usize {
            break;
        }
        page += 1;
    }

    Ok(fetched)
}

/// Sync cards for each set id, one transaction per set
///
/// A failure for one set never stops the remaining sets. Known card ids are
/// tracked across the whole run so no id is inserted twice.
pub async fn sync_cards<C>(
    conn: &mut Connection,
    catalog: &C,
    set_ids: &[String],
    page_size: u32,
) -> CardSyncOutcome
where
    C: CatalogSource + ?Sized,
{
    log::info!("Starting card sync for {} sets", set_ids.len());

    let mut outcome = CardSyncOutcome::default();

    if !catalog.has_credentials() {
        log::error!("No Pokémon TCG API key configured, skipping card sync");
        outcome.credentials_missing = true;
        return outcome;
    }

    let mut known = match database::list_card_ids(conn) {
        Ok(ids) => {
            log::info!("Found {} existing cards in database", ids.len());
            ids
        }
        Err(e) => {
            log::warn!("Failed to load existing card ids, assuming none: {}", e);
            HashSet::new()
        }
    };

    for (i, set_id) in set_ids.iter().enumerate() {
        log::info!("Processing set {}/{}: {}", i + 1, set_ids.len(), set_id);

        let set_cards = match fetch_set_cards(catalog, set_id, page_size, &known).await {
            Ok(set_cards) => set_cards,
            Err(e) => {
                log::error!("Aborting card sync: {}", e);
                outcome.credentials_missing = true;
                break;
            }
        };

        outcome.sets_processed += 1;
        outcome.fetched += set_cards.fetched;
        if set_cards.fetch_failed {
            outcome.sets_fetch_failed += 1;
        }

        if set_cards.cards.is_empty() && set_cards.total_count.is_none() {
            log::info!("Finished set {}: nothing to commit", set_id);
            continue;
        }

        match database::apply_set_batch(conn, set_id, &set_cards.cards, set_cards.total_count) {
            Ok(result) => {
                outcome.added += result.inserted;
                if result.count_updated {
                    outcome.sets_reconciled += 1;
                }
                known.extend(set_cards.cards.into_iter().map(|card| card.id));
                log::info!(
                    "Finished set {}: added {} cards, count updated: {}",
                    set_id,
                    result.inserted,
                    if result.count_updated { "yes" } else { "no" }
                );
            }
            Err(e) => {
                outcome.sets_failed += 1;
                log::error!("Failed to commit set {}, rolled back: {}", set_id, e);
            }
        }
    }

    log::info!(
        "Card sync finished: {} new cards, {} sets reconciled, {} sets failed",
        outcome.added,
        outcome.sets_reconciled,
        outcome.sets_failed
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stage_cards_skips_known_and_repeated_ids() {
        let records = vec![
            json!({"id": "base1-1", "name": "Alakazam", "number": "1", "hp": "80"}),
            json!({"id": "base1-2", "name": "Blastoise", "number": "2"}),
            json!({"id": "base1-2", "name": "Blastoise", "number": "2"}),
            json!({"id": "base1-3", "name": "Chansey", "number": "3", "hp": "N/A"}),
        ];
        let known: HashSet<String> = ["base1-1".to_string()].into_iter().collect();
        let mut seen = HashSet::new();

        let batch = stage_cards(&records, "base1", &mut seen, &known);
        let ids: Vec<&str> = batch.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["base1-2", "base1-3"]);
        assert_eq!(batch[1].hp, None);
        assert!(batch.iter().all(|c| c.set_id == "base1"));
    }

    #[test]
    fn stage_cards_drops_records_missing_number() {
        let records = vec![json!({"id": "base1-9", "name": "Gyarados"})];
        let batch = stage_cards(&records, "base1", &mut HashSet::new(), &HashSet::new());
        assert!(batch.is_empty());
    }
}
