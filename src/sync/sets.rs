//! Set synchronizer: pages through the catalog's sets and inserts new ones

use crate::catalog::{map_set, record_id, CatalogSource, Resource};
use crate::database;
use crate::error::CatalogError;
use crate::models::Set;
use rusqlite::Connection;
use std::collections::HashSet;

/// Result of one set synchronization pass
#[derive(Debug, Default)]
pub struct SetSyncOutcome {
    /// Ids stored before the run plus ids inserted by it
    pub set_ids: HashSet<String>,
    /// Records received from the catalog
    pub fetched: usize,
    /// Sets inserted
    pub added: usize,
    /// Pages whose insert was rolled back
    pub pages_failed: usize,
    /// Pagination stopped early on a remote error
    pub fetch_failed: bool,
    /// No API key configured, nothing was requested
    pub credentials_missing: bool,
}

/// Stage the page's sets that are neither repeated in this run nor stored
fn stage_sets(
    records: &[serde_json::Value],
    seen: &mut HashSet<String>,
    known: &HashSet<String>,
) -> Vec<Set> {
    let mut batch = Vec::new();

    for record in records {
        let Some(id) = record_id(record) else {
            log::warn!("Skipping set record without id");
            continue;
        };
        if !seen.insert(id.to_string()) {
            log::debug!("Set {} repeated in catalog listing", id);
            continue;
        }
        if known.contains(id) {
            continue;
        }
        match map_set(record) {
            Ok(set) => batch.push(set),
            Err(e) => log::warn!("Skipping set {}: {}", id, e),
        }
    }

    batch
}

/// Fetch every catalog set page and insert the sets not stored yet
///
/// Each page is committed on its own; a failed page is rolled back and the
/// next one is still processed. `total_cards` is never set here.
pub async fn sync_sets<C>(conn: &mut Connection, catalog: &C, page_size: u32) -> SetSyncOutcome
where
    C: CatalogSource + ?Sized,
{
    log::info!("Starting set sync");

    let mut known = match database::list_set_ids(conn) {
        Ok(ids) => {
            log::info!("Found {} existing sets in database", ids.len());
            ids
        }
        Err(e) => {
            log::warn!("Failed to load existing set ids, assuming none: {}", e);
            HashSet::new()
        }
    };

    let mut outcome = SetSyncOutcome::default();

    if !catalog.has_credentials() {
        log::error!("No Pokémon TCG API key configured, skipping set sync");
        outcome.credentials_missing = true;
        outcome.set_ids = known;
        return outcome;
    }

    let mut seen = HashSet::new();
    let mut page = 1;

    loop {
        let result = match catalog.fetch_page(Resource::Sets, None, page, page_size).await {
            Ok(result) => result,
            Err(CatalogError::MissingApiKey) => {
                log::error!("Catalog rejected request without API key, skipping set sync");
                outcome.credentials_missing = true;
                break;
            }
            Err(e) => {
                log::warn!("Failed to fetch sets page {}: {}. Stopping.", page, e);
                outcome.fetch_failed = true;
                break;
            }
        };

        if result.records.is_empty() {
            log::info!("No more sets from catalog");
            break;
        }

        let page_len = result.records.len();
        outcome.fetched += page_len;
        log::info!(
            "Fetched {} sets on page {} ({} total)",
            page_len,
            page,
            outcome.fetched
        );

        let batch = stage_sets(&result.records, &mut seen, &known);
        if !batch.is_empty() {
            match database::insert_sets(conn, &batch) {
                Ok(count) => {
                    outcome.added += count;
                    known.extend(batch.into_iter().map(|set| set.id));
                    log::info!("Added {} new sets from page {}", count, page);
                }
                Err(e) => {
                    outcome.pages_failed += 1;
                    log::error!("Failed to commit sets page {}, rolled back: {}", page, e);
                }
            }
        }

        if page_len < page_size as usize {
            log::info!("Reached last page of sets");
            break;
        }
        page += 1;
    }

    log::info!(
        "Set sync finished: {} new sets, {} sets known",
        outcome.added,
        known.len()
    );

    outcome.set_ids = known;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stage_sets_skips_repeats_known_and_invalid() {
        let records = vec![
            json!({"id": "base1", "name": "Base"}),
            json!({"id": "base2", "name": "Jungle"}),
            json!({"id": "base2", "name": "Jungle (dup)"}),
            json!({"name": "No id"}),
            json!({"id": "base3"}),
            json!({"id": "base4", "name": "Team Rocket"}),
        ];
        let known: HashSet<String> = ["base1".to_string()].into_iter().collect();
        let mut seen = HashSet::new();

        let batch = stage_sets(&records, &mut seen, &known);
        let ids: Vec<&str> = batch.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["base2", "base4"]);
        assert_eq!(batch[0].name, "Jungle");
    }

    #[test]
    fn stage_sets_remembers_ids_across_pages() {
        let known = HashSet::new();
        let mut seen = HashSet::new();

        let first = stage_sets(&[json!({"id": "a", "name": "A"})], &mut seen, &known);
        let second = stage_sets(&[json!({"id": "a", "name": "A"})], &mut seen, &known);
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }
}
