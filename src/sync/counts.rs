//! Fills in `total_cards` for sets that were never reconciled
//!
//! Asks the cards endpoint for a single record per set; only the
//! `totalCount` metadata of the response is used.

use crate::catalog::{set_query, CatalogSource, Resource};
use crate::database;
use crate::error::CatalogError;
use rusqlite::Connection;

/// Sets per commit
const COMMIT_BATCH: usize = 50;

/// Result of a missing-count update run
#[derive(Debug, Default, PartialEq)]
pub struct CountUpdateReport {
    /// Sets with `total_cards` NULL at the start
    pub candidates: usize,
    /// Sets whose count was written
    pub updated: usize,
    /// Sets with no usable count from the catalog
    pub failed: usize,
    /// Sets lost to a rolled-back batch
    pub rolled_back: usize,
}

fn flush(conn: &mut Connection, pending: &mut Vec<(String, i64)>, report: &mut CountUpdateReport) {
    if pending.is_empty() {
        return;
    }
    match database::update_set_totals(conn, pending) {
        Ok(updated) => {
            report.updated += updated;
            log::info!("Committed batch of {} set counts", pending.len());
        }
        Err(e) => {
            report.rolled_back += pending.len();
            log::error!(
                "Failed to commit batch of {} set counts, rolled back: {}",
                pending.len(),
                e
            );
        }
    }
    pending.clear();
}

/// Look up and store the catalog card count of every set missing one
pub async fn update_missing_counts<C>(conn: &mut Connection, catalog: &C) -> CountUpdateReport
where
    C: CatalogSource + ?Sized,
{
    let mut report = CountUpdateReport::default();

    let sets = match database::sets_missing_total(conn) {
        Ok(sets) => sets,
        Err(e) => {
            log::error!("Failed to load sets with missing counts: {}", e);
            return report;
        }
    };

    if sets.is_empty() {
        log::info!("No sets with missing total_cards, nothing to do");
        return report;
    }
    report.candidates = sets.len();

    if !catalog.has_credentials() {
        log::error!("No Pokémon TCG API key configured, cannot update counts");
        return report;
    }

    log::info!("Updating card counts for {} sets", sets.len());

    let mut pending = Vec::new();
    for (i, set) in sets.iter().enumerate() {
        let query = set_query(&set.id);
        match catalog.fetch_page(Resource::Cards, Some(&query), 1, 1).await {
            Ok(page) => match page.total_count {
                Some(total) => {
                    log::debug!("Set {} ({}): catalog count {}", set.name, set.id, total);
                    pending.push((set.id.clone(), total));
                }
                None => {
                    report.failed += 1;
                    log::warn!("Set {}: catalog returned no totalCount", set.id);
                }
            },
            Err(CatalogError::MissingApiKey) => {
                log::error!("Catalog rejected request without API key, stopping");
                break;
            }
            Err(e) => {
                report.failed += 1;
                log::warn!("Set {}: failed to fetch count: {}", set.id, e);
            }
        }

        if (i + 1) % COMMIT_BATCH == 0 {
            flush(conn, &mut pending, &mut report);
        }
    }
    flush(conn, &mut pending, &mut report);

    log::info!(
        "Count update finished: {} of {} sets updated, {} failed",
        report.updated,
        report.candidates,
        report.failed + report.rolled_back
    );

    report
}
