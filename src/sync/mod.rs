//! Catalog synchronization: sets first, then cards for every known set
//!
//! Each unit of work (one page of sets, one set's cards plus its count) is its
//! own transaction and failure domain. Re-running is safe: only missing
//! entities are added and only differing counts are rewritten.

mod cards;
mod counts;
mod sets;

pub use cards::{sync_cards, CardSyncOutcome};
pub use counts::{update_missing_counts, CountUpdateReport};
pub use sets::{sync_sets, SetSyncOutcome};

use crate::catalog::CatalogSource;
use rusqlite::Connection;

/// Totals of a full sync run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncReport {
    pub sets_added: usize,
    pub cards_added: usize,
    pub sets_reconciled: usize,
    pub set_pages_failed: usize,
    pub card_sets_failed: usize,
    pub credentials_missing: bool,
}

/// Run the set sync, then the card sync over the resulting set ids
pub async fn run_sync<C>(conn: &mut Connection, catalog: &C, page_size: u32) -> SyncReport
where
    C: CatalogSource + ?Sized,
{
    let mut report = SyncReport::default();

    let sets = sync_sets(conn, catalog, page_size).await;
    report.sets_added = sets.added;
    report.set_pages_failed = sets.pages_failed;

    if sets.credentials_missing {
        report.credentials_missing = true;
        log::info!("Skipping card sync, no catalog access");
        return report;
    }

    if sets.set_ids.is_empty() {
        log::info!("No sets in database to populate cards for");
        return report;
    }

    let mut set_ids: Vec<String> = sets.set_ids.into_iter().collect();
    set_ids.sort();

    let cards = sync_cards(conn, catalog, &set_ids, page_size).await;
    report.cards_added = cards.added;
    report.sets_reconciled = cards.sets_reconciled;
    report.card_sets_failed = cards.sets_failed;
    report.credentials_missing = cards.credentials_missing;

    log::info!(
        "Sync completed: {} new sets, {} new cards, {} set counts reconciled",
        report.sets_added,
        report.cards_added,
        report.sets_reconciled
    );
    if report.set_pages_failed > 0 || report.card_sets_failed > 0 {
        log::warn!(
            "{} set pages and {} sets failed to commit; re-run to retry",
            report.set_pages_failed,
            report.card_sets_failed
        );
    }

    report
}
