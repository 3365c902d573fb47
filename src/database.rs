//! Local store gateway for sets and cards
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! Every write runs inside a transaction; an error before commit drops the
//! transaction, which rolls it back and leaves the store untouched.

use crate::error::{CatalogError, Result};
use crate::models::{Card, Set};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::collections::HashSet;
use std::path::Path;

/// Result type for read-only database operations
pub type DbResult<T> = rusqlite::Result<T>;

const SET_COLUMNS: &str =
    "id, name, series, release_date, total_cards, logo_url, symbol_url";

const CARD_COLUMNS: &str = "id, name, number, rarity, type, subtype, hp, \
     image_url_small, image_url_large, set_id";

/// Open (or create) the database file and initialise the schema
pub fn open(path: &Path) -> DbResult<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Initialize the database schema
///
/// Creates tables if they don't exist:
/// - `sets`: catalog sets, `total_cards` reconciled by the card sync
/// - `cards`: catalog cards, each referencing a stored set
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS sets (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            series TEXT,
            release_date TEXT,
            total_cards INTEGER,
            logo_url TEXT,
            symbol_url TEXT
        );

        CREATE TABLE IF NOT EXISTS cards (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            number TEXT NOT NULL,
            rarity TEXT,
            type TEXT,
            subtype TEXT,
            hp INTEGER,
            image_url_small TEXT,
            image_url_large TEXT,
            set_id TEXT NOT NULL,
            FOREIGN KEY (set_id) REFERENCES sets(id)
        );

        CREATE INDEX IF NOT EXISTS idx_cards_set ON cards(set_id);
        CREATE INDEX IF NOT EXISTS idx_sets_total_cards ON sets(total_cards);
        ",
    )?;

    log::debug!("Database schema initialized");
    Ok(())
}

fn set_from_row(row: &Row<'_>) -> DbResult<Set> {
    Ok(Set {
        id: row.get(0)?,
        name: row.get(1)?,
        series: row.get(2)?,
        release_date: row.get(3)?,
        total_cards: row.get(4)?,
        logo_url: row.get(5)?,
        symbol_url: row.get(6)?,
    })
}

fn card_from_row(row: &Row<'_>) -> DbResult<Card> {
    Ok(Card {
        id: row.get(0)?,
        name: row.get(1)?,
        number: row.get(2)?,
        rarity: row.get(3)?,
        card_type: row.get(4)?,
        subtype: row.get(5)?,
        hp: row.get(6)?,
        image_url_small: row.get(7)?,
        image_url_large: row.get(8)?,
        set_id: row.get(9)?,
    })
}

fn list_ids(conn: &Connection, sql: &str) -> DbResult<HashSet<String>> {
    let mut stmt = conn.prepare(sql)?;
    let ids: DbResult<HashSet<String>> = stmt.query_map([], |row| row.get(0))?.collect();
    ids
}

/// All set ids currently stored
pub fn list_set_ids(conn: &Connection) -> DbResult<HashSet<String>> {
    list_ids(conn, "SELECT id FROM sets")
}

/// All card ids currently stored
pub fn list_card_ids(conn: &Connection) -> DbResult<HashSet<String>> {
    list_ids(conn, "SELECT id FROM cards")
}

/// Get a set by ID
pub fn get_set(conn: &Connection, id: &str) -> DbResult<Option<Set>> {
    conn.query_row(
        &format!("SELECT {} FROM sets WHERE id = ?1", SET_COLUMNS),
        params![id],
        set_from_row,
    )
    .optional()
}

/// Get a card by ID
pub fn get_card(conn: &Connection, id: &str) -> DbResult<Option<Card>> {
    conn.query_row(
        &format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS),
        params![id],
        card_from_row,
    )
    .optional()
}

/// List sets ordered by ID, with offset pagination
pub fn list_sets(conn: &Connection, skip: usize, limit: usize) -> DbResult<Vec<Set>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM sets ORDER BY id LIMIT ?1 OFFSET ?2",
        SET_COLUMNS
    ))?;
    let sets: DbResult<Vec<Set>> = stmt
        .query_map(params![limit as i64, skip as i64], set_from_row)?
        .collect();
    sets
}

/// List cards ordered by ID, optionally restricted to one set
pub fn list_cards(
    conn: &Connection,
    skip: usize,
    limit: usize,
    set_id: Option<&str>,
) -> DbResult<Vec<Card>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM cards
         WHERE ?1 IS NULL OR set_id = ?1
         ORDER BY id
         LIMIT ?2 OFFSET ?3",
        CARD_COLUMNS
    ))?;
    let cards: DbResult<Vec<Card>> = stmt
        .query_map(params![set_id, limit as i64, skip as i64], card_from_row)?
        .collect();
    cards
}

/// Sets whose card count has never been reconciled
pub fn sets_missing_total(conn: &Connection) -> DbResult<Vec<Set>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM sets WHERE total_cards IS NULL ORDER BY id",
        SET_COLUMNS
    ))?;
    let sets: DbResult<Vec<Set>> = stmt.query_map([], set_from_row)?.collect();
    sets
}

/// Get total count of sets in database
pub fn get_set_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM sets", [], |row| row.get(0))
}

/// Get total count of cards in database
pub fn get_card_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))
}

/// Insert a batch of new sets in one transaction
///
/// Fails (and rolls back the whole batch) if any id already exists.
pub fn insert_sets(conn: &mut Connection, sets: &[Set]) -> Result<usize> {
    let tx = conn.transaction()?;
    let count = insert_sets_tx(&tx, sets)?;
    tx.commit()?;
    Ok(count)
}

fn insert_sets_tx(tx: &Transaction<'_>, sets: &[Set]) -> Result<usize> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO sets (id, name, series, release_date, total_cards, logo_url, symbol_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    for set in sets {
        stmt.execute(params![
            &set.id,
            &set.name,
            &set.series,
            &set.release_date,
            set.total_cards,
            &set.logo_url,
            &set.symbol_url,
        ])?;
    }

    Ok(sets.len())
}

/// Insert a batch of new cards in one transaction
///
/// Every card's set must already be stored; otherwise the batch is rolled back
/// with [`CatalogError::SetNotFound`].
pub fn insert_cards(conn: &mut Connection, cards: &[Card]) -> Result<usize> {
    let tx = conn.transaction()?;
    let count = insert_cards_tx(&tx, cards)?;
    tx.commit()?;
    Ok(count)
}

fn set_exists(tx: &Transaction<'_>, set_id: &str) -> DbResult<bool> {
    let mut stmt = tx.prepare_cached("SELECT 1 FROM sets WHERE id = ?1")?;
    stmt.exists(params![set_id])
}

fn insert_cards_tx(tx: &Transaction<'_>, cards: &[Card]) -> Result<usize> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO cards
         (id, name, number, rarity, type, subtype, hp, image_url_small, image_url_large, set_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;

    for card in cards {
        if !set_exists(tx, &card.set_id)? {
            return Err(CatalogError::SetNotFound(card.set_id.clone()));
        }
        stmt.execute(params![
            &card.id,
            &card.name,
            &card.number,
            &card.rarity,
            &card.card_type,
            &card.subtype,
            card.hp,
            &card.image_url_small,
            &card.image_url_large,
            &card.set_id,
        ])?;
    }

    Ok(cards.len())
}

/// Set a set's `total_cards` column
pub fn update_set_total(tx: &Transaction<'_>, set_id: &str, total: i64) -> DbResult<usize> {
    tx.execute(
        "UPDATE sets SET total_cards = ?1 WHERE id = ?2",
        params![total, set_id],
    )
}

/// Re-read the stored set and update its count only if it differs
///
/// Returns `true` when the row was changed.
fn reconcile_set_total_tx(tx: &Transaction<'_>, set_id: &str, total: i64) -> Result<bool> {
    let current = get_set(tx, set_id)?.ok_or_else(|| CatalogError::SetNotFound(set_id.into()))?;

    if current.total_cards == Some(total) {
        log::debug!(
            "Set {} total_cards already matches catalog count ({})",
            set_id,
            total
        );
        return Ok(false);
    }

    log::info!(
        "Updating set {} total_cards from {:?} to {}",
        set_id,
        current.total_cards,
        total
    );
    update_set_total(tx, set_id, total)?;
    Ok(true)
}

/// Outcome of committing one set's worth of cards
#[derive(Debug, Default, PartialEq)]
pub struct SetBatchResult {
    /// Number of cards inserted
    pub inserted: usize,
    /// Whether `total_cards` was changed
    pub count_updated: bool,
}

/// Commit one set's new cards and its count reconciliation together
///
/// The set is re-read inside the transaction right before the count is
/// compared, so a stale copy is never written back.
pub fn apply_set_batch(
    conn: &mut Connection,
    set_id: &str,
    cards: &[Card],
    total_count: Option<i64>,
) -> Result<SetBatchResult> {
    let tx = conn.transaction()?;
    let inserted = insert_cards_tx(&tx, cards)?;
    let count_updated = match total_count {
        Some(total) => reconcile_set_total_tx(&tx, set_id, total)?,
        None => false,
    };
    tx.commit()?;
    Ok(SetBatchResult {
        inserted,
        count_updated,
    })
}

/// Reconcile several set counts in one transaction
///
/// Returns the number of sets whose count changed.
pub fn update_set_totals(conn: &mut Connection, totals: &[(String, i64)]) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut updated = 0;
    for (set_id, total) in totals {
        if reconcile_set_total_tx(&tx, set_id, *total)? {
            updated += 1;
        }
    }
    tx.commit()?;
    Ok(updated)
}
