//! Pokendex - Pokémon TCG collection backend
//!
//! Syncs sets and cards from the Pokémon TCG catalog API into a SQLite
//! database and serves them over a small REST API.

pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod sync;
pub mod web;

pub use catalog::{CatalogPage, CatalogSource, PokemonTcgClient, Resource, PAGE_SIZE};
pub use config::Config;
pub use error::{CatalogError, Result};
pub use models::{Card, Set};
pub use sync::{run_sync, update_missing_counts, CountUpdateReport, SyncReport};
