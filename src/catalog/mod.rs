//! Pokémon TCG catalog access: paginated listing of sets and cards

mod client;
mod records;

pub use client::{PokemonTcgClient, DEFAULT_API_URL};
pub use records::{map_card, map_set, parse_hp, record_id};

use crate::error::Result;
use async_trait::async_trait;

/// Page size used for every catalog listing
pub const PAGE_SIZE: u32 = 250;

/// Listing endpoint of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Sets,
    Cards,
}

impl Resource {
    /// URL path segment for this resource
    pub fn path(self) -> &'static str {
        match self {
            Resource::Sets => "sets",
            Resource::Cards => "cards",
        }
    }
}

/// One page of raw catalog records
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    /// Raw records, mapped individually so one bad record can't spoil the page
    pub records: Vec<serde_json::Value>,
    /// Remote total for the whole filtered query (not the page length)
    pub total_count: Option<i64>,
}

/// Catalog query filter scoping cards to one set
pub fn set_query(set_id: &str) -> String {
    format!("set.id:{}", set_id)
}

/// Source of paginated catalog data
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Whether a credential is configured; without one no request is made
    fn has_credentials(&self) -> bool;

    /// Fetch one page (1-based) of `resource`, optionally filtered by `query`
    async fn fetch_page(
        &self,
        resource: Resource,
        query: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<CatalogPage>;
}
