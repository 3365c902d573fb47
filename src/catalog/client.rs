//! Pokémon TCG API client
//!
//! Uses async reqwest for non-blocking HTTP requests.

use super::{CatalogPage, CatalogSource, Resource};
use crate::error::{CatalogError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Public Pokémon TCG API v2 endpoint
pub const DEFAULT_API_URL: &str = "https://api.pokemontcg.io/v2";

const USER_AGENT: &str = "Pokendex-Sync/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Listing response body: `{"data": [...], "totalCount": N, ...}`
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
    #[serde(default, rename = "totalCount")]
    total_count: Option<serde_json::Value>,
}

/// Interpret a `totalCount` value: integers, or strings holding one
fn parse_total_count(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// HTTP client for the Pokémon TCG catalog
pub struct PokemonTcgClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl PokemonTcgClient {
    /// Create a client; an empty key is treated as no key
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Point the client at a different API root (mirrors, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// API root the client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl CatalogSource for PokemonTcgClient {
    fn has_credentials(&self) -> bool {
        self.has_api_key()
    }

    async fn fetch_page(
        &self,
        resource: Resource,
        query: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<CatalogPage> {
        let api_key = self.api_key.as_deref().ok_or(CatalogError::MissingApiKey)?;

        let url = format!("{}/{}", self.base_url, resource.path());
        let mut params = vec![
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        if let Some(q) = query {
            params.push(("q", q.to_string()));
        }
        if resource == Resource::Cards {
            params.push(("orderBy", "number".to_string()));
        }

        log::debug!(
            "Fetching {} page {} (pageSize {}, q {:?})",
            resource.path(),
            page,
            page_size,
            query
        );

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", api_key)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        let parsed: ListResponse = serde_json::from_str(&body)?;

        let total_count = match parsed.total_count {
            Some(ref value) => {
                let count = parse_total_count(value);
                if count.is_none() && !value.is_null() {
                    log::warn!("Ignoring non-integer totalCount {} from {}", value, url);
                }
                count
            }
            None => None,
        };

        Ok(CatalogPage {
            records: parsed.data,
            total_count,
        })
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
