//! Error types for pokendex

use thiserror::Error;

/// Unified error type for catalog, sync and database operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No API key configured; the client refuses to contact the catalog
    #[error("No Pokémon TCG API key configured (set POKEMONTCG_API_KEY)")]
    MissingApiKey,
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP error status code
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),
    /// Failed to parse JSON response
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Card references a set that is not stored locally
    #[error("Set not found: {0}")]
    SetNotFound(String),
    /// Catalog record could not be mapped to the local schema
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// Startup configuration problem
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result alias for pokendex operations
pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display() {
        let err = CatalogError::HttpStatus(reqwest::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.to_string(), "HTTP error: 429 Too Many Requests");
    }

    #[test]
    fn database_error_converts() {
        let err: CatalogError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, CatalogError::Database(_)));
    }
}
