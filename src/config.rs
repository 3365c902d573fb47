//! Runtime configuration: command-line flags with environment fallbacks
//!
//! Values can also come from a `.env` file in the working directory.

use crate::catalog::{PokemonTcgClient, DEFAULT_API_URL};
use crate::database;
use crate::error::{CatalogError, Result};
use clap::Args;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Settings shared by every command
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    #[arg(long, global = true, env = "DATABASE_PATH", default_value_t = default_db_path())]
    pub database: String,

    /// Pokémon TCG API key; without it no catalog sync is possible
    #[arg(long, global = true, env = "POKEMONTCG_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Pokémon TCG API root
    #[arg(long, global = true, env = "POKEMONTCG_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

/// Returns the default database path: ~/.local/share/pokendex/pokendex.db
pub fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pokendex")
        .join("pokendex.db")
        .to_string_lossy()
        .to_string()
}

/// Load `.env` if present; a missing file is fine
pub fn load_env() {
    if dotenv::dotenv().is_ok() {
        log::debug!("Loaded environment from .env");
    }
}

impl Config {
    pub fn database_path(&self) -> &Path {
        Path::new(&self.database)
    }

    /// Open the database, creating its directory and schema if needed
    pub fn open_database(&self) -> Result<Connection> {
        let path = self.database_path();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CatalogError::Config(format!(
                        "cannot create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
                log::info!("Created directory: {}", parent.display());
            }
        }

        let conn = database::open(path)?;
        log::info!("Opened database: {}", path.display());
        Ok(conn)
    }

    /// Build the catalog client from the configured key and URL
    pub fn catalog_client(&self) -> Result<PokemonTcgClient> {
        let client = PokemonTcgClient::new(self.api_key.clone())?.with_base_url(&self.api_url);
        if client.has_api_key() {
            log::info!("Pokémon TCG API key found");
        } else {
            log::warn!("POKEMONTCG_API_KEY not set, catalog sync disabled");
        }
        Ok(client)
    }
}
