//! Pokendex - Pokémon TCG collection backend
//!
//! `pokendex` (or `pokendex populate`) syncs the catalog into SQLite once and
//! exits; `update-counts` fills in missing set card counts; `serve` runs the API.

use clap::{Parser, Subcommand};
use pokendex::{config, run_sync, update_missing_counts, Config, PokemonTcgClient, PAGE_SIZE};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Pokémon TCG collection backend - catalog sync and REST API
#[derive(Parser, Debug)]
#[command(name = "pokendex")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch new sets and cards from the catalog and reconcile set counts (default)
    Populate {
        /// Records requested per catalog page
        #[arg(long, default_value_t = PAGE_SIZE)]
        page_size: u32,
    },
    /// Fill in total_cards for sets that have none
    UpdateCounts,
    /// Serve the REST API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },
}

fn open_database(config: &Config) -> Connection {
    match config.open_database() {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    }
}

fn catalog_client(config: &Config) -> PokemonTcgClient {
    match config.catalog_client() {
        Ok(catalog) => catalog,
        Err(e) => {
            log::error!("Failed to create catalog client: {}", e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    config::load_env();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Populate {
        page_size: PAGE_SIZE,
    });

    log::info!("Database path: {}", cli.config.database_path().display());
    let mut conn = open_database(&cli.config);

    match command {
        Command::Populate { page_size } => {
            let catalog = catalog_client(&cli.config);
            let report = run_sync(&mut conn, &catalog, page_size.max(1)).await;
            log::info!(
                "Population finished: {} sets added, {} cards added, {} counts reconciled",
                report.sets_added,
                report.cards_added,
                report.sets_reconciled
            );
        }
        Command::UpdateCounts => {
            let catalog = catalog_client(&cli.config);
            update_missing_counts(&mut conn, &catalog).await;
        }
        Command::Serve { port } => {
            let db = Arc::new(Mutex::new(conn));
            if let Err(e) = pokendex::web::serve(db, port).await {
                log::error!("Web server error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
