pub mod cache;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod filter;
pub mod history;
pub mod html;
pub mod log;
pub mod providers;
pub mod stats;
pub mod ui;

use crate::catalog::CatalogEntry;
use crate::filter::Selection;
use crate::history::HistoryOutcome;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// A single user interaction, as dispatched by the CLI.
#[derive(Debug, Clone)]
pub enum AppCommand {
    List {
        sector: Option<String>,
        symbol: Option<String>,
    },
    Sectors,
    Show {
        symbol: String,
    },
}

/// Runs one render pass. Builds the caches and providers from config and
/// delegates to the dashboard views.
pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("S&P 500 dashboard starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    // Create shared caches
    let catalog_cache = Arc::new(cache::Cache::<String, Vec<CatalogEntry>>::new());
    let history_cache = Arc::new(cache::Cache::<String, HistoryOutcome>::new());

    let catalog_provider = providers::wiki_catalog::WikiCatalogProvider::new(
        config.wiki_base_url(),
        Arc::clone(&catalog_cache),
    );
    let history_provider = providers::yahoo_history::YahooHistoryProvider::new(
        config.yahoo_base_url(),
        Arc::clone(&history_cache),
    );

    match command {
        AppCommand::List { sector, symbol } => {
            dashboard::show_catalog(
                &catalog_provider,
                &Selection::from_arg(sector.as_deref()),
                &Selection::from_arg(symbol.as_deref()),
            )
            .await
        }
        AppCommand::Sectors => dashboard::show_sectors(&catalog_provider).await,
        AppCommand::Show { symbol } => {
            dashboard::show_symbol(&catalog_provider, &history_provider, &symbol).await
        }
    }
}
