pub mod cli;
pub mod core;
pub mod providers;
pub mod service;
pub mod store;

use crate::core::config::AppConfig;
use crate::service::HoldingsService;
use crate::store::KeyValueStore;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    List,
    Holdings {
        ticker: String,
        refresh: bool,
        limit: usize,
    },
    Overlap {
        ticker1: String,
        ticker2: String,
    },
    ClearCache,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("ETF overlap analyzer starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let cache_path = config.default_data_path()?.join("cache");
    let store = KeyValueStore::open(&cache_path);
    let service = HoldingsService::from_config(&config, &store)?;

    match command {
        AppCommand::List => {
            cli::funds::run(service.available_funds());
            Ok(())
        }
        AppCommand::Holdings {
            ticker,
            refresh,
            limit,
        } => cli::holdings::run(&service, &ticker, refresh, limit).await,
        AppCommand::Overlap { ticker1, ticker2 } => {
            cli::overlap::run(&service, &ticker1, &ticker2).await
        }
        AppCommand::ClearCache => {
            service.clear_cache().await;
            info!("Cleared holdings cache at {}", cache_path.display());
            Ok(())
        }
    }
}
