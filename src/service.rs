//! Holdings retrieval and overlap analysis, as exposed to the CLI.

use crate::core::cache::HoldingsCache;
use crate::core::config::AppConfig;
use crate::core::error::HoldingsError;
use crate::core::holdings::HoldingsSnapshot;
use crate::core::overlap::{OverlapResult, calculate_overlap};
use crate::core::registry::{FundEntry, FundRegistry};
use crate::providers::fetcher::{SecFetcher, UserAgent};
use crate::providers::locator::FilingLocator;
use crate::providers::nport::extract_holdings;
use crate::store::KeyValueStore;
use anyhow::Result;
use tracing::{debug, info, instrument, warn};

/// Name of the cache collection holding fund snapshots.
pub const HOLDINGS_COLLECTION: &str = "holdings";

pub struct HoldingsService {
    registry: FundRegistry,
    cache: HoldingsCache,
    fetcher: SecFetcher,
    locator: FilingLocator,
}

impl HoldingsService {
    pub fn new(
        registry: FundRegistry,
        cache: HoldingsCache,
        fetcher: SecFetcher,
        locator: FilingLocator,
    ) -> Self {
        Self {
            registry,
            cache,
            fetcher,
            locator,
        }
    }

    pub fn from_config(config: &AppConfig, store: &KeyValueStore) -> Result<Self> {
        let user_agent = UserAgent::new(&config.user_agent.app, &config.user_agent.contact)?;
        let fetcher = SecFetcher::new(&user_agent, config.request_delay())?;
        let locator = FilingLocator::new(
            &config.providers.sec.data_url,
            &config.providers.sec.archives_url,
        );
        let cache = HoldingsCache::with_max_age(
            store.get_collection(HOLDINGS_COLLECTION, true),
            config.cache_max_age(),
        );

        Ok(Self::new(
            FundRegistry::new(config.funds.clone()),
            cache,
            fetcher,
            locator,
        ))
    }

    pub fn available_funds(&self) -> &[FundEntry] {
        self.registry.funds()
    }

    fn resolve(&self, ticker: &str) -> Result<&FundEntry, HoldingsError> {
        self.registry
            .resolve(ticker)
            .ok_or_else(|| HoldingsError::NotFound {
                ticker: ticker.trim().to_uppercase(),
                available: self.registry.tickers(),
            })
    }

    /// Holdings of `ticker`, from the cache when fresh, otherwise from the
    /// fund's latest N-PORT filing. A fetched snapshot is always written back
    /// to the cache, also when `force_refresh` skipped the lookup.
    #[instrument(name = "GetHoldings", skip(self))]
    pub async fn get_holdings(
        &self,
        ticker: &str,
        force_refresh: bool,
    ) -> Result<HoldingsSnapshot, HoldingsError> {
        let fund = self.resolve(ticker)?;

        if !force_refresh {
            if let Some(cached) = self.cache.get(&fund.ticker).await {
                info!("Loaded {} holdings from cache", fund.ticker);
                return Ok(cached);
            }
        }

        let Some(filing_url) = self
            .locator
            .latest_nport_url(&self.fetcher, &fund.cik)
            .await
        else {
            return Err(HoldingsError::unavailable(
                &fund.ticker,
                "no N-PORT filing found",
            ));
        };

        info!("Fetching N-PORT filing from: {}", filing_url);
        let xml = self.fetcher.fetch(&filing_url).await.map_err(|e| {
            warn!("Failed to fetch N-PORT filing: {}", e);
            HoldingsError::unavailable(&fund.ticker, e.to_string())
        })?;

        let extraction = extract_holdings(&xml);
        if extraction.holdings.is_empty() {
            warn!("No holdings found in N-PORT filing for {}", fund.ticker);
            return Err(HoldingsError::unavailable(
                &fund.ticker,
                "no holdings found in N-PORT filing",
            ));
        }

        let snapshot = HoldingsSnapshot::new(
            &fund.ticker,
            &fund.name,
            extraction.holdings,
            extraction.as_of_date,
        );
        self.cache.put(&snapshot).await;
        debug!(
            "Fetched {} holdings for {}",
            snapshot.holdings.len(),
            snapshot.ticker
        );

        Ok(snapshot)
    }

    /// Overlap between two registered funds. Both tickers are checked before
    /// anything is fetched; the two holdings lookups then run concurrently.
    #[instrument(name = "AnalyzeOverlap", skip(self))]
    pub async fn analyze_overlap(
        &self,
        ticker1: &str,
        ticker2: &str,
    ) -> Result<OverlapResult, HoldingsError> {
        let fund1 = self.resolve(ticker1)?;
        let fund2 = self.resolve(ticker2)?;
        if fund1.ticker == fund2.ticker {
            return Err(HoldingsError::InvalidRequest);
        }

        let (holdings1, holdings2) = futures::try_join!(
            self.get_holdings(&fund1.ticker, false),
            self.get_holdings(&fund2.ticker, false)
        )?;

        Ok(calculate_overlap(&holdings1, &holdings2))
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}
