//! Static mapping of fund tickers to SEC filer metadata.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundEntry {
    pub ticker: String,
    /// SEC Central Index Key of the trust filing the fund's N-PORT reports.
    pub cik: String,
    pub name: String,
}

impl FundEntry {
    pub fn new(ticker: &str, cik: &str, name: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            cik: cik.to_string(),
            name: name.to_string(),
        }
    }
}

/// Funds known to the application. Built once at startup, never mutated.
#[derive(Debug, Clone)]
pub struct FundRegistry {
    funds: Vec<FundEntry>,
}

impl FundRegistry {
    pub fn new(funds: Vec<FundEntry>) -> Self {
        let funds = funds
            .into_iter()
            .map(|f| FundEntry {
                ticker: f.ticker.trim().to_uppercase(),
                ..f
            })
            .collect();
        Self { funds }
    }

    pub fn resolve(&self, ticker: &str) -> Option<&FundEntry> {
        let ticker = ticker.trim().to_uppercase();
        self.funds.iter().find(|f| f.ticker == ticker)
    }

    pub fn funds(&self) -> &[FundEntry] {
        &self.funds
    }

    pub fn tickers(&self) -> Vec<String> {
        self.funds.iter().map(|f| f.ticker.clone()).collect()
    }
}

impl Default for FundRegistry {
    fn default() -> Self {
        Self::new(default_funds())
    }
}

pub fn default_funds() -> Vec<FundEntry> {
    vec![
        FundEntry::new("SPY", "0000884394", "SPDR S&P 500 ETF Trust"),
        FundEntry::new("QQQ", "0001067839", "Invesco QQQ Trust"),
        FundEntry::new("IVV", "0000893818", "iShares Core S&P 500 ETF"),
        FundEntry::new("VOO", "0000102909", "Vanguard S&P 500 ETF"),
        FundEntry::new("VTI", "0000102909", "Vanguard Total Stock Market ETF"),
    ]
}
