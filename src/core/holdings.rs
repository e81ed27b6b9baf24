//! Holdings data model shared by the extractor, the cache and the overlap engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single position reported in a fund's N-PORT filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub name: String,
    pub cusip: Option<String>,
    /// Percentage of the fund's net assets.
    pub percentage: f64,
    /// Market value in USD, when the filing reports one.
    pub value: Option<f64>,
}

/// All holdings of one fund at one point in time.
///
/// Snapshots are never mutated after construction; a refresh builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsSnapshot {
    pub ticker: String,
    pub name: String,
    pub holdings: Vec<Holding>,
    pub as_of_date: Option<NaiveDate>,
}

impl HoldingsSnapshot {
    /// Builds a snapshot, keeping positive weights only and ordering them by
    /// descending weight. Equal weights keep their input order.
    pub fn new(
        ticker: &str,
        name: &str,
        holdings: Vec<Holding>,
        as_of_date: Option<NaiveDate>,
    ) -> Self {
        let mut holdings: Vec<Holding> = holdings
            .into_iter()
            .filter(|h| h.percentage > 0.0)
            .collect();
        sort_by_weight(&mut holdings);

        Self {
            ticker: ticker.to_uppercase(),
            name: name.to_string(),
            holdings,
            as_of_date,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.holdings.iter().map(|h| h.percentage).sum()
    }
}

pub(crate) fn sort_by_weight(holdings: &mut [Holding]) {
    holdings.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
}
