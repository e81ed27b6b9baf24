//! Weighted overlap between the holdings of two funds.
//!
//! The overlap of two funds is the sum, over every position held by both, of
//! the smaller of the two weights. If fund 1 holds 3% AAPL and fund 2 holds 5%
//! AAPL, AAPL contributes 3% to the overlap.
//!
//! Matching runs in one direction: fund 1 is indexed and fund 2 is walked
//! against that index, matching on CUSIP first and then on the
//! case-insensitive issuer name. When CUSIP coverage differs between the two
//! funds the name fallback can pair positions differently depending on which
//! fund is indexed, so `calculate_overlap(a, b)` and `calculate_overlap(b, a)`
//! may disagree.

use crate::core::holdings::{Holding, HoldingsSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Number of overlapping positions reported in [`OverlapResult::top_overlapping`].
pub const TOP_OVERLAPPING_LIMIT: usize = 10;

/// A position held by both funds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlappingHolding {
    pub name: String,
    pub cusip: Option<String>,
    pub weight_fund1: f64,
    pub weight_fund2: f64,
    /// `min(weight_fund1, weight_fund2)`
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapResult {
    pub fund1_ticker: String,
    pub fund2_ticker: String,
    pub fund1_name: String,
    pub fund2_name: String,
    /// Sum of all contributions, rounded to two decimals.
    pub overlap_percentage: f64,
    /// Number of matched positions, including the ones not in `top_overlapping`.
    pub common_holdings_count: usize,
    pub fund1_total_holdings: usize,
    pub fund2_total_holdings: usize,
    pub top_overlapping: Vec<OverlappingHolding>,
}

/// Computes the overlap between two funds.
///
/// Pure and deterministic: equal contributions keep the order in which the
/// matching positions appear in `fund2`.
pub fn calculate_overlap(fund1: &HoldingsSnapshot, fund2: &HoldingsSnapshot) -> OverlapResult {
    let mut by_cusip: HashMap<&str, &Holding> = HashMap::new();
    let mut by_name: HashMap<String, &Holding> = HashMap::new();

    for holding in &fund1.holdings {
        if let Some(cusip) = holding.cusip.as_deref() {
            by_cusip.insert(cusip, holding);
        }
        by_name.insert(holding.name.to_uppercase(), holding);
    }

    let mut overlapping = Vec::new();
    let mut total_overlap = 0.0;

    for other in &fund2.holdings {
        let matched = other
            .cusip
            .as_deref()
            .and_then(|cusip| by_cusip.get(cusip))
            .or_else(|| by_name.get(&other.name.to_uppercase()));

        if let Some(held) = matched {
            let contribution = held.percentage.min(other.percentage);
            total_overlap += contribution;

            overlapping.push(OverlappingHolding {
                name: held.name.clone(),
                cusip: held.cusip.clone(),
                weight_fund1: held.percentage,
                weight_fund2: other.percentage,
                contribution,
            });
        }
    }

    // Stable sort, ties keep fund2 order
    overlapping.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
    let common_holdings_count = overlapping.len();
    overlapping.truncate(TOP_OVERLAPPING_LIMIT);

    debug!(
        fund1 = %fund1.ticker,
        fund2 = %fund2.ticker,
        common_holdings_count,
        total_overlap,
        "Calculated overlap"
    );

    OverlapResult {
        fund1_ticker: fund1.ticker.clone(),
        fund2_ticker: fund2.ticker.clone(),
        fund1_name: fund1.name.clone(),
        fund2_name: fund2.name.clone(),
        overlap_percentage: round2(total_overlap),
        common_holdings_count,
        fund1_total_holdings: fund1.holdings.len(),
        fund2_total_holdings: fund2.holdings.len(),
        top_overlapping: overlapping,
    }
}

/// Rounds to two decimals, halves to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(name: &str, cusip: Option<&str>, percentage: f64) -> Holding {
        Holding {
            name: name.to_string(),
            cusip: cusip.map(str::to_string),
            percentage,
            value: None,
        }
    }

    fn snapshot(ticker: &str, name: &str, holdings: Vec<Holding>) -> HoldingsSnapshot {
        HoldingsSnapshot {
            ticker: ticker.to_string(),
            name: name.to_string(),
            holdings,
            as_of_date: None,
        }
    }

    #[test]
    fn test_identical_holdings() {
        let holdings = vec![
            holding("Apple Inc", Some("037833100"), 10.0),
            holding("Microsoft Corp", Some("594918104"), 8.0),
        ];
        let fund1 = snapshot("ETF1", "Test ETF 1", holdings.clone());
        let fund2 = snapshot("ETF2", "Test ETF 2", holdings);

        let result = calculate_overlap(&fund1, &fund2);

        assert_eq!(result.overlap_percentage, 18.0);
        assert_eq!(result.common_holdings_count, 2);
        assert_eq!(result.top_overlapping.len(), 2);
    }

    #[test]
    fn test_self_overlap_is_total_weight() {
        let fund = snapshot(
            "ETF1",
            "Test ETF 1",
            vec![
                holding("Apple Inc", Some("037833100"), 7.25),
                holding("Microsoft Corp", Some("594918104"), 6.5),
                holding("Nvidia Corp", Some("67066G104"), 5.125),
            ],
        );

        let result = calculate_overlap(&fund, &fund);

        assert_eq!(result.overlap_percentage, round2(fund.total_weight()));
        assert_eq!(result.common_holdings_count, 3);
    }

    #[test]
    fn test_no_overlap() {
        let fund1 = snapshot(
            "ETF1",
            "Test ETF 1",
            vec![holding("Apple Inc", Some("037833100"), 10.0)],
        );
        let fund2 = snapshot(
            "ETF2",
            "Test ETF 2",
            vec![holding("Tesla Inc", Some("88160R101"), 5.0)],
        );

        let result = calculate_overlap(&fund1, &fund2);

        assert_eq!(result.overlap_percentage, 0.0);
        assert_eq!(result.common_holdings_count, 0);
        assert!(result.top_overlapping.is_empty());
    }

    #[test]
    fn test_partial_overlap_uses_minimum_weight() {
        let fund1 = snapshot(
            "ETF1",
            "Test ETF 1",
            vec![
                holding("Apple Inc", Some("037833100"), 10.0),
                holding("Microsoft Corp", Some("594918104"), 8.0),
            ],
        );
        let fund2 = snapshot(
            "ETF2",
            "Test ETF 2",
            vec![
                holding("Apple Inc", Some("037833100"), 5.0),
                holding("Tesla Inc", Some("88160R101"), 7.0),
            ],
        );

        let result = calculate_overlap(&fund1, &fund2);

        assert_eq!(result.overlap_percentage, 5.0);
        assert_eq!(result.common_holdings_count, 1);
        assert_eq!(result.top_overlapping[0].contribution, 5.0);
    }

    #[test]
    fn test_name_matching_fallback_is_case_insensitive() {
        let fund1 = snapshot("ETF1", "Test ETF 1", vec![holding("Apple Inc", None, 10.0)]);
        let fund2 = snapshot("ETF2", "Test ETF 2", vec![holding("APPLE INC", None, 8.0)]);

        let result = calculate_overlap(&fund1, &fund2);

        assert_eq!(result.overlap_percentage, 8.0);
        assert_eq!(result.common_holdings_count, 1);
        assert_eq!(result.top_overlapping[0].name, "Apple Inc");
    }

    #[test]
    fn test_unmatched_cusip_falls_back_to_name() {
        let fund1 = snapshot(
            "ETF1",
            "Test ETF 1",
            vec![holding("Alphabet Inc", Some("02079K305"), 4.0)],
        );
        let fund2 = snapshot(
            "ETF2",
            "Test ETF 2",
            vec![holding("ALPHABET INC", Some("02079K107"), 3.0)],
        );

        let result = calculate_overlap(&fund1, &fund2);

        assert_eq!(result.common_holdings_count, 1);
        assert_eq!(result.overlap_percentage, 3.0);
        assert_eq!(result.top_overlapping[0].cusip.as_deref(), Some("02079K305"));
    }

    #[test]
    fn test_top_overlapping_limited_to_10() {
        let holdings: Vec<Holding> = (0..15)
            .map(|i| holding(&format!("Stock {i}"), Some(&format!("CUSIP{i:03}")), 1.0))
            .collect();
        let fund1 = snapshot("ETF1", "Test ETF 1", holdings.clone());
        let fund2 = snapshot("ETF2", "Test ETF 2", holdings);

        let result = calculate_overlap(&fund1, &fund2);

        assert_eq!(result.common_holdings_count, 15);
        assert_eq!(result.top_overlapping.len(), 10);
        assert!(result.common_holdings_count >= result.top_overlapping.len());
        assert_eq!(result.overlap_percentage, 15.0);
        // Equal contributions keep fund2 order
        let names: Vec<&str> = result
            .top_overlapping
            .iter()
            .map(|h| h.name.as_str())
            .collect();
        let expected: Vec<String> = (0..10).map(|i| format!("Stock {i}")).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_top_overlapping_sorted_by_contribution() {
        let fund1 = snapshot(
            "ETF1",
            "Test ETF 1",
            vec![
                holding("A", Some("A00000001"), 1.0),
                holding("B", Some("B00000001"), 6.0),
                holding("C", Some("C00000001"), 3.0),
            ],
        );
        let fund2 = snapshot(
            "ETF2",
            "Test ETF 2",
            vec![
                holding("A", Some("A00000001"), 9.0),
                holding("C", Some("C00000001"), 2.0),
                holding("B", Some("B00000001"), 4.0),
            ],
        );

        let result = calculate_overlap(&fund1, &fund2);

        let contributions: Vec<f64> = result
            .top_overlapping
            .iter()
            .map(|h| h.contribution)
            .collect();
        assert_eq!(contributions, vec![4.0, 2.0, 1.0]);
        assert_eq!(result.overlap_percentage, 7.0);
    }

    #[test]
    fn test_overlap_rounded_once_at_the_end() {
        let fund1 = snapshot(
            "ETF1",
            "Test ETF 1",
            vec![
                holding("A", Some("A00000001"), 0.004),
                holding("B", Some("B00000001"), 0.004),
            ],
        );

        let result = calculate_overlap(&fund1, &fund1);

        // Per-term rounding would give 0.0
        assert_eq!(result.overlap_percentage, 0.01);
    }

    #[test]
    fn test_exact_halves_round_to_even() {
        let fund = snapshot(
            "SPY",
            "SPDR S&P 500",
            vec![
                holding("A", Some("A00000001"), 10.0),
                holding("B", Some("B00000001"), 0.125),
            ],
        );

        let result = calculate_overlap(&fund, &fund);

        assert_eq!(result.overlap_percentage, 10.12);
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn test_result_structure() {
        let fund1 = snapshot(
            "SPY",
            "SPDR S&P 500",
            vec![holding("Apple", Some("037833100"), 7.0)],
        );
        let fund2 = snapshot(
            "QQQ",
            "Invesco QQQ",
            vec![holding("Apple", Some("037833100"), 10.0)],
        );

        let result = calculate_overlap(&fund1, &fund2);

        assert_eq!(result.fund1_ticker, "SPY");
        assert_eq!(result.fund2_ticker, "QQQ");
        assert_eq!(result.fund1_name, "SPDR S&P 500");
        assert_eq!(result.fund2_name, "Invesco QQQ");
        assert_eq!(result.fund1_total_holdings, 1);
        assert_eq!(result.fund2_total_holdings, 1);

        let top = &result.top_overlapping[0];
        assert_eq!(top.weight_fund1, 7.0);
        assert_eq!(top.weight_fund2, 10.0);
        assert_eq!(top.contribution, 7.0);
    }

    #[test]
    fn test_matching_direction_is_asymmetric() {
        // Fund 1 lists the issuer twice (two share classes under one name);
        // the name index keeps the last one. Fund 2 has no CUSIPs.
        let fund1 = snapshot(
            "ETF1",
            "Test ETF 1",
            vec![
                holding("Alphabet Inc", Some("02079K305"), 4.0),
                holding("Alphabet Inc", Some("02079K107"), 1.0),
            ],
        );
        let fund2 = snapshot("ETF2", "Test ETF 2", vec![holding("ALPHABET INC", None, 3.0)]);

        let forward = calculate_overlap(&fund1, &fund2);
        let backward = calculate_overlap(&fund2, &fund1);

        // fund2's single position matches the last indexed share class
        assert_eq!(forward.common_holdings_count, 1);
        assert_eq!(forward.overlap_percentage, 1.0);
        // Walking fund1 against fund2 matches both share classes by name
        assert_eq!(backward.common_holdings_count, 2);
        assert_eq!(backward.overlap_percentage, 4.0);
    }
}
