//! Outcomes of a holdings or overlap request that callers must tell apart.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HoldingsError {
    /// The ticker is not in the fund registry. Retrying will not help.
    #[error("ETF '{ticker}' not found. Available ETFs: {}", .available.join(", "))]
    NotFound {
        ticker: String,
        available: Vec<String>,
    },

    /// No filing, a failed fetch, or a filing without usable holdings.
    /// Transient; the caller may try again later.
    #[error("Could not fetch holdings for '{ticker}' ({reason}). SEC data may be unavailable.")]
    UpstreamUnavailable { ticker: String, reason: String },

    /// A fund was compared against itself.
    #[error("Please select two different ETFs to compare.")]
    InvalidRequest,
}

impl HoldingsError {
    pub(crate) fn unavailable(ticker: &str, reason: impl Into<String>) -> Self {
        HoldingsError::UpstreamUnavailable {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit code used by the CLI for this outcome.
    pub fn exit_code(&self) -> u8 {
        match self {
            HoldingsError::NotFound { .. } => 2,
            HoldingsError::UpstreamUnavailable { .. } => 3,
            HoldingsError::InvalidRequest => 4,
        }
    }
}
