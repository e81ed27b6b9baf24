//! Rate-limited HTTP access to SEC EDGAR.

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// The `User-Agent` EDGAR requires on every request: an application name and
/// a contact point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent(String);

impl UserAgent {
    pub fn new(app: &str, contact: &str) -> Result<Self> {
        let (app, contact) = (app.trim(), contact.trim());
        if app.is_empty() || contact.is_empty() {
            bail!("SEC requests need a User-Agent with an application name and a contact");
        }
        Ok(Self(format!("{app} ({contact})")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: StatusCode },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Issues GET requests to EDGAR, starting at most one request per
/// `request_delay`.
///
/// The spacing holds across concurrent callers sharing the fetcher. A fetcher
/// can only be built from a [`UserAgent`], so every request is identified.
/// Failures are returned as-is; retrying is up to the caller.
pub struct SecFetcher {
    client: reqwest::Client,
    request_delay: Duration,
    /// Start time of the previous request.
    last_request: Mutex<Option<Instant>>,
}

impl SecFetcher {
    pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);

    pub fn new(user_agent: &UserAgent, request_delay: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.as_str())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            request_delay,
            last_request: Mutex::new(None),
        })
    }

    /// Waits until `request_delay` has passed since the previous request
    /// started, then claims the slot. The lock is held while waiting, so
    /// concurrent callers go out one after another.
    async fn wait_for_slot(&self) {
        let mut last_request = self.last_request.lock().await;
        if let Some(previous) = *last_request {
            tokio::time::sleep_until(previous + self.request_delay).await;
        }
        *last_request = Some(Instant::now());
    }

    #[instrument(name = "SecFetch", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.wait_for_slot().await;
        debug!("Requesting {}", url);

        let network = |source| FetchError::Network {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(network)
    }
}
