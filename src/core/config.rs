use crate::core::registry::{FundEntry, default_funds};
use crate::providers::fetcher::SecFetcher;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

/// Identification sent with every SEC request, as required by EDGAR's fair
/// access policy.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UserAgentConfig {
    pub app: String,
    pub contact: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        UserAgentConfig {
            app: "ETF-Overlap-Analyzer/1.0".to_string(),
            contact: "contact@example.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecProviderConfig {
    /// Host of the submissions API.
    pub data_url: String,
    /// Host of the filing archives.
    pub archives_url: String,
}

impl Default for SecProviderConfig {
    fn default() -> Self {
        SecProviderConfig {
            data_url: "https://data.sec.gov".to_string(),
            archives_url: "https://www.sec.gov".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub sec: SecProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_cache_max_age_hours")]
    pub cache_max_age_hours: u64,
    pub data_path: Option<String>,
    #[serde(default = "default_funds")]
    pub funds: Vec<FundEntry>,
}

fn default_request_delay_ms() -> u64 {
    SecFetcher::DEFAULT_REQUEST_DELAY.as_millis() as u64
}

fn default_cache_max_age_hours() -> u64 {
    24
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            user_agent: UserAgentConfig::default(),
            providers: ProvidersConfig::default(),
            request_delay_ms: default_request_delay_ms(),
            cache_max_age_hours: default_cache_max_age_hours(),
            data_path: None,
            funds: default_funds(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no config file has been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "etf-overlap", "etf-overlap")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "etf-overlap", "etf-overlap")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_hours * 60 * 60)
    }
}
