use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the API base URL
pub const API_URL_ENV: &str = "INCIDENT_API_URL";

/// Environment variable pointing at an optional override file
pub const CONFIG_PATH_ENV: &str = "INCIDENT_CONFIG_PATH";

const DEFAULT_CONFIG_PATH: &str = "config/incident-report.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API configuration
    pub api: ApiConfig,

    /// Query cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// List view configuration
    #[serde(default)]
    pub list: ListConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let api_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty());

        Self::from_sources(&config_path, api_url)
    }

    /// Build configuration from an optional file and an explicit base URL override
    pub fn from_sources(
        config_path: &str,
        api_url: Option<String>,
    ) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(config_path).required(false))
            // Override with environment variables (e.g. INCIDENT_REPORT__API__BASE_URL)
            .add_source(
                config::Environment::with_prefix("INCIDENT_REPORT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("api.base_url", api_url)?
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every resource path is joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Age after which a cached read is served stale and refreshed
    #[serde(default = "default_stale_time")]
    pub stale_time_secs: u64,
}

impl CacheConfig {
    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: default_stale_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    /// Rows per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Quiet period before search text is sent to the server
    #[serde(default = "default_search_debounce")]
    pub search_debounce_ms: u64,
}

impl ListConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_stale_time() -> u64 {
    30
}

fn default_page_size() -> u32 {
    10
}

fn default_search_debounce() -> u64 {
    500
}

fn default_log_level() -> String {
    "warn".to_string()
}
