//! Client configuration

use serde::{Deserialize, Serialize};

/// Top-level SDK configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the Fluxbase API, e.g. `https://api.fluxbase.io/v1`
    pub base_url: String,
    /// Platform API key, attached as a bearer token to every request
    #[serde(skip_serializing)]
    pub api_key: String,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    /// Total number of attempts per request (initial try + retries)
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

/// Analytics event buffering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Number of buffered events that triggers an automatic flush
    pub batch_size: usize,
}

impl ClientConfig {
    /// Build a configuration from the two required values, with defaults
    /// for everything else.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            http: HttpConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30, max_attempts: 3, base_backoff_ms: 200 }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { batch_size: 20 }
    }
}
