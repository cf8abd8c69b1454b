//! Top-level client entry point.
//!
//! A [`Client`] owns the shared HTTP transport (with the platform API key
//! attached) and hands out per-domain service wrappers and query builders.
//! Cloning is cheap; clones share the transport and the analytics buffer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fluxbase_domain::{ClientConfig, FluxbaseError, Result};
use url::Url;

use crate::http::HttpClient;
use crate::query::QueryBuilder;
use crate::services::analytics::AnalyticsEvent;
use crate::services::{
    join_url, AiService, AnalyticsService, AuthService, CacheService, MailService, QueueService,
    SearchService, StorageService, WorkflowService,
};

/// Handle to one Fluxbase project.
#[derive(Clone)]
pub struct Client {
    http: Arc<HttpClient>,
    base_url: String,
    analytics_buffer: Arc<Mutex<Vec<AnalyticsEvent>>>,
    analytics_batch_size: usize,
}

impl Client {
    /// Build a client from an explicit configuration.
    ///
    /// # Errors
    /// Returns `FluxbaseError::Config` if the base URL does not parse as an
    /// http(s) URL or the API key is empty.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(FluxbaseError::Config("api key must not be empty".into()));
        }

        let base = Url::parse(&config.base_url)
            .map_err(|e| FluxbaseError::Config(format!("invalid base url: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(FluxbaseError::Config(format!(
                "unsupported base url scheme: {}",
                base.scheme()
            )));
        }

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.http.timeout_seconds))
            .max_attempts(config.http.max_attempts)
            .base_backoff(Duration::from_millis(config.http.base_backoff_ms))
            .api_key(config.api_key.as_str())
            .user_agent(format!("fluxbase-client/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http: Arc::new(http),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            analytics_buffer: Arc::new(Mutex::new(Vec::new())),
            analytics_batch_size: config.analytics.batch_size,
        })
    }

    /// Build a client from environment variables, falling back to a config
    /// file (see [`crate::config::load`]).
    pub fn from_env() -> Result<Self> {
        Self::new(crate::config::load()?)
    }

    /// Start a query against a table. Each call returns a fresh builder.
    pub fn table(&self, name: &str) -> QueryBuilder {
        QueryBuilder::new(self.http.clone(), join_url(&self.base_url, "query"), name)
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.http.clone(), self.base_url.clone())
    }

    pub fn storage(&self) -> StorageService {
        StorageService::new(self.http.clone(), self.base_url.clone())
    }

    pub fn search(&self) -> SearchService {
        SearchService::new(self.http.clone(), self.base_url.clone())
    }

    /// Analytics handle. All handles from this client (and its clones)
    /// share one event buffer.
    pub fn analytics(&self) -> AnalyticsService {
        AnalyticsService::new(
            self.http.clone(),
            self.base_url.clone(),
            self.analytics_buffer.clone(),
            self.analytics_batch_size,
        )
    }

    pub fn cache(&self) -> CacheService {
        CacheService::new(self.http.clone(), self.base_url.clone())
    }

    pub fn mail(&self) -> MailService {
        MailService::new(self.http.clone(), self.base_url.clone())
    }

    pub fn queue(&self) -> QueueService {
        QueueService::new(self.http.clone(), self.base_url.clone())
    }

    pub fn workflow(&self) -> WorkflowService {
        WorkflowService::new(self.http.clone(), self.base_url.clone())
    }

    pub fn ai(&self) -> AiService {
        AiService::new(self.http.clone(), self.base_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use fluxbase_domain::QueryType;

    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new("https://api.fluxbase.io/v1", "fx-test-key")
    }

    #[test]
    fn builds_from_valid_config() {
        assert!(Client::new(config()).is_ok());
    }

    #[test]
    fn rejects_empty_api_key() {
        let mut config = config();
        config.api_key = "  ".into();
        assert!(matches!(Client::new(config), Err(FluxbaseError::Config(_))));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut config = config();
        config.base_url = "ftp://api.fluxbase.io".into();
        assert!(matches!(Client::new(config), Err(FluxbaseError::Config(_))));
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let mut config = config();
        config.base_url = "not a url".into();
        assert!(matches!(Client::new(config), Err(FluxbaseError::Config(_))));
    }

    #[test]
    fn table_returns_fresh_select_builder() {
        let client = Client::new(config()).expect("client");
        let query = client.table("users").to_query();
        assert_eq!(query.query_type, QueryType::Select);
        assert_eq!(query.table, "users");
        assert!(query.where_clause.is_empty());
    }
}
