//! Server-side cache endpoints.
//!
//! Pure pass-through: nothing is cached locally. A missing key is a normal
//! outcome (`None` / `false`), not an error.

use std::sync::Arc;

use fluxbase_domain::{FluxbaseError, Result};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::errors::status_to_error;
use crate::http::HttpClient;

use super::join_url;

/// Client for `/cache/*` endpoints.
#[derive(Clone)]
pub struct CacheService {
    http: Arc<HttpClient>,
    base_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ttl_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CounterResponse {
    value: i64,
}

impl CacheService {
    pub(crate) fn new(http: Arc<HttpClient>, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Read a cached value. `None` when the key is missing or expired.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        let url = join_url(&self.base_url, &format!("cache/{key}"));
        let response = self.http.send(self.http.request(Method::GET, url)).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body));
        }

        let entry: CacheEntry = response.json().await.map_err(|err| {
            FluxbaseError::Internal(format!("failed to parse cache entry: {err}"))
        })?;
        Ok(Some(entry.value))
    }

    /// Store a value, optionally expiring after `ttl_seconds`.
    #[instrument(skip(self, value))]
    pub async fn set(&self, key: &str, value: impl Serialize, ttl_seconds: Option<u64>) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| {
            FluxbaseError::InvalidInput(format!("failed to serialize cache value: {e}"))
        })?;
        let url = join_url(&self.base_url, &format!("cache/{key}"));
        let request =
            self.http.request(Method::PUT, url).json(&CacheEntry { value, ttl_seconds });
        self.http.send_checked(request).await?;
        Ok(())
    }

    /// Delete a key, reporting whether it existed.
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let url = join_url(&self.base_url, &format!("cache/{key}"));
        let response = self.http.send(self.http.request(Method::DELETE, url)).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body));
        }
        Ok(true)
    }

    /// Atomically add `by` to a counter key, returning the new value.
    #[instrument(skip(self))]
    pub async fn increment(&self, key: &str, by: i64) -> Result<i64> {
        let url = join_url(&self.base_url, &format!("cache/{key}/increment"));
        let request = self.http.request(Method::POST, url).json(&serde_json::json!({"by": by}));
        let response: CounterResponse = self.http.send_json(request).await?;
        Ok(response.value)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn service(base_url: String) -> CacheService {
        let http = Arc::new(HttpClient::builder().max_attempts(1).build().expect("http client"));
        CacheService::new(http, base_url)
    }

    #[tokio::test]
    async fn get_returns_value_when_present() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cache/greeting"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"value": "hello", "ttlSeconds": 60})),
            )
            .mount(&server)
            .await;

        let value = service(server.uri()).get("greeting").await.expect("value");
        assert_eq!(value, Some(serde_json::json!("hello")));
    }

    #[tokio::test]
    async fn get_returns_none_on_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cache/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let value = service(server.uri()).get("missing").await.expect("value");
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn set_sends_value_and_ttl() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cache/greeting"))
            .and(body_json(serde_json::json!({"value": "hello", "ttlSeconds": 120})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        service(server.uri()).set("greeting", "hello", Some(120)).await.expect("set");
    }

    #[tokio::test]
    async fn increment_returns_new_value() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cache/hits/increment"))
            .and(body_json(serde_json::json!({"by": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 7})))
            .mount(&server)
            .await;

        let value = service(server.uri()).increment("hits", 2).await.expect("value");
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn delete_reports_whether_key_existed() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/cache/there"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/cache/not-there"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cache = service(server.uri());
        assert!(cache.delete("there").await.expect("delete"));
        assert!(!cache.delete("not-there").await.expect("delete"));
    }
}
