//! Analytics event tracking with client-side batching.
//!
//! Events are buffered in memory and shipped in one POST per batch: either
//! automatically once the buffer reaches the configured batch size, or
//! explicitly via [`AnalyticsService::flush`]. If a flush fails the drained
//! events are restored to the buffer so a later flush can retry them.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use fluxbase_domain::{FluxbaseError, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::http::HttpClient;

use super::join_url;

/// A single tracked event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    /// Client-generated id, usable for server-side deduplication.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct EventBatchRequest<'a> {
    events: &'a [AnalyticsEvent],
}

/// Client for `/analytics/events` with a shared in-memory buffer.
///
/// All handles cloned from the same [`Client`](crate::client::Client) share
/// one buffer.
#[derive(Clone)]
pub struct AnalyticsService {
    http: Arc<HttpClient>,
    base_url: String,
    buffer: Arc<Mutex<Vec<AnalyticsEvent>>>,
    batch_size: usize,
}

impl AnalyticsService {
    pub(crate) fn new(
        http: Arc<HttpClient>,
        base_url: String,
        buffer: Arc<Mutex<Vec<AnalyticsEvent>>>,
        batch_size: usize,
    ) -> Self {
        Self { http, base_url, buffer, batch_size: batch_size.max(1) }
    }

    /// Buffer an event, flushing automatically when the buffer reaches the
    /// batch size.
    ///
    /// # Errors
    /// Fails if the payload does not serialize to a JSON object, or if an
    /// automatic flush fails.
    pub async fn track(&self, name: &str, properties: impl Serialize) -> Result<()> {
        let properties = match serde_json::to_value(properties) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(serde_json::Value::Null) => serde_json::Map::new(),
            Ok(_) => {
                return Err(FluxbaseError::InvalidInput(
                    "event properties must serialize to a JSON object".into(),
                ))
            }
            Err(e) => {
                return Err(FluxbaseError::InvalidInput(format!(
                    "failed to serialize event properties: {e}"
                )))
            }
        };

        let event = AnalyticsEvent {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            properties,
            timestamp: Utc::now(),
        };

        let should_flush = {
            let mut buffer = self.buffer.lock().map_err(|_| poisoned())?;
            buffer.push(event);
            buffer.len() >= self.batch_size
        };

        if should_flush {
            self.flush().await?;
        }
        Ok(())
    }

    /// Ship all buffered events in one request. A no-op returning `Ok(0)`
    /// when the buffer is empty.
    #[instrument(skip(self))]
    pub async fn flush(&self) -> Result<usize> {
        let events: Vec<AnalyticsEvent> = {
            let mut buffer = self.buffer.lock().map_err(|_| poisoned())?;
            buffer.drain(..).collect()
        };

        if events.is_empty() {
            return Ok(0);
        }

        debug!(count = events.len(), "flushing analytics events");

        let url = join_url(&self.base_url, "analytics/events");
        let request =
            self.http.request(Method::POST, url).json(&EventBatchRequest { events: &events });

        match self.http.send_checked(request).await {
            Ok(_) => Ok(events.len()),
            Err(err) => {
                // Restore on failure so the events are not lost.
                let mut buffer = self.buffer.lock().map_err(|_| poisoned())?;
                let mut restored = events;
                restored.append(&mut buffer);
                *buffer = restored;
                Err(err)
            }
        }
    }

    /// Number of events currently buffered.
    pub fn pending(&self) -> usize {
        self.buffer.lock().map(|buffer| buffer.len()).unwrap_or(0)
    }
}

fn poisoned() -> FluxbaseError {
    FluxbaseError::Internal("analytics buffer mutex poisoned".into())
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn service(base_url: String, batch_size: usize) -> AnalyticsService {
        let http = Arc::new(HttpClient::builder().max_attempts(1).build().expect("http client"));
        AnalyticsService::new(http, base_url, Arc::new(Mutex::new(Vec::new())), batch_size)
    }

    #[tokio::test]
    async fn buffers_until_batch_size_then_flushes_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analytics/events"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let analytics = service(server.uri(), 3);
        analytics.track("page_view", serde_json::json!({"path": "/a"})).await.unwrap();
        analytics.track("page_view", serde_json::json!({"path": "/b"})).await.unwrap();
        assert_eq!(analytics.pending(), 2);

        analytics.track("page_view", serde_json::json!({"path": "/c"})).await.unwrap();
        assert_eq!(analytics.pending(), 0);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["events"].as_array().unwrap().len(), 3);
        assert_eq!(body["events"][0]["name"], "page_view");
        assert!(body["events"][0]["id"].as_str().is_some());
    }

    #[tokio::test]
    async fn flushing_empty_buffer_sends_nothing() {
        let server = MockServer::start().await;
        // No mock mounted: any request would fail the test via the error path.
        let analytics = service(server.uri(), 10);
        let flushed = analytics.flush().await.expect("flush");
        assert_eq!(flushed, 0);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_flush_restores_events() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analytics/events"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let analytics = service(server.uri(), 10);
        analytics.track("signup", serde_json::json!({})).await.unwrap();
        assert!(analytics.flush().await.is_err());
        assert_eq!(analytics.pending(), 1);
    }

    #[tokio::test]
    async fn rejects_non_object_properties() {
        let analytics = service("http://localhost:9".into(), 10);
        let result = analytics.track("bad", serde_json::json!([1, 2])).await;
        assert!(matches!(result, Err(FluxbaseError::InvalidInput(_))));
    }
}
