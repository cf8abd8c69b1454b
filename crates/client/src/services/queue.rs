//! Background job queue endpoints.

use std::sync::Arc;

use fluxbase_domain::{FluxbaseError, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use crate::http::HttpClient;

use super::join_url;

/// Client for `/queues/*` endpoints.
#[derive(Clone)]
pub struct QueueService {
    http: Arc<HttpClient>,
    base_url: String,
}

/// Lifecycle state of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// A job as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub queue: String,
    pub status: JobStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnqueueRequest {
    payload: Value,
    /// Client-generated key so a retried enqueue cannot double-submit.
    idempotency_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    delay_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct EnqueueResponse {
    id: String,
}

impl QueueService {
    pub(crate) fn new(http: Arc<HttpClient>, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Submit a job, optionally delayed, returning the job id.
    #[instrument(skip(self, payload), fields(queue = %queue))]
    pub async fn enqueue(
        &self,
        queue: &str,
        payload: impl Serialize,
        delay_seconds: Option<u64>,
    ) -> Result<String> {
        let payload = serde_json::to_value(payload).map_err(|e| {
            FluxbaseError::InvalidInput(format!("failed to serialize job payload: {e}"))
        })?;
        let url = join_url(&self.base_url, &format!("queues/{queue}/jobs"));
        let request = self.http.request(Method::POST, url).json(&EnqueueRequest {
            payload,
            idempotency_key: Uuid::new_v4().to_string(),
            delay_seconds,
        });
        let response: EnqueueResponse = self.http.send_json(request).await?;
        Ok(response.id)
    }

    /// Look up the current state of a job.
    #[instrument(skip(self), fields(queue = %queue, id = %id))]
    pub async fn job_status(&self, queue: &str, id: &str) -> Result<Job> {
        let url = join_url(&self.base_url, &format!("queues/{queue}/jobs/{id}"));
        self.http.send_json(self.http.request(Method::GET, url)).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn service(base_url: String) -> QueueService {
        let http = Arc::new(HttpClient::builder().max_attempts(1).build().expect("http client"));
        QueueService::new(http, base_url)
    }

    #[tokio::test]
    async fn enqueue_sends_payload_with_idempotency_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/queues/emails/jobs"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "job-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = service(server.uri())
            .enqueue("emails", serde_json::json!({"to": "a@b.c"}), Some(60))
            .await
            .expect("job id");
        assert_eq!(id, "job-1");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["payload"]["to"], "a@b.c");
        assert_eq!(body["delaySeconds"], 60);
        assert!(body["idempotencyKey"].as_str().is_some());
    }

    #[tokio::test]
    async fn job_status_parses_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/queues/emails/jobs/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "job-1",
                "queue": "emails",
                "status": "completed",
                "attempts": 1,
                "result": {"delivered": true}
            })))
            .mount(&server)
            .await;

        let job = service(server.uri()).job_status("emails", "job-1").await.expect("job");
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result, Some(serde_json::json!({"delivered": true})));
    }

    #[tokio::test]
    async fn unknown_job_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/queues/emails/jobs/nope"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = service(server.uri()).job_status("emails", "nope").await;
        assert!(matches!(result, Err(FluxbaseError::NotFound(_))));
    }
}
