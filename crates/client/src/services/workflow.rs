//! Workflow orchestration endpoints.

use std::sync::Arc;

use fluxbase_domain::{FluxbaseError, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::http::HttpClient;

use super::join_url;

/// Client for `/workflows/*` endpoints.
#[derive(Clone)]
pub struct WorkflowService {
    http: Arc<HttpClient>,
    base_url: String,
}

/// Lifecycle state of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// A workflow run as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    pub id: String,
    pub workflow: String,
    pub status: RunStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TriggerResponse {
    id: String,
}

impl WorkflowService {
    pub(crate) fn new(http: Arc<HttpClient>, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Start a run of a named workflow, returning the run id.
    #[instrument(skip(self, input), fields(workflow = %name))]
    pub async fn trigger(&self, name: &str, input: impl Serialize) -> Result<String> {
        let input = serde_json::to_value(input).map_err(|e| {
            FluxbaseError::InvalidInput(format!("failed to serialize workflow input: {e}"))
        })?;
        let url = join_url(&self.base_url, &format!("workflows/{name}/runs"));
        let request =
            self.http.request(Method::POST, url).json(&serde_json::json!({"input": input}));
        let response: TriggerResponse = self.http.send_json(request).await?;
        Ok(response.id)
    }

    /// Look up the current state of a run.
    #[instrument(skip(self), fields(run_id = %run_id))]
    pub async fn run_status(&self, run_id: &str) -> Result<WorkflowRun> {
        let url = join_url(&self.base_url, &format!("workflows/runs/{run_id}"));
        self.http.send_json(self.http.request(Method::GET, url)).await
    }

    /// Request cancellation of a run. Completed runs cannot be cancelled;
    /// the backend answers with a conflict in that case.
    #[instrument(skip(self), fields(run_id = %run_id))]
    pub async fn cancel(&self, run_id: &str) -> Result<()> {
        let url = join_url(&self.base_url, &format!("workflows/runs/{run_id}/cancel"));
        self.http.send_checked(self.http.request(Method::POST, url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn service(base_url: String) -> WorkflowService {
        let http = Arc::new(HttpClient::builder().max_attempts(1).build().expect("http client"));
        WorkflowService::new(http, base_url)
    }

    #[tokio::test]
    async fn trigger_wraps_input_and_returns_run_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/workflows/onboarding/runs"))
            .and(body_json(serde_json::json!({"input": {"userId": "u1"}})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "run-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = service(server.uri())
            .trigger("onboarding", serde_json::json!({"userId": "u1"}))
            .await
            .expect("run id");
        assert_eq!(id, "run-1");
    }

    #[tokio::test]
    async fn run_status_parses_terminal_states() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/workflows/runs/run-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "run-1",
                "workflow": "onboarding",
                "status": "failed",
                "error": "step 3 timed out"
            })))
            .mount(&server)
            .await;

        let run = service(server.uri()).run_status("run-1").await.expect("run");
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error.as_deref(), Some("step 3 timed out"));
    }

    #[tokio::test]
    async fn cancelling_finished_run_surfaces_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/workflows/runs/run-1/cancel"))
            .respond_with(ResponseTemplate::new(409).set_body_string("run already completed"))
            .mount(&server)
            .await;

        let result = service(server.uri()).cancel("run-1").await;
        match result {
            Err(FluxbaseError::Api { status, .. }) => assert_eq!(status, 409),
            other => panic!("expected api error, got {:?}", other),
        }
    }
}
