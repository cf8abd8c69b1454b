//! AI endpoints: text completion and embeddings.
//!
//! The backend fronts its own model pool; the SDK only shapes requests and
//! reports token usage back to the caller.

use std::sync::Arc;

use fluxbase_domain::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::http::HttpClient;

use super::join_url;

/// Client for `/ai/*` endpoints.
#[derive(Clone)]
pub struct AiService {
    http: Arc<HttpClient>,
    base_url: String,
}

/// Optional knobs for a completion request. Unset fields use the platform's
/// project-level defaults.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A completion with its token accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub text: String,
    pub model: String,
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest<'a> {
    prompt: &'a str,
    #[serde(flatten)]
    options: &'a CompletionOptions,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl AiService {
    pub(crate) fn new(http: Arc<HttpClient>, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Generate a completion for a prompt.
    #[instrument(skip(self, prompt, options))]
    pub async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<Completion> {
        let url = join_url(&self.base_url, "ai/complete");
        let request =
            self.http.request(Method::POST, url).json(&CompletionRequest { prompt, options });
        let completion: Completion = self.http.send_json(request).await?;

        debug!(
            model = %completion.model,
            tokens = completion.prompt_tokens + completion.completion_tokens,
            "completion finished"
        );
        Ok(completion)
    }

    /// Compute an embedding vector for a piece of text.
    #[instrument(skip(self, input))]
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>> {
        let url = join_url(&self.base_url, "ai/embeddings");
        let request =
            self.http.request(Method::POST, url).json(&serde_json::json!({"input": input}));
        let response: EmbeddingResponse = self.http.send_json(request).await?;
        Ok(response.embedding)
    }
}

#[cfg(test)]
mod tests {
    use fluxbase_domain::FluxbaseError;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn service(base_url: String) -> AiService {
        let http = Arc::new(HttpClient::builder().max_attempts(1).build().expect("http client"));
        AiService::new(http, base_url)
    }

    #[tokio::test]
    async fn complete_flattens_options_into_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ai/complete"))
            .and(body_json(serde_json::json!({
                "prompt": "Say hi",
                "maxTokens": 16
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "text": "Hi!",
                "model": "flux-small",
                "promptTokens": 3,
                "completionTokens": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = CompletionOptions { max_tokens: Some(16), ..CompletionOptions::default() };
        let completion = service(server.uri()).complete("Say hi", &options).await.expect("completion");
        assert_eq!(completion.text, "Hi!");
        assert_eq!(completion.completion_tokens, 2);
    }

    #[tokio::test]
    async fn embed_returns_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ai/embeddings"))
            .and(body_json(serde_json::json!({"input": "hello"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embedding": [0.1, 0.2, 0.3]})),
            )
            .mount(&server)
            .await;

        let embedding = service(server.uri()).embed("hello").await.expect("embedding");
        assert_eq!(embedding.len(), 3);
    }

    #[tokio::test]
    async fn over_quota_surfaces_api_error_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ai/complete"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(serde_json::json!({"message": "token budget exhausted"})),
            )
            .mount(&server)
            .await;

        let result =
            service(server.uri()).complete("hi", &CompletionOptions::default()).await;
        match result {
            Err(FluxbaseError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert!(message.contains("budget"));
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }
}
