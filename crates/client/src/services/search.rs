//! Full-text search endpoints.

use std::sync::Arc;

use fluxbase_domain::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::http::HttpClient;

use super::join_url;

/// Client for `/search/*` endpoints.
#[derive(Clone)]
pub struct SearchService {
    http: Arc<HttpClient>,
    base_url: String,
}

/// Optional knobs for a search query.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

/// A single matching document with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    pub document: Value,
}

/// Search results envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(flatten)]
    options: &'a SearchOptions,
}

impl SearchService {
    pub(crate) fn new(http: Arc<HttpClient>, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Run a text query against an index.
    #[instrument(skip(self, options), fields(index = %index))]
    pub async fn query(
        &self,
        index: &str,
        text: &str,
        options: &SearchOptions,
    ) -> Result<SearchResults> {
        let url = join_url(&self.base_url, &format!("search/{index}/query"));
        let request =
            self.http.request(Method::POST, url).json(&SearchRequest { query: text, options });
        self.http.send_json(request).await
    }

    /// Add or replace a document in an index.
    #[instrument(skip(self, document), fields(index = %index, id = %id))]
    pub async fn index_document(
        &self,
        index: &str,
        id: &str,
        document: impl Serialize,
    ) -> Result<()> {
        let url = join_url(&self.base_url, &format!("search/{index}/documents/{id}"));
        let request = self.http.request(Method::PUT, url).json(&document);
        self.http.send_checked(request).await?;
        Ok(())
    }

    /// Remove a document from an index.
    #[instrument(skip(self), fields(index = %index, id = %id))]
    pub async fn delete_document(&self, index: &str, id: &str) -> Result<()> {
        let url = join_url(&self.base_url, &format!("search/{index}/documents/{id}"));
        self.http.send_checked(self.http.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn service(base_url: String) -> SearchService {
        let http = Arc::new(HttpClient::builder().max_attempts(1).build().expect("http client"));
        SearchService::new(http, base_url)
    }

    #[tokio::test]
    async fn query_sends_text_and_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search/articles/query"))
            .and(body_json(serde_json::json!({"query": "rust sdk", "limit": 5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hits": [{"id": "d1", "score": 0.93, "document": {"title": "Rust SDK"}}],
                "total": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = SearchOptions { limit: Some(5), offset: None };
        let results =
            service(server.uri()).query("articles", "rust sdk", &options).await.expect("results");
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].id, "d1");
        assert!(results.hits[0].score > 0.9);
    }

    #[tokio::test]
    async fn empty_result_set_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search/articles/query"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"hits": [], "total": 0})),
            )
            .mount(&server)
            .await;

        let results = service(server.uri())
            .query("articles", "no matches", &SearchOptions::default())
            .await
            .expect("results");
        assert!(results.hits.is_empty());
    }

    #[tokio::test]
    async fn index_document_puts_payload() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/search/articles/documents/d1"))
            .and(body_json(serde_json::json!({"title": "Hello"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        service(server.uri())
            .index_document("articles", "d1", serde_json::json!({"title": "Hello"}))
            .await
            .expect("indexed");
    }
}
