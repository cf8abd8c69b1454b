//! Object storage endpoints: buckets and byte-payload objects.
//!
//! Payloads are in-memory byte buffers; filesystem streaming is outside the
//! SDK's scope.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fluxbase_domain::Result;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::http::HttpClient;

use super::join_url;

/// Client for `/storage/*` endpoints.
#[derive(Clone)]
pub struct StorageService {
    http: Arc<HttpClient>,
    base_url: String,
}

/// A storage bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub name: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Metadata for a stored object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct BucketListResponse {
    buckets: Vec<Bucket>,
}

#[derive(Debug, Deserialize)]
struct ObjectListResponse {
    objects: Vec<ObjectInfo>,
}

impl StorageService {
    pub(crate) fn new(http: Arc<HttpClient>, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Create a bucket.
    #[instrument(skip(self))]
    pub async fn create_bucket(&self, name: &str) -> Result<Bucket> {
        let url = join_url(&self.base_url, "storage/buckets");
        let request = self.http.request(Method::POST, url).json(&serde_json::json!({"name": name}));
        self.http.send_json(request).await
    }

    /// List all buckets.
    pub async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let url = join_url(&self.base_url, "storage/buckets");
        let request = self.http.request(Method::GET, url);
        let response: BucketListResponse = self.http.send_json(request).await?;
        Ok(response.buckets)
    }

    /// Delete a bucket. The backend rejects non-empty buckets.
    #[instrument(skip(self))]
    pub async fn delete_bucket(&self, name: &str) -> Result<()> {
        let url = join_url(&self.base_url, &format!("storage/buckets/{name}"));
        self.http.send_checked(self.http.request(Method::DELETE, url)).await?;
        Ok(())
    }

    /// Upload an object from an in-memory buffer.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<ObjectInfo> {
        let url = join_url(&self.base_url, &format!("storage/buckets/{bucket}/objects/{key}"));
        let request =
            self.http.request(Method::POST, url).header(CONTENT_TYPE, content_type).body(bytes);
        self.http.send_json(request).await
    }

    /// Download an object's bytes.
    #[instrument(skip(self))]
    pub async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let url = join_url(&self.base_url, &format!("storage/buckets/{bucket}/objects/{key}"));
        let response = self.http.send_checked(self.http.request(Method::GET, url)).await?;
        let bytes = response.bytes().await.map_err(|err| {
            fluxbase_domain::FluxbaseError::Network(format!("failed to read object body: {err}"))
        })?;
        Ok(bytes.to_vec())
    }

    /// Fetch object metadata without the payload.
    pub async fn object_info(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        let url =
            join_url(&self.base_url, &format!("storage/buckets/{bucket}/objects/{key}/info"));
        self.http.send_json(self.http.request(Method::GET, url)).await
    }

    /// List objects in a bucket, optionally under a key prefix.
    pub async fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<ObjectInfo>> {
        let url = join_url(&self.base_url, &format!("storage/buckets/{bucket}/objects"));
        let mut request = self.http.request(Method::GET, url);
        if let Some(prefix) = prefix {
            request = request.query(&[("prefix", prefix)]);
        }
        let response: ObjectListResponse = self.http.send_json(request).await?;
        Ok(response.objects)
    }

    /// Delete an object.
    #[instrument(skip(self))]
    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let url = join_url(&self.base_url, &format!("storage/buckets/{bucket}/objects/{key}"));
        self.http.send_checked(self.http.request(Method::DELETE, url)).await?;
        Ok(())
    }
}
