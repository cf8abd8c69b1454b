//! Transactional email endpoints.

use std::sync::Arc;

use fluxbase_domain::{FluxbaseError, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::http::HttpClient;

use super::join_url;

/// Client for `/mail/*` endpoints.
#[derive(Clone)]
pub struct MailService {
    http: Arc<HttpClient>,
    base_url: String,
}

/// An outgoing email message. At least one of `text` and `html` should be
/// set; the backend rejects empty messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub to: Vec<String>,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateRequest<'a> {
    template_id: &'a str,
    to: &'a [String],
    variables: Value,
}

impl MailService {
    pub(crate) fn new(http: Arc<HttpClient>, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Send a message, returning the server-assigned message id.
    #[instrument(skip(self, message), fields(recipients = message.to.len()))]
    pub async fn send(&self, message: &Message) -> Result<String> {
        let url = join_url(&self.base_url, "mail/send");
        let request = self.http.request(Method::POST, url).json(message);
        let response: SendResponse = self.http.send_json(request).await?;
        Ok(response.id)
    }

    /// Render a server-side template and send it, returning the message id.
    #[instrument(skip(self, variables), fields(template_id = %template_id))]
    pub async fn send_template(
        &self,
        template_id: &str,
        to: &[String],
        variables: impl Serialize,
    ) -> Result<String> {
        let variables = serde_json::to_value(variables).map_err(|e| {
            FluxbaseError::InvalidInput(format!("failed to serialize template variables: {e}"))
        })?;
        let url = join_url(&self.base_url, "mail/template");
        let request =
            self.http.request(Method::POST, url).json(&TemplateRequest { template_id, to, variables });
        let response: SendResponse = self.http.send_json(request).await?;
        Ok(response.id)
    }
}
