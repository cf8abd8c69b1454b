//! Auth endpoints: user sign-up, sign-in and session lookup.
//!
//! The SDK itself only attaches the static platform key; session tokens
//! returned here are handed back to the caller, never stored.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fluxbase_domain::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::http::HttpClient;

use super::join_url;

/// Header carrying a user session token on session-scoped calls.
const SESSION_TOKEN_HEADER: &str = "X-Session-Token";

/// Client for `/auth/*` endpoints.
#[derive(Clone)]
pub struct AuthService {
    http: Arc<HttpClient>,
    base_url: String,
}

/// A platform user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An authenticated session, as returned by sign-up and sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Debug, Serialize)]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl AuthService {
    pub(crate) fn new(http: Arc<HttpClient>, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Register a new user and open a session for them.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let url = join_url(&self.base_url, "auth/signup");
        let request =
            self.http.request(Method::POST, url).json(&CredentialsRequest { email, password });
        self.http.send_json(request).await
    }

    /// Open a session for an existing user.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let url = join_url(&self.base_url, "auth/signin");
        let request =
            self.http.request(Method::POST, url).json(&CredentialsRequest { email, password });
        self.http.send_json(request).await
    }

    /// Invalidate a session token server-side.
    #[instrument(skip(self, access_token))]
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let url = join_url(&self.base_url, "auth/signout");
        let request =
            self.http.request(Method::POST, url).header(SESSION_TOKEN_HEADER, access_token);
        self.http.send_checked(request).await?;
        Ok(())
    }

    /// Fetch the user the given session token belongs to.
    #[instrument(skip(self, access_token))]
    pub async fn current_user(&self, access_token: &str) -> Result<User> {
        let url = join_url(&self.base_url, "auth/user");
        let request =
            self.http.request(Method::GET, url).header(SESSION_TOKEN_HEADER, access_token);
        self.http.send_json(request).await
    }
}
