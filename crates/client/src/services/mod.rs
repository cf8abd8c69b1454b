//! Per-domain service wrappers.
//!
//! Each wrapper is a thin typed facade over a fixed set of REST endpoints:
//! one method call, one HTTP round trip. Wrappers share the client's
//! [`HttpClient`](crate::http::HttpClient) and base URL; the only one with
//! client-side state is [`analytics`] (event batching).

pub mod ai;
pub mod analytics;
pub mod auth;
pub mod cache;
pub mod mail;
pub mod queue;
pub mod search;
pub mod storage;
pub mod workflow;

pub use ai::AiService;
pub use analytics::AnalyticsService;
pub use auth::AuthService;
pub use cache::CacheService;
pub use mail::MailService;
pub use queue::QueueService;
pub use search::SearchService;
pub use storage::StorageService;
pub use workflow::WorkflowService;

/// Join a base URL and a relative endpoint path.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
