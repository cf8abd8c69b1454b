//! Shared helpers for integration tests.

use fluxbase_client::Client;
use fluxbase_domain::{AnalyticsConfig, ClientConfig, HttpConfig};
use once_cell::sync::Lazy;

static TRACING: Lazy<()> = Lazy::new(|| {
    tracing_subscriber::fmt()
        .with_env_filter("fluxbase_client=debug")
        .with_test_writer()
        .try_init()
        .ok();
});

/// Test configuration pointed at a mock server: no retries, tiny timeouts,
/// small analytics batches.
pub fn test_config(base_url: &str) -> ClientConfig {
    Lazy::force(&TRACING);
    ClientConfig {
        base_url: base_url.to_string(),
        api_key: "fx-test-key".to_string(),
        http: HttpConfig { timeout_seconds: 5, max_attempts: 1, base_backoff_ms: 5 },
        analytics: AnalyticsConfig { batch_size: 3 },
    }
}

/// Client wired to a mock server with the default test configuration.
pub fn test_client(base_url: &str) -> Client {
    Client::new(test_config(base_url)).expect("client should build")
}
