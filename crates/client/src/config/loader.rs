//! Configuration loader
//!
//! Loads SDK configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `FLUXBASE_BASE_URL`: Base URL of the Fluxbase API (required)
//! - `FLUXBASE_API_KEY`: Platform API key (required)
//! - `FLUXBASE_HTTP_TIMEOUT_SECONDS`: Request timeout in seconds
//! - `FLUXBASE_HTTP_MAX_ATTEMPTS`: Attempts per request (initial + retries)
//! - `FLUXBASE_HTTP_BASE_BACKOFF_MS`: Base retry backoff in milliseconds
//! - `FLUXBASE_ANALYTICS_BATCH_SIZE`: Analytics auto-flush threshold
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `fluxbase.{json,toml}` in the
//! working directory, up to two parent directories, and next to the
//! executable.

use std::path::{Path, PathBuf};

use fluxbase_domain::{AnalyticsConfig, ClientConfig, FluxbaseError, HttpConfig, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `FluxbaseError::Config` if configuration cannot be loaded from
/// either source, the file format is invalid, or required fields are
/// missing.
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `FLUXBASE_BASE_URL` and `FLUXBASE_API_KEY` are required; the tuning
/// variables fall back to their defaults when unset.
///
/// # Errors
/// Returns `FluxbaseError::Config` if a required variable is missing or a
/// tuning variable has an invalid value.
pub fn load_from_env() -> Result<ClientConfig> {
    let base_url = env_var("FLUXBASE_BASE_URL")?;
    let api_key = env_var("FLUXBASE_API_KEY")?;

    let defaults_http = HttpConfig::default();
    let defaults_analytics = AnalyticsConfig::default();

    let http = HttpConfig {
        timeout_seconds: env_parse("FLUXBASE_HTTP_TIMEOUT_SECONDS", defaults_http.timeout_seconds)?,
        max_attempts: env_parse("FLUXBASE_HTTP_MAX_ATTEMPTS", defaults_http.max_attempts)?,
        base_backoff_ms: env_parse("FLUXBASE_HTTP_BASE_BACKOFF_MS", defaults_http.base_backoff_ms)?,
    };
    let analytics = AnalyticsConfig {
        batch_size: env_parse("FLUXBASE_ANALYTICS_BATCH_SIZE", defaults_analytics.batch_size)?,
    };

    Ok(ClientConfig { base_url, api_key, http, analytics })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `FluxbaseError::Config` if the file is missing, no candidate is
/// found while probing, or the contents fail to parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FluxbaseError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FluxbaseError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FluxbaseError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, detecting the format by file
/// extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FluxbaseError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FluxbaseError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(FluxbaseError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("fluxbase.json"),
            cwd.join("fluxbase.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("fluxbase.json"),
                exe_dir.join("fluxbase.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        FluxbaseError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional environment variable, falling back to a default when
/// unset.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| FluxbaseError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}
