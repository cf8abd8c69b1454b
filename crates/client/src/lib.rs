//! # Fluxbase Client
//!
//! Rust SDK for the Fluxbase backend platform.
//!
//! This crate contains:
//! - The [`Client`] entry point and per-domain service wrappers
//! - The fluent [`QueryBuilder`](query::QueryBuilder) for the generic query
//!   endpoint
//! - HTTP transport with retry/backoff (reqwest)
//! - Configuration loading from environment or file
//!
//! ## Architecture
//! - Wire types and errors live in `fluxbase-domain`
//! - Every operation is a single request/response round trip; the only
//!   client-side state is the analytics event buffer

pub mod client;
pub mod config;
pub mod errors;
pub mod http;
pub mod query;
pub mod services;

// Re-export commonly used items
pub use client::Client;
pub use fluxbase_domain::{ClientConfig, FluxbaseError, Result};
pub use http::HttpClient;
pub use query::{ConditionGroup, QueryBuilder};
