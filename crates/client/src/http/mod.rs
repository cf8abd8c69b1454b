//! HTTP transport with retry and timeout support

mod client;

pub use client::{HttpClient, HttpClientBuilder};
