//! HTTP client library with connection specs and a validator-aware response cache
//!
//! ## Modules
//!
//! - [`client`]: `HttpClient` and its builder
//! - [`connection_spec`]: Named TLS/cleartext profiles
//! - [`cache_control`]: `Cache-Control` directives
//! - [`cache`]: In-memory response cache
//! - [`cache_strategy`]: Freshness and revalidation decisions
//! - [`connection`]: Unsent/sent request-response pairs
//! - [`opener`]: URL to connection adapter

pub mod cache;
pub mod cache_control;
pub mod cache_strategy;
pub mod client;
pub mod connection;
pub mod connection_spec;
pub mod http_date;
pub mod opener;
pub mod request;
pub mod response;

// Re-export public API
pub use cache::{CacheEntry, ResponseCache};
pub use cache_control::{CacheControl, CacheControlBuilder};
pub use cache_strategy::CacheStrategy;
pub use client::{ClientBuilder, DEFAULT_USER_AGENT, HttpClient};
pub use connection::Connection;
pub use connection_spec::{
    CLEARTEXT, COMPATIBLE_TLS, ConnectionSpec, MODERN_TLS, RESTRICTED_TLS, TlsVersion,
};
pub use opener::UrlOpener;
pub use request::Request;
pub use response::{Response, ResponseSource};

pub use reqwest::{Method, StatusCode, Url};
