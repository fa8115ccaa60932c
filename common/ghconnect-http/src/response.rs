//! Buffered HTTP responses

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

/// Where a response body came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Full response transferred from the server
    Network,
    /// Served from the response cache without contacting the server
    Cache,
    /// Cached body, revalidated by the server with `304 Not Modified`
    ConditionalCache,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::ConditionalCache => "conditional-cache",
        }
    }

    /// True when the body was not transferred over the network
    pub fn is_cached(&self) -> bool {
        !matches!(self, ResponseSource::Network)
    }
}

/// Fully buffered response
#[derive(Debug, Clone)]
pub struct Response {
    pub(crate) url: Url,
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) source: ResponseSource,
}

impl Response {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of `name`, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn source(&self) -> ResponseSource {
        self.source
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .with_context(|| format!("Failed to parse JSON response from {}", self.url))
    }
}
