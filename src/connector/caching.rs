//! Connector backed by a client with a response cache
//!
//! Conditional requests against the GitHub API that come back `304 Not
//! Modified` do not count against the rate limit. Routing requests through a
//! client with a [`ResponseCache`] gets those for free: the cache attaches
//! `If-None-Match`/`If-Modified-Since` and serves the stored body on a 304.
//!
//! Left alone, the cache would also honour the server's `max-age` and answer
//! from local storage without asking the server, returning stale data for the
//! length of that window. The connector therefore stamps every connection with
//! `Cache-Control: max-age=N` (default 0), so the cache revalidates with the
//! server once an entry is older than `N` seconds.
//!
//! [`ResponseCache`]: ghconnect_http::ResponseCache

use super::HttpConnector;
use crate::constants::http::CACHE_CONTROL_HEADER;
use anyhow::Result;
use ghconnect_http::{
    CLEARTEXT, CacheControl, Connection, ConnectionSpec, HttpClient, MODERN_TLS, Url, UrlOpener,
};
use std::time::Duration;
use tracing::debug;

/// Connector that routes every connection through a caching [`HttpClient`]
#[derive(Debug, Clone)]
pub struct CachingConnector {
    client: HttpClient,
    max_age_header_value: Option<String>,
    opener: UrlOpener,
}

impl CachingConnector {
    /// Connector that forces revalidation on every request (`max-age=0`)
    ///
    /// Equivalent to `CachingConnector::with_max_age(client, 0)`.
    pub fn new(client: &HttpClient) -> Result<Self> {
        Self::with_max_age(client, 0)
    }

    /// Create a connector from `client`
    ///
    /// The connector builds its own client from `client`'s settings with the
    /// connection specs replaced by `[MODERN_TLS, CLEARTEXT]`; `client` itself
    /// is not changed. When `cache_max_age >= 0` and `client` has a response
    /// cache, every connection carries `Cache-Control: max-age=<cache_max_age>`.
    /// A negative value, or a client without a cache, disables the header.
    ///
    /// # Errors
    /// Only the HTTP client's own build validation can fail here.
    pub fn with_max_age(client: &HttpClient, cache_max_age: i32) -> Result<Self> {
        let builder = client.new_builder().connection_specs(tls_connection_specs());

        let max_age_header_value = match u64::try_from(cache_max_age) {
            Ok(seconds) if client.cache().is_some() => Some(
                CacheControl::builder()
                    .max_age(Duration::from_secs(seconds))
                    .build()
                    .to_string(),
            ),
            _ => None,
        };

        let client = builder.build()?;
        let opener = UrlOpener::new(client.clone());

        debug!(
            cache_max_age,
            header = max_age_header_value.as_deref().unwrap_or("<none>"),
            "created caching connector"
        );

        Ok(Self {
            client,
            max_age_header_value,
            opener,
        })
    }

    /// The configured client all connections go through
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// `Cache-Control` value stamped on each connection, if any
    pub fn max_age_header_value(&self) -> Option<&str> {
        self.max_age_header_value.as_deref()
    }
}

impl HttpConnector for CachingConnector {
    fn connect(&self, url: &Url) -> Result<Connection> {
        let mut connection = self.opener.open(url)?;
        if let Some(value) = &self.max_age_header_value {
            connection.set_request_property(CACHE_CONTROL_HEADER, value)?;
        }
        Ok(connection)
    }
}

/// TLS 1.2+ first, plaintext only as a fallback for `http:` URLs
fn tls_connection_specs() -> [ConnectionSpec; 2] {
    [MODERN_TLS, CLEARTEXT]
}
