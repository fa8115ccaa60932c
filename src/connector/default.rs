//! Non-caching connector

use super::HttpConnector;
use anyhow::Result;
use ghconnect_http::{Connection, HttpClient, Url, UrlOpener};

/// Connector that opens plain connections with no response cache
#[derive(Debug, Clone)]
pub struct DefaultConnector {
    opener: UrlOpener,
}

impl DefaultConnector {
    /// Connector over a default client
    pub fn new() -> Result<Self> {
        Ok(Self {
            opener: UrlOpener::new(HttpClient::new()?),
        })
    }

    /// Connector over a copy of `client` without its response cache
    pub fn with_client(client: &HttpClient) -> Result<Self> {
        let client = client.new_builder().without_cache().build()?;
        Ok(Self {
            opener: UrlOpener::new(client),
        })
    }

    /// The cache-less client all connections go through
    pub fn client(&self) -> &HttpClient {
        self.opener.client()
    }
}

impl HttpConnector for DefaultConnector {
    fn connect(&self, url: &Url) -> Result<Connection> {
        self.opener.open(url)
    }
}
