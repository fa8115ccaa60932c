//! Turns URLs into unsent [`Connection`]s bound to one client

use crate::client::HttpClient;
use crate::connection::Connection;
use anyhow::{Result, bail};
use reqwest::Url;

#[derive(Debug, Clone)]
pub struct UrlOpener {
    client: HttpClient,
}

impl UrlOpener {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Open a connection to `url`
    ///
    /// # Errors
    /// Returns an error for schemes other than `http`/`https`, or a scheme the
    /// client's connection specs do not permit.
    pub fn open(&self, url: &Url) -> Result<Connection> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            bail!("Unexpected url scheme: {}", scheme);
        }
        if !self.client.allows_scheme(scheme) {
            bail!("{} connections are not permitted for {}", scheme, url);
        }
        Ok(Connection::new(self.client.clone(), url.clone()))
    }
}
