//! Request/response pair for a single URL
//!
//! A [`Connection`] starts unsent: the caller may change the request method,
//! set request headers and attach a body. The first call to
//! [`Connection::connect`] (or any response accessor) executes the request
//! through the owning [`HttpClient`]; after that the request side is frozen.

use crate::client::HttpClient;
use crate::request::Request;
use crate::response::Response;
use anyhow::{Context, Result, anyhow, bail};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};

#[derive(Debug)]
pub struct Connection {
    client: HttpClient,
    url: Url,
    method: Method,
    headers: HeaderMap,
    body: Option<Bytes>,
    response: Option<Response>,
}

impl Connection {
    pub(crate) fn new(client: HttpClient, url: Url) -> Self {
        Self {
            client,
            url,
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            response: None,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn request_method(&self) -> &Method {
        &self.method
    }

    pub fn set_request_method(&mut self, method: Method) -> Result<()> {
        self.ensure_not_connected()?;
        self.method = method;
        Ok(())
    }

    /// Set a request header, replacing any existing values
    pub fn set_request_property(&mut self, name: &str, value: &str) -> Result<()> {
        self.ensure_not_connected()?;
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Add a request header value, keeping existing values
    pub fn add_request_property(&mut self, name: &str, value: &str) -> Result<()> {
        self.ensure_not_connected()?;
        let (name, value) = parse_header(name, value)?;
        self.headers.append(name, value);
        Ok(())
    }

    /// First value of request header `name`
    pub fn request_property(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn request_properties(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) -> Result<()> {
        self.ensure_not_connected()?;
        self.body = Some(body.into());
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.response.is_some()
    }

    fn ensure_not_connected(&self) -> Result<()> {
        if self.is_connected() {
            bail!("Already connected to {}", self.url);
        }
        Ok(())
    }

    /// Execute the request if it has not been executed yet
    ///
    /// # Errors
    /// Transport failures from the client are returned unchanged.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let mut request = Request::new(self.method.clone(), self.url.clone())
            .with_headers(self.headers.clone());
        if let Some(body) = &self.body {
            request = request.with_body(body.clone());
        }

        let response = self.client.execute(request).await?;
        self.response = Some(response);
        Ok(())
    }

    pub async fn response(&mut self) -> Result<&Response> {
        self.connect().await?;
        self.response
            .as_ref()
            .ok_or_else(|| anyhow!("No response for {}", self.url))
    }

    pub async fn response_code(&mut self) -> Result<StatusCode> {
        Ok(self.response().await?.status())
    }

    /// Response header `name`; `None` until connected
    pub fn response_header(&self, name: &str) -> Option<&str> {
        self.response.as_ref().and_then(|r| r.header(name))
    }

    pub async fn into_response(mut self) -> Result<Response> {
        self.connect().await?;
        self.response
            .ok_or_else(|| anyhow!("No response for {}", self.url))
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .with_context(|| format!("Invalid header name: {:?}", name))?;
    let header_value = HeaderValue::from_str(value)
        .with_context(|| format!("Invalid value for header {}", name))?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> Connection {
        let client = HttpClient::new().unwrap();
        Connection::new(client, Url::parse("https://api.github.com/").unwrap())
    }

    #[test]
    fn test_defaults_to_get() {
        let conn = connection();
        assert_eq!(*conn.request_method(), Method::GET);
        assert!(!conn.is_connected());
        assert!(conn.request_properties().is_empty());
    }

    #[test]
    fn test_set_replaces_and_add_appends() {
        let mut conn = connection();
        conn.set_request_property("Accept", "text/plain").unwrap();
        conn.set_request_property("accept", "application/json").unwrap();
        assert_eq!(conn.request_property("Accept"), Some("application/json"));
        assert_eq!(conn.request_properties().get_all("accept").iter().count(), 1);

        conn.add_request_property("Accept", "text/html").unwrap();
        assert_eq!(conn.request_properties().get_all("accept").iter().count(), 2);
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let mut conn = connection();
        assert!(conn.set_request_property("bad name", "x").is_err());
        assert!(conn.set_request_property("X-Ok", "line\nbreak").is_err());
    }

    #[test]
    fn test_response_header_absent_before_connect() {
        let conn = connection();
        assert_eq!(conn.response_header("etag"), None);
    }
}
