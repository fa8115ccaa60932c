//! HTTP client implementation
//!
//! [`HttpClient`] wraps a `reqwest::Client` together with the settings it was
//! built from and an optional [`ResponseCache`]. Clients are immutable; to
//! change a setting, derive a builder with [`HttpClient::new_builder`], adjust
//! it and build a new client. The original client is left untouched and the
//! derived one shares its cache.

use crate::cache::{ResponseCache, invalidates_cache};
use crate::cache_strategy::CacheStrategy;
use crate::connection_spec::{
    CLEARTEXT, ConnectionSpec, MODERN_TLS, tls_version_bounds, validate_connection_specs,
};
use crate::request::Request;
use crate::response::{Response, ResponseSource};
use anyhow::{Context, Result, bail};
use bytes::Bytes;
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Default User-Agent header for requests
pub const DEFAULT_USER_AGENT: &str = concat!("ghconnect-http/", env!("CARGO_PKG_VERSION"));

/// Default whole-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default TCP + TLS connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings an [`HttpClient`] is built from
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    connection_specs: Vec<ConnectionSpec>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: String,
    use_proxy: bool,
    cache: Option<ResponseCache>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            connection_specs: vec![MODERN_TLS, CLEARTEXT],
            timeout: Some(DEFAULT_TIMEOUT),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            use_proxy: true,
            cache: None,
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list of allowed connection specs, in preference order
    pub fn connection_specs(mut self, specs: impl IntoIterator<Item = ConnectionSpec>) -> Self {
        self.connection_specs = specs.into_iter().collect();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Ignore `HTTP_PROXY`/`HTTPS_PROXY` style proxy settings
    pub fn no_proxy(mut self) -> Self {
        self.use_proxy = false;
        self
    }

    pub fn cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Build the client
    ///
    /// # Errors
    /// Returns an error if the connection spec list is empty or the TLS
    /// backend rejects the resulting configuration.
    pub fn build(self) -> Result<HttpClient> {
        validate_connection_specs(&self.connection_specs)?;

        let mut builder = reqwest::Client::builder().user_agent(self.user_agent.clone());

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some((min, max)) = tls_version_bounds(&self.connection_specs) {
            builder = builder
                .min_tls_version(min.to_reqwest())
                .max_tls_version(max.to_reqwest());
        }
        if !self.connection_specs.iter().any(|spec| !spec.is_tls()) {
            builder = builder.https_only(true);
        }
        if !self.use_proxy {
            builder = builder.no_proxy();
        }

        let inner = builder.build().context("Failed to build HTTP client")?;

        debug!(
            specs = ?self.connection_specs.iter().map(|s| s.name()).collect::<Vec<_>>(),
            cached = self.cache.is_some(),
            "built HTTP client"
        );

        Ok(HttpClient {
            inner,
            settings: Arc::new(self),
        })
    }
}

/// Cheap-to-clone HTTP client handle
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    settings: Arc<ClientBuilder>,
}

impl HttpClient {
    /// Client with default settings and no cache
    pub fn new() -> Result<Self> {
        ClientBuilder::default().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Builder pre-populated with this client's settings, including its cache
    pub fn new_builder(&self) -> ClientBuilder {
        (*self.settings).clone()
    }

    pub fn connection_specs(&self) -> &[ConnectionSpec] {
        &self.settings.connection_specs
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.settings.cache.as_ref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.settings.timeout
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.settings.connect_timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.settings.user_agent
    }

    /// Whether the connection specs permit URLs with `scheme`
    pub fn allows_scheme(&self, scheme: &str) -> bool {
        let specs = self.connection_specs();
        match scheme {
            "https" => specs.iter().any(ConnectionSpec::is_tls),
            "http" => specs.iter().any(|spec| !spec.is_tls()),
            _ => false,
        }
    }

    /// Execute `request`, consulting and updating the response cache if one is configured
    ///
    /// # Errors
    /// Transport failures are returned as the underlying `reqwest::Error`.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let Some(cache) = self.cache() else {
            return self.send(&request).await;
        };

        cache.track_request();
        let candidate = cache.get(&request);
        let strategy = CacheStrategy::compute(Utc::now(), &request, candidate);

        let Some(network_request) = strategy.network_request else {
            return Ok(match strategy.cache_response {
                Some(entry) => {
                    debug!(url = %request.url(), "serving response from cache");
                    cache.track_hit();
                    entry.to_response(ResponseSource::Cache)
                }
                None => {
                    debug!(url = %request.url(), "only-if-cached request not satisfiable");
                    unsatisfiable_response(&request)
                }
            });
        };

        cache.track_network();
        let sent_at = Utc::now();
        let network = self.send(&network_request).await?;
        let received_at = Utc::now();

        if let Some(cached) = strategy.cache_response
            && network.status() == StatusCode::NOT_MODIFIED
        {
            debug!(url = %request.url(), "conditional request revalidated cached response");
            let updated = cached.revalidated(network.headers(), sent_at, received_at);
            cache.track_hit();
            cache.put(updated.clone());
            return Ok(updated.to_response(ResponseSource::ConditionalCache));
        }

        if invalidates_cache(request.method()) {
            if cache.remove(request.url()) {
                debug!(url = %request.url(), method = %request.method(), "invalidated cached response");
            }
        } else if cache.store(&request, &network, sent_at, received_at) {
            debug!(url = %request.url(), "stored response in cache");
        }

        Ok(network)
    }

    async fn send(&self, request: &Request) -> Result<Response> {
        let scheme = request.url().scheme();
        if !self.allows_scheme(scheme) {
            bail!(
                "{} URLs are not permitted by connection specs [{}]",
                scheme,
                self.connection_specs()
                    .iter()
                    .map(|spec| spec.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        trace!(method = %request.method(), url = %request.url(), "sending request");

        let mut builder = self
            .inner
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Response {
            url,
            status,
            headers,
            body,
            source: ResponseSource::Network,
        })
    }
}

fn unsatisfiable_response(request: &Request) -> Response {
    Response {
        url: request.url().clone(),
        status: StatusCode::GATEWAY_TIMEOUT,
        headers: HeaderMap::new(),
        body: Bytes::new(),
        source: ResponseSource::Cache,
    }
}
