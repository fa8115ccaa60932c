//! In-memory HTTP response cache
//!
//! The cache stores `GET` responses keyed by URL and remembers the request
//! headers named by `Vary`, so a later request only matches when those headers
//! agree. Freshness and revalidation decisions live in
//! [`crate::cache_strategy`]; this module only stores, looks up and evicts.
//!
//! Cloning a [`ResponseCache`] yields another handle to the same storage, so
//! clients derived with [`crate::HttpClient::new_builder`] share one cache.

use crate::cache_control::CacheControl;
use crate::http_date::parse_header_date;
use crate::request::Request;
use crate::response::{Response, ResponseSource};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{
    AGE, CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, DATE, EXPIRES, HeaderMap,
    HeaderName, HeaderValue, LAST_MODIFIED, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER,
    TRANSFER_ENCODING, UPGRADE, VARY, WARNING,
};
use reqwest::{Method, StatusCode, Url};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// A stored response plus what is needed to judge its freshness
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub(crate) url: Url,
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) vary_request_headers: Vec<(HeaderName, Vec<HeaderValue>)>,
    pub(crate) sent_at: DateTime<Utc>,
    pub(crate) received_at: DateTime<Utc>,
}

impl CacheEntry {
    pub(crate) fn new(
        request: &Request,
        response: &Response,
        sent_at: DateTime<Utc>,
        received_at: DateTime<Utc>,
    ) -> Self {
        let vary_request_headers = vary_fields(&response.headers)
            .into_iter()
            .map(|name| {
                let values = request.headers().get_all(&name).iter().cloned().collect();
                (name, values)
            })
            .collect();

        Self {
            url: request.url().clone(),
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            vary_request_headers,
            sent_at,
            received_at,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn cache_control(&self) -> CacheControl {
        CacheControl::from_headers(&self.headers)
    }

    pub fn served_date(&self) -> Option<DateTime<Utc>> {
        parse_header_date(self.headers.get(DATE))
    }

    pub fn expires(&self) -> Option<DateTime<Utc>> {
        parse_header_date(self.headers.get(EXPIRES))
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        parse_header_date(self.headers.get(LAST_MODIFIED))
    }

    /// `Age` header in seconds, clamped to `0..=i32::MAX`
    pub fn age_header_seconds(&self) -> Option<i64> {
        self.headers
            .get(AGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(|age| age.clamp(0, i64::from(i32::MAX)))
    }

    /// True if `request` may be answered with this entry
    pub fn matches(&self, request: &Request) -> bool {
        *request.method() == Method::GET
            && cache_key(&self.url) == cache_key(request.url())
            && self.vary_request_headers.iter().all(|(name, values)| {
                let current: Vec<HeaderValue> =
                    request.headers().get_all(name).iter().cloned().collect();
                &current == values
            })
    }

    /// Entry refreshed by a `304 Not Modified` carrying `network_headers`
    pub(crate) fn revalidated(
        &self,
        network_headers: &HeaderMap,
        sent_at: DateTime<Utc>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            headers: combine_headers(&self.headers, network_headers),
            sent_at,
            received_at,
            ..self.clone()
        }
    }

    pub(crate) fn to_response(&self, source: ResponseSource) -> Response {
        Response {
            url: self.url.clone(),
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
            source,
        }
    }

    fn size(&self) -> u64 {
        self.body.len() as u64
    }
}

/// Response headers merged the way a revalidated entry is updated
///
/// Cached headers are kept unless the network response carries an end-to-end
/// replacement. Content headers always come from the cached entry, and
/// `1xx` warnings are dropped.
pub fn combine_headers(cached: &HeaderMap, network: &HeaderMap) -> HeaderMap {
    let mut result = HeaderMap::new();

    for (name, value) in cached.iter() {
        if *name == WARNING && value.as_bytes().starts_with(b"1") {
            continue;
        }
        if is_content_specific(name) || !is_end_to_end(name) || !network.contains_key(name) {
            result.append(name.clone(), value.clone());
        }
    }

    for name in network.keys() {
        if !is_content_specific(name) && is_end_to_end(name) {
            for value in network.get_all(name) {
                result.append(name.clone(), value.clone());
            }
        }
    }

    result
}

fn is_content_specific(name: &HeaderName) -> bool {
    *name == CONTENT_LENGTH || *name == CONTENT_ENCODING || *name == CONTENT_TYPE
}

fn is_end_to_end(name: &HeaderName) -> bool {
    !(*name == CONNECTION
        || name.as_str() == "keep-alive"
        || *name == PROXY_AUTHENTICATE
        || *name == PROXY_AUTHORIZATION
        || *name == TE
        || *name == TRAILER
        || *name == TRANSFER_ENCODING
        || *name == UPGRADE)
}

/// Lower-cased field names listed by every `Vary` header
fn vary_fields(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|field| !field.is_empty() && *field != "*")
        .filter_map(|field| HeaderName::from_bytes(field.to_ascii_lowercase().as_bytes()).ok())
        .collect()
}

fn has_vary_all(headers: &HeaderMap) -> bool {
    headers
        .get_all(VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|field| field.trim() == "*")
}

/// Whether a response with `status` and `headers` to `request` may be stored
pub fn is_cacheable(status: StatusCode, headers: &HeaderMap, request: &Request) -> bool {
    let response_cc = CacheControl::from_headers(headers);
    match status.as_u16() {
        200 | 203 | 204 | 300 | 301 | 308 | 404 | 405 | 410 | 414 | 501 => {}
        302 | 307 => {
            if !headers.contains_key(EXPIRES)
                && response_cc.max_age().is_none()
                && !response_cc.is_public()
                && !response_cc.is_private()
            {
                return false;
            }
        }
        _ => return false,
    }
    !response_cc.no_store() && !request.cache_control().no_store()
}

/// Methods whose success makes any cached response for the URL stale
pub fn invalidates_cache(method: &Method) -> bool {
    *method == Method::POST
        || *method == Method::PATCH
        || *method == Method::PUT
        || *method == Method::DELETE
        || method.as_str() == "MOVE"
}

fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

struct CacheInner {
    max_size: u64,
    entries: Mutex<HashMap<String, CacheEntry>>,
    request_count: AtomicU64,
    network_count: AtomicU64,
    hit_count: AtomicU64,
}

/// Shared, size-bounded response store
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<CacheInner>,
}

impl ResponseCache {
    /// Create a cache holding at most `max_size` bytes of response bodies
    pub fn new(max_size: u64) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                max_size,
                entries: Mutex::new(HashMap::new()),
                request_count: AtomicU64::new(0),
                network_count: AtomicU64::new(0),
                hit_count: AtomicU64::new(0),
            }),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn max_size(&self) -> u64 {
        self.inner.max_size
    }

    /// Bytes of response bodies currently stored
    pub fn size(&self) -> u64 {
        self.entries().values().map(CacheEntry::size).sum()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Calls that went through this cache
    pub fn request_count(&self) -> u64 {
        self.inner.request_count.load(Ordering::Relaxed)
    }

    /// Calls that needed the network, conditional or not
    pub fn network_count(&self) -> u64 {
        self.inner.network_count.load(Ordering::Relaxed)
    }

    /// Calls answered by a stored body, directly or after a `304`
    pub fn hit_count(&self) -> u64 {
        self.inner.hit_count.load(Ordering::Relaxed)
    }

    /// True when both handles share the same storage
    pub fn same_store(&self, other: &ResponseCache) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Drop every stored entry; counters are kept
    pub fn evict_all(&self) {
        self.entries().clear();
    }

    pub fn remove(&self, url: &Url) -> bool {
        self.entries().remove(&cache_key(url)).is_some()
    }

    /// Stored entry usable for `request`, ignoring freshness
    pub fn get(&self, request: &Request) -> Option<CacheEntry> {
        let entries = self.entries();
        let entry = entries.get(&cache_key(request.url()))?;
        if entry.matches(request) {
            Some(entry.clone())
        } else {
            debug!(url = %request.url(), "cached response does not match Vary headers");
            None
        }
    }

    /// Store `response` for `request` when it is cacheable; returns whether it was stored
    pub fn store(
        &self,
        request: &Request,
        response: &Response,
        sent_at: DateTime<Utc>,
        received_at: DateTime<Utc>,
    ) -> bool {
        if *request.method() != Method::GET
            || !is_cacheable(response.status, &response.headers, request)
            || has_vary_all(&response.headers)
        {
            return false;
        }
        self.put(CacheEntry::new(request, response, sent_at, received_at))
    }

    pub(crate) fn put(&self, entry: CacheEntry) -> bool {
        if entry.size() > self.inner.max_size {
            debug!(url = %entry.url, size = entry.size(), "response larger than cache, not storing");
            return false;
        }

        let mut entries = self.entries();
        entries.insert(cache_key(&entry.url), entry);

        let mut total: u64 = entries.values().map(CacheEntry::size).sum();
        while total > self.inner.max_size {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.received_at)
                .map(|(key, _)| key.clone());
            let Some(key) = oldest else { break };
            if let Some(evicted) = entries.remove(&key) {
                debug!(url = %evicted.url, "evicting cached response");
                total -= evicted.size();
            }
        }
        true
    }

    pub(crate) fn track_request(&self) {
        self.inner.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn track_network(&self) {
        self.inner.network_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn track_hit(&self) {
        self.inner.hit_count.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("max_size", &self.inner.max_size)
            .field("entries", &self.len())
            .finish()
    }
}
