//! `Cache-Control` directives for requests and responses

use reqwest::header::{CACHE_CONTROL, HeaderMap, PRAGMA};
use std::fmt;
use std::time::Duration;

/// Largest delta-seconds value we emit; larger durations are clamped.
const MAX_DELTA_SECONDS: u64 = i32::MAX as u64;

/// Parsed or constructed set of cache directives
///
/// `Display` renders the canonical header value, directives in a fixed order
/// separated by `", "`. An empty set renders as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    no_cache: bool,
    no_store: bool,
    max_age_seconds: Option<u64>,
    s_max_age_seconds: Option<u64>,
    is_private: bool,
    is_public: bool,
    must_revalidate: bool,
    max_stale_seconds: Option<u64>,
    min_fresh_seconds: Option<u64>,
    only_if_cached: bool,
    no_transform: bool,
    immutable: bool,
}

impl CacheControl {
    /// Request directives that always go to the network
    pub fn force_network() -> Self {
        CacheControl::builder().no_cache().build()
    }

    /// Request directives that only accept a cached response, however stale
    pub fn force_cache() -> Self {
        CacheControl::builder()
            .only_if_cached()
            .max_stale(Duration::from_secs(MAX_DELTA_SECONDS))
            .build()
    }

    pub fn builder() -> CacheControlBuilder {
        CacheControlBuilder::default()
    }

    /// Parse every `Cache-Control` value in `headers`, plus `Pragma: no-cache`
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut result = CacheControl::default();
        for value in headers.get_all(CACHE_CONTROL) {
            if let Ok(value) = value.to_str() {
                result.merge_directives(value);
            }
        }
        for value in headers.get_all(PRAGMA) {
            if let Ok(value) = value.to_str() {
                result.merge_directives(value);
            }
        }
        result
    }

    /// Parse a single header value such as `"private, max-age=60"`
    pub fn parse(value: &str) -> Self {
        let mut result = CacheControl::default();
        result.merge_directives(value);
        result
    }

    fn merge_directives(&mut self, value: &str) {
        for (name, argument) in split_directives(value) {
            let seconds = argument.as_deref().and_then(parse_delta_seconds);
            match name.to_ascii_lowercase().as_str() {
                "no-cache" => self.no_cache = true,
                "no-store" => self.no_store = true,
                "max-age" => self.max_age_seconds = seconds.or(self.max_age_seconds),
                "s-maxage" => self.s_max_age_seconds = seconds.or(self.s_max_age_seconds),
                "private" => self.is_private = true,
                "public" => self.is_public = true,
                "must-revalidate" => self.must_revalidate = true,
                // A bare max-stale accepts any staleness.
                "max-stale" => {
                    self.max_stale_seconds = Some(seconds.unwrap_or(MAX_DELTA_SECONDS))
                }
                "min-fresh" => self.min_fresh_seconds = seconds.or(self.min_fresh_seconds),
                "only-if-cached" => self.only_if_cached = true,
                "no-transform" => self.no_transform = true,
                "immutable" => self.immutable = true,
                _ => {}
            }
        }
    }

    pub fn no_cache(&self) -> bool {
        self.no_cache
    }

    pub fn no_store(&self) -> bool {
        self.no_store
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age_seconds.map(Duration::from_secs)
    }

    pub fn s_max_age(&self) -> Option<Duration> {
        self.s_max_age_seconds.map(Duration::from_secs)
    }

    pub fn is_private(&self) -> bool {
        self.is_private
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn must_revalidate(&self) -> bool {
        self.must_revalidate
    }

    pub fn max_stale(&self) -> Option<Duration> {
        self.max_stale_seconds.map(Duration::from_secs)
    }

    pub fn min_fresh(&self) -> Option<Duration> {
        self.min_fresh_seconds.map(Duration::from_secs)
    }

    pub fn only_if_cached(&self) -> bool {
        self.only_if_cached
    }

    pub fn no_transform(&self) -> bool {
        self.no_transform
    }

    pub fn immutable(&self) -> bool {
        self.immutable
    }

    pub fn is_empty(&self) -> bool {
        *self == CacheControl::default()
    }
}

impl fmt::Display for CacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut directives: Vec<String> = Vec::new();
        if self.no_cache {
            directives.push("no-cache".to_string());
        }
        if self.no_store {
            directives.push("no-store".to_string());
        }
        if let Some(seconds) = self.max_age_seconds {
            directives.push(format!("max-age={}", seconds));
        }
        if let Some(seconds) = self.s_max_age_seconds {
            directives.push(format!("s-maxage={}", seconds));
        }
        if self.is_private {
            directives.push("private".to_string());
        }
        if self.is_public {
            directives.push("public".to_string());
        }
        if self.must_revalidate {
            directives.push("must-revalidate".to_string());
        }
        if let Some(seconds) = self.max_stale_seconds {
            directives.push(format!("max-stale={}", seconds));
        }
        if let Some(seconds) = self.min_fresh_seconds {
            directives.push(format!("min-fresh={}", seconds));
        }
        if self.only_if_cached {
            directives.push("only-if-cached".to_string());
        }
        if self.no_transform {
            directives.push("no-transform".to_string());
        }
        if self.immutable {
            directives.push("immutable".to_string());
        }
        f.write_str(&directives.join(", "))
    }
}

/// Builder for request-side [`CacheControl`] values
#[derive(Debug, Clone, Default)]
pub struct CacheControlBuilder {
    inner: CacheControl,
}

impl CacheControlBuilder {
    /// Don't accept an unvalidated cached response
    pub fn no_cache(mut self) -> Self {
        self.inner.no_cache = true;
        self
    }

    /// Don't store the server's response in any cache
    pub fn no_store(mut self) -> Self {
        self.inner.no_store = true;
        self
    }

    /// Only accept a cached response younger than `max_age`
    ///
    /// Sub-second precision is truncated.
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.inner.max_age_seconds = Some(clamp_seconds(max_age));
        self
    }

    /// Accept a cached response that has exceeded its freshness by up to `max_stale`
    pub fn max_stale(mut self, max_stale: Duration) -> Self {
        self.inner.max_stale_seconds = Some(clamp_seconds(max_stale));
        self
    }

    /// Only accept a cached response that stays fresh for at least `min_fresh`
    pub fn min_fresh(mut self, min_fresh: Duration) -> Self {
        self.inner.min_fresh_seconds = Some(clamp_seconds(min_fresh));
        self
    }

    /// Only accept the response if it is in the cache
    pub fn only_if_cached(mut self) -> Self {
        self.inner.only_if_cached = true;
        self
    }

    pub fn no_transform(mut self) -> Self {
        self.inner.no_transform = true;
        self
    }

    pub fn immutable(mut self) -> Self {
        self.inner.immutable = true;
        self
    }

    pub fn build(self) -> CacheControl {
        self.inner
    }
}

fn clamp_seconds(duration: Duration) -> u64 {
    duration.as_secs().min(MAX_DELTA_SECONDS)
}

/// Negative or unparsable values yield `None`; overflow clamps.
fn parse_delta_seconds(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.starts_with('-') {
        return None;
    }
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return Some(value.parse::<u64>().unwrap_or(MAX_DELTA_SECONDS).min(MAX_DELTA_SECONDS));
    }
    None
}

/// Split a header value into `(directive, argument)` pairs, honouring quoted arguments.
fn split_directives(value: &str) -> Vec<(String, Option<String>)> {
    let mut result = Vec::new();
    let mut rest = value;

    loop {
        rest = rest.trim_start_matches([' ', '\t', ',']);
        if rest.is_empty() {
            break;
        }

        let name_end = rest.find(['=', ',']).unwrap_or(rest.len());
        let name = rest[..name_end].trim().to_string();
        rest = &rest[name_end..];

        let argument = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            if let Some(quoted) = after_eq.strip_prefix('"') {
                let close = quoted.find('"').unwrap_or(quoted.len());
                let argument = quoted[..close].to_string();
                rest = quoted.get(close + 1..).unwrap_or("");
                Some(argument)
            } else {
                let end = after_eq.find(',').unwrap_or(after_eq.len());
                let argument = after_eq[..end].trim().to_string();
                rest = &after_eq[end..];
                Some(argument)
            }
        } else {
            None
        };

        if !name.is_empty() {
            result.push((name, argument));
        }
    }

    result
}
