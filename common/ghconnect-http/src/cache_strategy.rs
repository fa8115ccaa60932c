//! Decide between a cached response, a (conditional) network call, or both
//!
//! Freshness follows RFC 9111: the cached entry's age is compared against its
//! freshness lifetime, narrowed or widened by the request's `max-age`,
//! `min-fresh` and `max-stale` directives. A stale entry with validators turns
//! the network request into a conditional one.

use crate::cache::{CacheEntry, is_cacheable};
use crate::request::Request;
use chrono::{DateTime, Utc};
use reqwest::header::{DATE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use std::time::Duration;

/// Outcome of [`CacheStrategy::compute`]
///
/// | `network_request` | `cache_response` | meaning |
/// |---|---|---|
/// | `None` | `None` | `only-if-cached` could not be satisfied |
/// | `None` | `Some` | serve the cached entry |
/// | `Some` | `None` | plain network call |
/// | `Some` | `Some` | conditional call; a `304` revalidates the entry |
#[derive(Debug, Clone)]
pub struct CacheStrategy {
    pub network_request: Option<Request>,
    pub cache_response: Option<CacheEntry>,
}

impl CacheStrategy {
    pub fn compute(now: DateTime<Utc>, request: &Request, candidate: Option<CacheEntry>) -> Self {
        let strategy = Self::compute_candidate(now, request, candidate);

        if strategy.network_request.is_some() && request.cache_control().only_if_cached() {
            return Self {
                network_request: None,
                cache_response: None,
            };
        }

        strategy
    }

    fn network(request: &Request) -> Self {
        Self {
            network_request: Some(request.clone()),
            cache_response: None,
        }
    }

    fn compute_candidate(
        now: DateTime<Utc>,
        request: &Request,
        candidate: Option<CacheEntry>,
    ) -> Self {
        let Some(entry) = candidate else {
            return Self::network(request);
        };

        if !is_cacheable(entry.status(), entry.headers(), request) {
            return Self::network(request);
        }

        let request_cc = request.cache_control();
        if request_cc.no_cache() || request.is_conditional() {
            return Self::network(request);
        }

        let response_cc = entry.cache_control();
        let age_millis = cache_response_age_millis(&entry, now);
        let mut fresh_millis = freshness_lifetime_millis(&entry);

        if let Some(max_age) = request_cc.max_age() {
            fresh_millis = fresh_millis.min(millis(max_age));
        }

        let min_fresh_millis = request_cc.min_fresh().map(millis).unwrap_or(0);

        let max_stale_millis = if response_cc.must_revalidate() {
            0
        } else {
            request_cc.max_stale().map(millis).unwrap_or(0)
        };

        if !response_cc.no_cache()
            && age_millis.saturating_add(min_fresh_millis)
                < fresh_millis.saturating_add(max_stale_millis)
        {
            return Self {
                network_request: None,
                cache_response: Some(entry),
            };
        }

        let validator = if let Some(etag) = entry.headers().get(ETAG) {
            Some((IF_NONE_MATCH, etag.clone()))
        } else if let Some(last_modified) = entry.headers().get(LAST_MODIFIED) {
            Some((IF_MODIFIED_SINCE, last_modified.clone()))
        } else {
            entry
                .headers()
                .get(DATE)
                .map(|date| (IF_MODIFIED_SINCE, date.clone()))
        };

        match validator {
            Some((name, value)) => Self {
                network_request: Some(request.clone().with_header(name, value)),
                cache_response: Some(entry),
            },
            None => Self::network(request),
        }
    }
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX / 4)
}

/// Current age of the entry in milliseconds
fn cache_response_age_millis(entry: &CacheEntry, now: DateTime<Utc>) -> i64 {
    let apparent_received_age = entry
        .served_date()
        .map(|served| (entry.received_at - served).num_milliseconds().max(0))
        .unwrap_or(0);

    let received_age = entry
        .age_header_seconds()
        .map(|age| apparent_received_age.max(age.saturating_mul(1000)))
        .unwrap_or(apparent_received_age);

    let response_duration = (entry.received_at - entry.sent_at).num_milliseconds().max(0);
    let resident_duration = (now - entry.received_at).num_milliseconds().max(0);

    received_age
        .saturating_add(response_duration)
        .saturating_add(resident_duration)
}

/// How long the entry is fresh for, measured from when it was served
fn freshness_lifetime_millis(entry: &CacheEntry) -> i64 {
    if let Some(max_age) = entry.cache_control().max_age() {
        return millis(max_age);
    }

    if let Some(expires) = entry.expires() {
        let served = entry.served_date().unwrap_or(entry.received_at);
        return (expires - served).num_milliseconds().max(0);
    }

    if let Some(last_modified) = entry.last_modified()
        && entry.url().query().is_none()
    {
        let served = entry.served_date().unwrap_or(entry.sent_at);
        let delta = (served - last_modified).num_milliseconds();
        return if delta > 0 { delta / 10 } else { 0 };
    }

    0
}
