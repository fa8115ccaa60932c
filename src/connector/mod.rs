//! HTTP connectors
//!
//! A connector turns a URL into an unsent [`Connection`] the caller can add
//! headers to before executing it. API clients depend on the
//! [`HttpConnector`] trait and stay agnostic of how connections are made.
//!
//! - [`CachingConnector`]: routes requests through a client with a response
//!   cache and forces revalidation via `Cache-Control: max-age=N`
//! - [`DefaultConnector`]: plain connections, no cache, no extra headers

pub mod caching;
pub mod default;

pub use caching::CachingConnector;
pub use default::DefaultConnector;

use anyhow::Result;
use ghconnect_http::{Connection, Url};

/// Opens connections for an API client
pub trait HttpConnector: Send + Sync {
    /// Open a connection to `url`
    ///
    /// # Errors
    /// Returns the underlying client's error if the connection cannot be opened.
    fn connect(&self, url: &Url) -> Result<Connection>;
}
