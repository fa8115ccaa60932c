//! Central constants for the ghconnect application

/// Header names and values used on outgoing requests
pub mod http {
    /// Header the caching connector stamps on each connection
    pub const CACHE_CONTROL_HEADER: &str = "Cache-Control";

    /// GitHub REST API media type
    pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
}

/// Default values for GitHub operations
pub mod github {
    /// GitHub API base URL
    pub const API_BASE: &str = "https://api.github.com";

    /// Default User-Agent header for API requests
    pub const DEFAULT_USER_AGENT: &str = concat!("ghconnect/", env!("CARGO_PKG_VERSION"));

    /// Environment variable consulted when no token is passed explicitly
    pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

    /// Remaining-requests header on every API response
    pub const RATE_LIMIT_REMAINING_HEADER: &str = "X-RateLimit-Remaining";
}

/// Default values for configuration
pub mod config {
    /// Default configuration file name
    pub const DEFAULT_CONFIG_FILE: &str = "ghconnect.yaml";

    /// Default forced `max-age`, in seconds; 0 revalidates every request
    pub const DEFAULT_CACHE_MAX_AGE: i32 = 0;

    /// Default response cache budget: 10 MiB of bodies
    pub const DEFAULT_CACHE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

    /// Default whole-request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
}
