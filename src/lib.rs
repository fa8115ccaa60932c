//! ghconnect - caching HTTP connectors for GitHub API clients

pub mod commands;
pub mod config;
pub mod connector;
pub mod constants;

pub type Result<T> = anyhow::Result<T>;

// Re-export commonly used types
pub use commands::{Command, CommandContext};
pub use config::ConnectorConfig;
pub use connector::{CachingConnector, DefaultConnector, HttpConnector};

