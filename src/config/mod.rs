//! Configuration management module

pub mod loader;
pub mod validation;

pub use loader::{CacheConfig, ConnectorConfig};
pub use validation::ValidationError;
