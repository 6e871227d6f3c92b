//! Error types for the stride search driver.
//!
//! Wraps the core's [`StrideError`] together with the I/O and serialization
//! failures that come from reading configuration and writing events.

use stride_search_core::StrideError;

/// Enumeration of possible driver errors.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Failure reported by the search core
    #[error("Search error: {0}")]
    Search(#[from] StrideError),

    /// Reading or writing a file or stream failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`crate::config::AppConfig`]
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The default configuration could not be serialized
    #[error("Failed to write configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// An event could not be encoded as JSON
    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    /// Configuration parsed but holds unusable values
    #[error("Configuration validation failed: {0}")]
    InvalidConfig(String),

    /// The tracing subscriber could not be installed
    #[error("Failed to set up logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, DriverError>;
