//! Error types for Lookout configuration

use thiserror::Error;

/// Result type alias for Lookout core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Lookout core operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid URL in configuration
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
