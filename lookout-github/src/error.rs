//! Error types for GitHub operations

use std::time::Duration;

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// Transport or decoding failure inside octocrab
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// Transport failure on a raw HTTP request
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GitHub answered with a non-success status
    #[error("GitHub API error: {status} {message}")]
    RemoteApi { status: u16, message: String },

    /// GraphQL answered with data and an errors array
    #[error("GraphQL partial errors: {0}")]
    PartialRemote(String),

    /// GraphQL answered with errors and no data
    #[error("GraphQL errors: {0}")]
    GraphQL(String),

    /// Outbound request exceeded its deadline
    #[error("GitHub request timed out after {0:?}")]
    Timeout(Duration),

    /// Authentication error
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] lookout_core::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// HTTP status carried by the error, if GitHub sent one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RemoteApi { status, .. } => Some(*status),
            _ => None,
        }
    }
}
