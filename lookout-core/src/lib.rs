//! Lookout Core - configuration and secrets for the Lookout status dashboard
//!
//! This crate loads the settings shared by the dashboard integrations:
//! which user to report on, where the APIs live, and the credentials to call them.

pub mod config;
pub mod error;
pub mod secrets;

pub use config::{Config, GitHubConfig};
pub use error::{Error, Result};
pub use secrets::Secrets;
