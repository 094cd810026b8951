//! Configuration management for Lookout
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (GITHUB_USERNAME, LOOKOUT_*)
//! 3. Config file (~/.config/lookout/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Default GitHub REST API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default GitHub GraphQL endpoint
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// GitHub integration configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Login whose PRs and issues are shown on the dashboard
    pub username: Option<String>,

    /// REST API root
    pub api_url: String,

    /// GraphQL endpoint
    pub graphql_url: String,

    /// Deadline for each outbound request
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// How far back closed issues are included
    pub closed_window_days: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            username: None,
            api_url: DEFAULT_API_URL.to_string(),
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            timeout: Duration::from_secs(30),
            closed_window_days: 30,
        }
    }
}

impl GitHubConfig {
    /// Parsed REST API root
    pub fn api_url(&self) -> Result<Url> {
        parse_url(&self.api_url)
    }

    /// Parsed GraphQL endpoint
    pub fn graphql_url(&self) -> Result<Url> {
        parse_url(&self.graphql_url)
    }

    /// Username, if one is set and non-blank
    pub fn username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|source| Error::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// GitHub configuration
    pub github: GitHubConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/lookout/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lookout").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - GITHUB_USERNAME: dashboard subject
    /// - LOOKOUT_GITHUB_API_URL: REST API root
    /// - LOOKOUT_GITHUB_GRAPHQL_URL: GraphQL endpoint
    /// - LOOKOUT_GITHUB_TIMEOUT_SECS: per-request timeout in seconds
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(username) = var("GITHUB_USERNAME") {
            self.github.username = Some(username);
        }

        if let Some(api_url) = var("LOOKOUT_GITHUB_API_URL") {
            self.github.api_url = api_url;
        }

        if let Some(graphql_url) = var("LOOKOUT_GITHUB_GRAPHQL_URL") {
            self.github.graphql_url = graphql_url;
        }

        if let Some(secs) = var("LOOKOUT_GITHUB_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Config(format!("LOOKOUT_GITHUB_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            self.github.timeout = Duration::from_secs(secs);
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, username: Option<String>) -> Self {
        if let Some(u) = username {
            self.github.username = Some(u);
        }

        self
    }

    /// Check that URLs parse and the timeout is usable
    pub fn validate(&self) -> Result<()> {
        self.github.api_url()?;
        self.github.graphql_url()?;

        if self.github.timeout.is_zero() {
            return Err(Error::Config("github.timeout must be greater than zero".into()));
        }

        Ok(())
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(username: Option<String>) -> Result<Self> {
        let config = Self::load()?
            .with_env_overrides()?
            .with_cli_overrides(username);
        config.validate()?;
        Ok(config)
    }
}
