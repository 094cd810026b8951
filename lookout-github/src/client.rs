//! GitHub API client using octocrab

use std::time::Duration;

use lookout_core::{GitHubConfig, Secrets};
use octocrab::Octocrab;
use tracing::{debug, info};
use url::Url;

use crate::{Error, Result, SearchItem};

const USER_AGENT: &str = concat!("lookout/", env!("CARGO_PKG_VERSION"));

/// Read-only GitHub client for the dashboard
///
/// REST search goes through octocrab; GraphQL goes through a plain reqwest
/// client. Both honor the configured per-request timeout.
pub struct GitHubClient {
    client: Octocrab,
    http: reqwest::Client,
    token: String,
    graphql_url: Url,
    timeout: Duration,
}

impl GitHubClient {
    /// Create a client with an explicit token
    pub fn new(token: impl Into<String>, config: &GitHubConfig) -> Result<Self> {
        let token = token.into();
        let api_url = config.api_url()?;
        let graphql_url = config.graphql_url()?;

        let client = Octocrab::builder()
            .personal_token(token.clone())
            .base_uri(api_url.as_str())?
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        info!(api_url = %api_url, graphql_url = %graphql_url, "Created GitHub client");

        Ok(Self {
            client,
            http,
            token,
            graphql_url,
            timeout: config.timeout,
        })
    }

    /// Create a client using the token from the environment or secrets
    ///
    /// Token is taken from (in priority order):
    /// 1. GITHUB_TOKEN environment variable
    /// 2. the `[github]` section of the secrets file
    ///
    /// Returns `None` when neither has a token.
    pub fn from_secrets(secrets: &Secrets, config: &GitHubConfig) -> Result<Option<Self>> {
        match secrets.github_token() {
            Some(token) => Self::new(token, config).map(Some),
            None => {
                debug!("No GitHub token in environment or secrets file");
                Ok(None)
            }
        }
    }

    /// Per-request deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    pub(crate) fn graphql_url(&self) -> &Url {
        &self.graphql_url
    }

    /// Search issues and pull requests
    ///
    /// Fetches a single page; GitHub caps `per_page` at 100.
    pub async fn search_issues(&self, query: &str, per_page: u8) -> Result<Vec<SearchItem>> {
        debug!(query, per_page, "Searching issues");

        let request = self
            .client
            .search()
            .issues_and_pull_requests(query)
            .per_page(per_page)
            .send();

        let page = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| Error::Timeout(self.timeout))?
            .map_err(map_api_error)?;

        let items: Vec<SearchItem> = page.items.into_iter().map(SearchItem::from).collect();

        debug!(query, count = items.len(), "Search returned");

        Ok(items)
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("graphql_url", &self.graphql_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Surface GitHub's status code for API-level failures
fn map_api_error(e: octocrab::Error) -> Error {
    match e {
        octocrab::Error::GitHub { source, .. } => Error::RemoteApi {
            status: source.status_code.as_u16(),
            message: source.message.clone(),
        },
        other => Error::Api(other),
    }
}
