//! GitHub command - build the dashboard and print it as JSON

use chrono::{DateTime, Utc};
use clap::Args;
use lookout_core::{Config, Secrets};
use lookout_github::{fetch_dashboard, DashboardOptions, GitHubClient, GitHubDashboard, IssueSource};
use serde::Serialize;
use tracing::{info, warn};

/// Fetch PRs and issues for the configured user
#[derive(Args, Debug)]
pub struct GithubArgs {
    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// How many days of closed issues to include (overrides config)
    #[arg(long)]
    closed_window_days: Option<u32>,
}

/// JSON document printed by `lookout github`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardEnvelope {
    /// Whether a username and token are both available
    pub configured: bool,
    pub fetched_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub dashboard: GitHubDashboard,
}

impl DashboardEnvelope {
    pub fn not_configured(now: DateTime<Utc>) -> Self {
        Self {
            configured: false,
            fetched_at: now,
            error: None,
            dashboard: GitHubDashboard::default(),
        }
    }

    /// Degraded response: configured, but with empty lists and the error
    pub fn failed(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            configured: true,
            fetched_at: now,
            error: Some(message.into()),
            dashboard: GitHubDashboard::default(),
        }
    }

    pub fn ready(dashboard: GitHubDashboard, now: DateTime<Utc>) -> Self {
        Self {
            configured: true,
            fetched_at: now,
            error: None,
            dashboard,
        }
    }
}

/// Run the pipeline and wrap its outcome
pub async fn build_envelope<S>(
    source: &S,
    username: &str,
    options: &DashboardOptions,
    now: DateTime<Utc>,
) -> DashboardEnvelope
where
    S: IssueSource + ?Sized,
{
    match fetch_dashboard(source, username, now, options).await {
        Ok(dashboard) => DashboardEnvelope::ready(dashboard, now),
        Err(e) => {
            warn!(username, error = %e, status = ?e.status(), "GitHub dashboard failed");
            DashboardEnvelope::failed(e.to_string(), now)
        }
    }
}

impl GithubArgs {
    /// Execute the github command
    ///
    /// The envelope is always printed; a failed fetch also returns an error
    /// so the process exits non-zero.
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let now = Utc::now();
        let options = self.options(config);

        let envelope = match config.github.username() {
            None => {
                info!("GitHub username not configured");
                DashboardEnvelope::not_configured(now)
            }
            Some(username) => match connect(config) {
                Ok(Some(client)) => build_envelope(&client, username, &options, now).await,
                Ok(None) => {
                    info!("GitHub token not configured");
                    DashboardEnvelope::not_configured(now)
                }
                Err(e) => DashboardEnvelope::failed(e.to_string(), now),
            },
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&envelope)?
        } else {
            serde_json::to_string(&envelope)?
        };
        println!("{}", json);

        if let Some(error) = envelope.error {
            anyhow::bail!("GitHub dashboard failed: {}", error);
        }

        Ok(())
    }

    fn options(&self, config: &Config) -> DashboardOptions {
        let mut options = DashboardOptions::from(&config.github);
        if let Some(days) = self.closed_window_days {
            options.closed_window_days = days;
        }
        options
    }
}

/// Client for the configured token, or `None` when there is no token
fn connect(config: &Config) -> anyhow::Result<Option<GitHubClient>> {
    let secrets = Secrets::load()?;
    Ok(GitHubClient::from_secrets(&secrets, &config.github)?)
}
