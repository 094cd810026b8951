//! Dashboard assembly: search, enrich, group and bucket

use chrono::{DateTime, Utc};
use lookout_core::GitHubConfig;
use serde::Serialize;
use tracing::info;

use crate::hierarchy::build_hierarchy;
use crate::iteration::{classify_issue, sort_by_activity, Buckets, IterationBucket};
use crate::metadata::resolve_metadata;
use crate::search::{
    closed_since, deduplicate_group, search_all, sort_by_updated, CategoryGroup, SearchQuery,
};
use crate::{IssueGroup, IssueSource, Result, SearchItem};

/// Knobs for one dashboard fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOptions {
    /// How far back closed issues are included
    pub closed_window_days: u32,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            closed_window_days: 30,
        }
    }
}

impl From<&GitHubConfig> for DashboardOptions {
    fn from(config: &GitHubConfig) -> Self {
        Self {
            closed_window_days: config.closed_window_days,
        }
    }
}

/// Everything the GitHub panel renders
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubDashboard {
    /// Open PRs, most recently updated first
    pub prs: Vec<SearchItem>,
    pub current_iteration: Vec<IssueGroup>,
    /// Recently closed issues from the current iteration
    pub current_iteration_closed: Vec<IssueGroup>,
    pub future_iterations: Vec<IssueGroup>,
    pub backlog: Vec<IssueGroup>,
}

/// Build the dashboard for `username` as of `now`
///
/// Any failed search fails the whole fetch. Metadata enrichment is best
/// effort, so a failed metadata lookup only loses grouping and iterations.
pub async fn fetch_dashboard<S>(
    source: &S,
    username: &str,
    now: DateTime<Utc>,
    options: &DashboardOptions,
) -> Result<GitHubDashboard>
where
    S: IssueSource + ?Sized,
{
    let queries = SearchQuery::dashboard_set(username, now, options.closed_window_days);
    let results = search_all(source, &queries).await?;

    let mut prs = deduplicate_group(&results, CategoryGroup::PullRequests);
    sort_by_updated(&mut prs);

    let open = deduplicate_group(&results, CategoryGroup::OpenIssues);
    let since = closed_since(now, options.closed_window_days);
    let closed: Vec<SearchItem> = deduplicate_group(&results, CategoryGroup::ClosedIssues)
        .into_iter()
        .filter(|item| item.closed_at.map_or(true, |at| at >= since))
        .collect();

    // One metadata pass covers open and closed issues
    let open_count = open.len();
    let mut enriched = resolve_metadata(source, open.into_iter().chain(closed).collect()).await;
    let closed = enriched.split_off(open_count);

    let buckets = Buckets::classify(build_hierarchy(enriched), now);

    let mut current_iteration_closed: Vec<IssueGroup> = closed
        .into_iter()
        .filter(|issue| classify_issue(issue, now) == IterationBucket::Current)
        .map(|issue| {
            let display_iteration = issue.metadata.iteration.as_ref().map(|it| it.title.clone());
            IssueGroup {
                display_iteration,
                ..IssueGroup::top_level(issue, Vec::new())
            }
        })
        .collect();
    sort_by_activity(&mut current_iteration_closed);

    info!(
        username,
        prs = prs.len(),
        current = buckets.current.len(),
        current_closed = current_iteration_closed.len(),
        future = buckets.future.len(),
        backlog = buckets.backlog.len(),
        "Built GitHub dashboard"
    );

    Ok(GitHubDashboard {
        prs,
        current_iteration: buckets.current,
        current_iteration_closed,
        future_iterations: buckets.future,
        backlog: buckets.backlog,
    })
}
