//! Issue and pull request search aggregation

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use octocrab::models::issues::Issue as OctocrabIssue;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::{IssueSource, Result};

/// Results requested per search query
pub const PER_PAGE: u8 = 100;

/// Issue or PR state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

impl From<octocrab::models::IssueState> for ItemState {
    fn from(state: octocrab::models::IssueState) -> Self {
        match state {
            octocrab::models::IssueState::Closed => ItemState::Closed,
            _ => ItemState::Open,
        }
    }
}

/// Label attached to an issue or PR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub color: String,
}

/// Which search matched an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    ReviewRequested,
    PrsMentioned,
    PrsAssigned,
    IssuesMentioned,
    IssuesAssigned,
    ClosedAssigned,
}

/// Categories deduplicated together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryGroup {
    PullRequests,
    OpenIssues,
    ClosedIssues,
}

impl Category {
    /// Every category, in the order results are merged
    pub const ALL: [Category; 6] = [
        Category::ReviewRequested,
        Category::PrsMentioned,
        Category::PrsAssigned,
        Category::IssuesMentioned,
        Category::IssuesAssigned,
        Category::ClosedAssigned,
    ];

    /// Group this category is deduplicated in
    pub fn group(self) -> CategoryGroup {
        match self {
            Category::ReviewRequested | Category::PrsMentioned | Category::PrsAssigned => {
                CategoryGroup::PullRequests
            }
            Category::IssuesMentioned | Category::IssuesAssigned => CategoryGroup::OpenIssues,
            Category::ClosedAssigned => CategoryGroup::ClosedIssues,
        }
    }

    /// Search query string for this category
    ///
    /// `closed_since` bounds the closed-issue search; other categories ignore it.
    pub fn query(self, username: &str, closed_since: DateTime<Utc>) -> String {
        match self {
            Category::ReviewRequested => format!("is:pr is:open review-requested:{}", username),
            Category::PrsMentioned => format!("is:pr is:open mentions:{}", username),
            Category::PrsAssigned => format!("is:pr is:open assignee:{}", username),
            Category::IssuesMentioned => format!("is:issue is:open mentions:{}", username),
            Category::IssuesAssigned => format!("is:issue is:open assignee:{}", username),
            Category::ClosedAssigned => format!(
                "is:issue is:closed assignee:{} closed:>={}",
                username,
                closed_since.format("%Y-%m-%d")
            ),
        }
    }
}

/// A named search to run against the search endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub category: Category,
    pub query: String,
}

impl SearchQuery {
    /// The fixed dashboard query set for a user
    pub fn dashboard_set(username: &str, now: DateTime<Utc>, closed_window_days: u32) -> Vec<Self> {
        let since = closed_since(now, closed_window_days);
        Category::ALL
            .into_iter()
            .map(|category| SearchQuery {
                category,
                query: category.query(username, since),
            })
            .collect()
    }
}

/// Start of the closed-issue window: midnight UTC, `days` days before `now`
///
/// Whole days, matching the `closed:>=YYYY-MM-DD` search qualifier.
pub fn closed_since(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    (now - Duration::days(i64::from(days)))
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// A PR or issue as returned by the search endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    /// Numeric REST id
    pub id: u64,
    /// Stable GraphQL node id, used as identity
    pub node_id: String,
    pub number: u64,
    pub title: String,
    pub html_url: String,
    /// `owner/repo`
    pub repository: String,
    /// Author login
    pub author: String,
    pub author_avatar_url: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub state: ItemState,
    pub is_pull_request: bool,
    pub comments: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Searches that matched, in discovery order
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl From<OctocrabIssue> for SearchItem {
    fn from(issue: OctocrabIssue) -> Self {
        SearchItem {
            id: issue.id.0,
            node_id: issue.node_id,
            number: issue.number,
            title: issue.title,
            html_url: issue.html_url.to_string(),
            repository: repository_slug(&issue.repository_url).unwrap_or_default(),
            author: issue.user.login,
            author_avatar_url: Some(issue.user.avatar_url.to_string()),
            labels: issue
                .labels
                .into_iter()
                .map(|l| Label {
                    name: l.name,
                    color: l.color,
                })
                .collect(),
            state: issue.state.into(),
            is_pull_request: issue.pull_request.is_some(),
            comments: issue.comments,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            closed_at: issue.closed_at,
            categories: Vec::new(),
        }
    }
}

/// Extract `owner/repo` from an API repository URL
///
/// `https://api.github.com/repos/owner/repo` becomes `owner/repo`.
pub fn repository_slug(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let repos = segments.iter().rposition(|s| *s == "repos")?;
    match &segments[repos + 1..] {
        [owner, repo, ..] => Some(format!("{}/{}", owner, repo)),
        _ => None,
    }
}

/// Run every query concurrently
///
/// Results come back in query order. The first failing query fails the whole
/// aggregation; no partial results are returned.
pub async fn search_all<S>(
    source: &S,
    queries: &[SearchQuery],
) -> Result<Vec<(Category, Vec<SearchItem>)>>
where
    S: IssueSource + ?Sized,
{
    let searches = queries.iter().map(|q| async move {
        debug!(category = ?q.category, query = %q.query, "Running search");
        let items = source.search(&q.query, PER_PAGE).await?;
        debug!(category = ?q.category, count = items.len(), "Search finished");
        Ok::<_, crate::Error>((q.category, items))
    });

    let results = futures::future::try_join_all(searches).await?;

    info!(
        queries = results.len(),
        items = results.iter().map(|(_, items)| items.len()).sum::<usize>(),
        "Search aggregation complete"
    );

    Ok(results)
}

/// Merge result lists into one record per node id
///
/// Each item is tagged with the category of the list it came from, then
/// merged with [`merge`].
pub fn deduplicate<I>(lists: I) -> Vec<SearchItem>
where
    I: IntoIterator<Item = (Category, Vec<SearchItem>)>,
{
    merge(lists.into_iter().flat_map(|(category, items)| {
        items.into_iter().map(move |mut item| {
            item.categories.push(category);
            item
        })
    }))
}

/// Merge tagged items into one record per node id
///
/// The first occurrence is kept as the record; later occurrences only add the
/// categories it doesn't already carry. Merging its own output is a no-op.
pub fn merge<I>(items: I) -> Vec<SearchItem>
where
    I: IntoIterator<Item = SearchItem>,
{
    let mut merged: Vec<SearchItem> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let pos = match index.get(&item.node_id) {
            Some(&pos) => pos,
            None => {
                index.insert(item.node_id.clone(), merged.len());
                merged.push(SearchItem {
                    categories: Vec::with_capacity(item.categories.len()),
                    ..item.clone()
                });
                merged.len() - 1
            }
        };

        let record = &mut merged[pos];
        for category in item.categories {
            if !record.categories.contains(&category) {
                record.categories.push(category);
            }
        }
    }

    merged
}

/// Deduplicate only the lists belonging to `group`
pub fn deduplicate_group(
    results: &[(Category, Vec<SearchItem>)],
    group: CategoryGroup,
) -> Vec<SearchItem> {
    deduplicate(
        results
            .iter()
            .filter(|(category, _)| category.group() == group)
            .map(|(category, items)| (*category, items.clone())),
    )
}

/// Sort most recently updated first, keeping input order for ties
pub fn sort_by_updated(items: &mut [SearchItem]) {
    items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}
