//! Parent and iteration metadata for issues

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{Error, IssueSource, SearchItem};

/// Node ids accepted by one GraphQL `nodes` lookup
pub const MAX_NODES_PER_QUERY: usize = 100;

/// Iteration length used when the project field doesn't report one
pub const DEFAULT_ITERATION_DAYS: u32 = 14;

/// Reference to a parent issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    /// GraphQL node id, keyed like `SearchItem::node_id`
    #[serde(rename = "node_id")]
    pub id: String,
    pub number: u64,
    pub title: String,
    pub url: String,
}

/// Project iteration an issue is scheduled in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Iteration {
    pub title: String,
    pub start_date: NaiveDate,
    /// Length in days
    pub duration: Option<u32>,
}

impl Iteration {
    /// Length in days, defaulting to two weeks
    pub fn duration_days(&self) -> u32 {
        self.duration.unwrap_or(DEFAULT_ITERATION_DAYS)
    }

    /// Start of the iteration (midnight UTC on the start date)
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.start_date.and_time(NaiveTime::MIN).and_utc()
    }

    /// End of the iteration, inclusive
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at() + Duration::days(i64::from(self.duration_days()))
    }
}

/// Enrichment fetched for one issue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueMetadata {
    pub parent: Option<ParentRef>,
    pub iteration: Option<Iteration>,
}

/// A search item with its metadata attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(flatten)]
    pub item: SearchItem,
    #[serde(flatten)]
    pub metadata: IssueMetadata,
}

impl Issue {
    /// Wrap an item with no metadata
    pub fn bare(item: SearchItem) -> Self {
        Self {
            item,
            metadata: IssueMetadata::default(),
        }
    }

    /// Stable identity (GraphQL node id)
    pub fn node_id(&self) -> &str {
        &self.item.node_id
    }

    /// Whether the resolved parent is this issue itself
    pub fn is_own_parent(&self) -> bool {
        self.metadata
            .parent
            .as_ref()
            .is_some_and(|p| p.id == self.item.node_id)
    }
}

/// Result of one batched metadata lookup
#[derive(Debug, Default)]
pub struct MetadataBatch {
    /// Metadata keyed by node id; ids GitHub didn't resolve are absent
    pub metadata: HashMap<String, IssueMetadata>,
    /// Set when GitHub reported errors alongside the data
    pub partial: Option<Error>,
}

/// Attach parent and iteration metadata to issues
///
/// Lookups are batched by node id, so a page of issues costs one request.
/// Enrichment is best effort: a failed batch is logged and its issues pass
/// through with no metadata. Output order matches input order.
pub async fn resolve_metadata<S>(source: &S, items: Vec<SearchItem>) -> Vec<Issue>
where
    S: IssueSource + ?Sized,
{
    if items.is_empty() {
        return Vec::new();
    }

    let node_ids: Vec<String> = {
        let mut seen: HashSet<&str> = HashSet::with_capacity(items.len());
        items
            .iter()
            .filter(|item| seen.insert(item.node_id.as_str()))
            .map(|item| item.node_id.clone())
            .collect()
    };

    let mut resolved: HashMap<String, IssueMetadata> = HashMap::new();
    for chunk in node_ids.chunks(MAX_NODES_PER_QUERY) {
        debug!(count = chunk.len(), "Fetching issue metadata");
        match source.issue_metadata(chunk).await {
            Ok(batch) => {
                if let Some(partial) = batch.partial {
                    warn!(error = %partial, "Issue metadata is incomplete, continuing with partial data");
                }
                resolved.extend(batch.metadata);
            }
            Err(e) => {
                warn!(error = %e, count = chunk.len(), "Failed to fetch issue metadata, leaving issues unenriched");
            }
        }
    }

    info!(
        requested = node_ids.len(),
        resolved = resolved.len(),
        "Resolved issue metadata"
    );

    items
        .into_iter()
        .map(|item| {
            let metadata = resolved.get(&item.node_id).cloned().unwrap_or_default();
            Issue { item, metadata }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{item, iteration, parent, FakeSource};

    #[test]
    fn test_iteration_window_defaults_to_two_weeks() {
        let it = iteration("Sprint 1", 2024, 3, 1);
        assert_eq!(it.duration_days(), 14);
        assert_eq!(it.starts_at().to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(it.ends_at().to_rfc3339(), "2024-03-15T00:00:00+00:00");
    }

    #[test]
    fn test_iteration_serializes_camel_case() {
        let it = Iteration {
            duration: Some(7),
            ..iteration("Sprint 2", 2024, 3, 15)
        };
        let json = serde_json::to_value(&it).unwrap();
        assert_eq!(json["startDate"], "2024-03-15");
        assert_eq!(json["duration"], 7);
    }

    #[test]
    fn test_issue_flattens_metadata() {
        let issue = Issue {
            item: item("I_2", 2),
            metadata: IssueMetadata {
                parent: Some(parent("I_1", 1)),
                iteration: None,
            },
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["node_id"], "I_2");
        assert_eq!(json["parent"]["node_id"], "I_1");
        assert!(json["parent"].get("id").is_none());
        assert!(json["iteration"].is_null());
    }

    #[test]
    fn test_is_own_parent() {
        let mut issue = Issue::bare(item("I_1", 1));
        assert!(!issue.is_own_parent());
        issue.metadata.parent = Some(parent("I_1", 1));
        assert!(issue.is_own_parent());
    }

    #[tokio::test]
    async fn test_resolve_empty_input_makes_no_calls() {
        let source = FakeSource::default();
        let issues = resolve_metadata(&source, vec![]).await;
        assert!(issues.is_empty());
        assert_eq!(source.metadata_calls(), 0);
    }

    #[tokio::test]
    async fn test_resolve_attaches_metadata_by_node_id() {
        let source = FakeSource::default().with_metadata(
            "I_2",
            IssueMetadata {
                parent: Some(parent("I_1", 1)),
                iteration: Some(iteration("Sprint 1", 2024, 3, 1)),
            },
        );

        let issues = resolve_metadata(&source, vec![item("I_1", 1), item("I_2", 2)]).await;

        assert_eq!(source.metadata_calls(), 1);
        assert_eq!(issues[0].node_id(), "I_1");
        assert_eq!(issues[0].metadata, IssueMetadata::default());
        assert_eq!(issues[1].metadata.parent.as_ref().unwrap().id, "I_1");
        assert_eq!(issues[1].metadata.iteration.as_ref().unwrap().title, "Sprint 1");
    }

    #[tokio::test]
    async fn test_resolve_failure_passes_issues_through() {
        let source = FakeSource::default()
            .with_metadata(
                "I_2",
                IssueMetadata {
                    parent: Some(parent("I_1", 1)),
                    iteration: None,
                },
            )
            .failing_metadata();

        let issues = resolve_metadata(&source, vec![item("I_1", 1), item("I_2", 2)]).await;

        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.metadata == IssueMetadata::default()));
    }

    #[tokio::test]
    async fn test_resolve_partial_errors_keep_data() {
        let source = FakeSource::default()
            .with_metadata(
                "I_1",
                IssueMetadata {
                    parent: Some(parent("I_9", 9)),
                    iteration: None,
                },
            )
            .partial_metadata("Could not resolve to a node with the global id of 'I_2'");

        let issues = resolve_metadata(&source, vec![item("I_1", 1), item("I_2", 2)]).await;

        assert_eq!(issues[0].metadata.parent.as_ref().unwrap().id, "I_9");
        assert!(issues[1].metadata.parent.is_none());
    }

    #[tokio::test]
    async fn test_resolve_batches_large_inputs() {
        let source = FakeSource::default();
        let items: Vec<SearchItem> = (0..250).map(|n| item(&format!("I_{}", n), n)).collect();

        let issues = resolve_metadata(&source, items).await;

        assert_eq!(issues.len(), 250);
        assert_eq!(source.metadata_calls(), 3);
    }

    #[tokio::test]
    async fn test_resolve_requests_each_node_id_once() {
        let source = FakeSource::default().with_metadata(
            "I_7",
            IssueMetadata {
                parent: Some(parent("I_1", 1)),
                iteration: None,
            },
        );
        // 100 distinct ids, each listed twice
        let items: Vec<SearchItem> = (0..200)
            .map(|n| item(&format!("I_{}", n % 100), n % 100))
            .collect();

        let issues = resolve_metadata(&source, items).await;

        assert_eq!(source.metadata_calls(), 1);
        assert_eq!(issues.len(), 200);
        assert!(issues[7].metadata.parent.is_some());
        assert!(issues[107].metadata.parent.is_some());
    }
}
