//! Seam between the dashboard pipeline and the GitHub APIs

use async_trait::async_trait;

use crate::{GitHubClient, MetadataBatch, Result, SearchItem};

/// Read-only access to the GitHub data the dashboard needs
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Run one issue/PR search, returning at most `per_page` items
    async fn search(&self, query: &str, per_page: u8) -> Result<Vec<SearchItem>>;

    /// Look up parent and iteration metadata for a batch of node ids
    async fn issue_metadata(&self, node_ids: &[String]) -> Result<MetadataBatch>;
}

#[async_trait]
impl IssueSource for GitHubClient {
    async fn search(&self, query: &str, per_page: u8) -> Result<Vec<SearchItem>> {
        self.search_issues(query, per_page).await
    }

    async fn issue_metadata(&self, node_ids: &[String]) -> Result<MetadataBatch> {
        self.get_issue_metadata(node_ids).await
    }
}
