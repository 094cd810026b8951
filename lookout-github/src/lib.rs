//! Lookout GitHub - the GitHub half of the Lookout status dashboard
//!
//! This crate searches GitHub for the PRs and issues that involve a user,
//! enriches issues with their parent and project iteration, groups them into
//! a two-level hierarchy and buckets the groups by iteration.

mod client;
mod dashboard;
mod error;
mod graphql;
mod hierarchy;
mod iteration;
mod metadata;
mod search;
mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use client::GitHubClient;
pub use dashboard::{fetch_dashboard, DashboardOptions, GitHubDashboard};
pub use error::{Error, Result};
pub use hierarchy::{build_hierarchy, GroupHead, IssueGroup};
pub use iteration::{
    activity_at, classify, classify_issue, group_iteration, sort_by_activity, Buckets,
    IterationBucket,
};
pub use metadata::{
    resolve_metadata, Issue, IssueMetadata, Iteration, MetadataBatch, ParentRef,
    DEFAULT_ITERATION_DAYS, MAX_NODES_PER_QUERY,
};
pub use search::{
    deduplicate, deduplicate_group, merge, repository_slug, search_all, sort_by_updated, Category,
    CategoryGroup, ItemState, Label, SearchItem, SearchQuery, PER_PAGE,
};
pub use source::IssueSource;
