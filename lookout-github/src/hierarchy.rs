//! Parent/child grouping of issues

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{Issue, Iteration, ParentRef};

/// Head of a group: a fetched issue, or a parent we only know by reference
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroupHead {
    Issue(Box<Issue>),
    ExternalParent(ParentRef),
}

impl GroupHead {
    /// Node id of the head
    pub fn node_id(&self) -> &str {
        match self {
            GroupHead::Issue(issue) => issue.node_id(),
            GroupHead::ExternalParent(parent) => &parent.id,
        }
    }

    /// Iteration recorded on the head itself
    pub fn iteration(&self) -> Option<&Iteration> {
        match self {
            GroupHead::Issue(issue) => issue.metadata.iteration.as_ref(),
            GroupHead::ExternalParent(_) => None,
        }
    }

    /// Last update of the head; unknown for external parents
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        match self {
            GroupHead::Issue(issue) => Some(issue.item.updated_at),
            GroupHead::ExternalParent(_) => None,
        }
    }
}

/// A top-level issue or external parent with the sub-issues under it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueGroup {
    #[serde(flatten)]
    pub head: GroupHead,
    pub sub_issues: Vec<Issue>,
    pub is_external_parent: bool,
    /// Title of the iteration the group was classified by
    pub display_iteration: Option<String>,
}

impl IssueGroup {
    /// Group headed by a fetched issue
    pub fn top_level(issue: Issue, sub_issues: Vec<Issue>) -> Self {
        Self {
            head: GroupHead::Issue(Box::new(issue)),
            sub_issues,
            is_external_parent: false,
            display_iteration: None,
        }
    }

    /// Placeholder group for a parent that wasn't fetched
    pub fn external(parent: ParentRef, sub_issues: Vec<Issue>) -> Self {
        Self {
            head: GroupHead::ExternalParent(parent),
            sub_issues,
            is_external_parent: true,
            display_iteration: None,
        }
    }

    /// Every fetched issue in the group, head first
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        let head = match &self.head {
            GroupHead::Issue(issue) => Some(issue.as_ref()),
            GroupHead::ExternalParent(_) => None,
        };
        head.into_iter().chain(self.sub_issues.iter())
    }
}

/// Rebuild the two-level parent/child hierarchy
///
/// Issues without a parent become top-level groups and collect the issues
/// that point at them. Parents that were referenced but not fetched (closed,
/// or outside the search) become external placeholder groups, emitted after
/// the top-level groups in the order their first child appeared. Every input
/// issue ends up in exactly one group.
///
/// Grouping is one level deep. An issue whose parent is itself a child (C ->
/// B -> A, all fetched) goes under a placeholder for B, so B shows up both as
/// a sub-issue of A and as the reference heading C's group. Placeholder heads
/// carry only the parent reference, never B's own record.
///
/// An issue listed as its own parent is treated as parentless.
pub fn build_hierarchy(issues: Vec<Issue>) -> Vec<IssueGroup> {
    let mut top_level: Vec<Issue> = Vec::new();
    let mut parent_order: Vec<String> = Vec::new();
    let mut children: HashMap<String, (ParentRef, Vec<Issue>)> = HashMap::new();

    for issue in issues {
        if issue.is_own_parent() {
            warn!(node_id = %issue.node_id(), number = issue.item.number, "Issue lists itself as parent");
        }

        let parent = issue
            .metadata
            .parent
            .as_ref()
            .filter(|p| p.id != issue.item.node_id)
            .cloned();

        match parent {
            Some(parent) => {
                let entry = children.entry(parent.id.clone()).or_insert_with(|| {
                    parent_order.push(parent.id.clone());
                    (parent, Vec::new())
                });
                entry.1.push(issue);
            }
            None => top_level.push(issue),
        }
    }

    let mut groups: Vec<IssueGroup> = top_level
        .into_iter()
        .map(|issue| {
            let sub_issues = children
                .remove(issue.node_id())
                .map(|(_, subs)| subs)
                .unwrap_or_default();
            IssueGroup::top_level(issue, sub_issues)
        })
        .collect();

    let top_level_count = groups.len();

    groups.extend(
        parent_order
            .into_iter()
            .filter_map(|id| children.remove(&id))
            .map(|(parent, subs)| IssueGroup::external(parent, subs)),
    );

    debug!(
        top_level = top_level_count,
        external = groups.len() - top_level_count,
        "Built issue hierarchy"
    );

    groups
}
