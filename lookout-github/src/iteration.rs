//! Iteration bucketing of issue groups

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Issue, IssueGroup, Iteration};

/// Where a group sits relative to the current iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IterationBucket {
    Current,
    Future,
    Backlog,
}

impl IterationBucket {
    /// Bucket for an optional iteration at `now`
    ///
    /// Current when `start <= now <= start + duration`, future when the start
    /// is after `now`, backlog otherwise (including no iteration at all).
    pub fn of(iteration: Option<&Iteration>, now: DateTime<Utc>) -> Self {
        match iteration {
            Some(it) if it.starts_at() > now => IterationBucket::Future,
            Some(it) if now <= it.ends_at() => IterationBucket::Current,
            _ => IterationBucket::Backlog,
        }
    }
}

/// Iteration that decides a group's bucket
///
/// The head's own iteration, else the first sub-issue that has one.
pub fn group_iteration(group: &IssueGroup) -> Option<&Iteration> {
    group.head.iteration().or_else(|| {
        group
            .sub_issues
            .iter()
            .find_map(|issue| issue.metadata.iteration.as_ref())
    })
}

/// Bucket for a group at `now`
pub fn classify(group: &IssueGroup, now: DateTime<Utc>) -> IterationBucket {
    IterationBucket::of(group_iteration(group), now)
}

/// Bucket for a lone issue, using only its own iteration
pub fn classify_issue(issue: &Issue, now: DateTime<Utc>) -> IterationBucket {
    IterationBucket::of(issue.metadata.iteration.as_ref(), now)
}

/// Most recent update across a group and its sub-issues
///
/// A head without its own timestamp counts as the Unix epoch.
pub fn activity_at(group: &IssueGroup) -> DateTime<Utc> {
    let own = group.head.updated_at().unwrap_or(DateTime::UNIX_EPOCH);
    group
        .sub_issues
        .iter()
        .map(|issue| issue.item.updated_at)
        .fold(own, |latest, at| latest.max(at))
}

/// Sort most recently active first, keeping input order for ties
pub fn sort_by_activity(groups: &mut [IssueGroup]) {
    groups.sort_by_key(|g| Reverse(activity_at(g)));
}

/// Groups split by iteration bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Buckets {
    pub current: Vec<IssueGroup>,
    pub future: Vec<IssueGroup>,
    pub backlog: Vec<IssueGroup>,
}

impl Buckets {
    /// Classify every group, set its display iteration and sort each bucket
    pub fn classify(groups: Vec<IssueGroup>, now: DateTime<Utc>) -> Self {
        let mut buckets = Buckets::default();

        for mut group in groups {
            group.display_iteration = group_iteration(&group).map(|it| it.title.clone());
            match classify(&group, now) {
                IterationBucket::Current => buckets.current.push(group),
                IterationBucket::Future => buckets.future.push(group),
                IterationBucket::Backlog => buckets.backlog.push(group),
            }
        }

        sort_by_activity(&mut buckets.current);
        sort_by_activity(&mut buckets.future);
        sort_by_activity(&mut buckets.backlog);

        debug!(
            current = buckets.current.len(),
            future = buckets.future.len(),
            backlog = buckets.backlog.len(),
            "Classified issue groups"
        );

        buckets
    }
}
