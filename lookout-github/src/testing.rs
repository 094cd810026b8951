//! In-memory fixtures for pipeline tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::{
    Error, IssueMetadata, IssueSource, ItemState, Iteration, MetadataBatch, ParentRef, Result,
    SearchItem,
};

pub(crate) fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub(crate) fn item(node_id: &str, number: u64) -> SearchItem {
    SearchItem {
        id: number,
        node_id: node_id.to_string(),
        number,
        title: format!("Item {}", number),
        html_url: format!("https://github.com/acme/widgets/issues/{}", number),
        repository: "acme/widgets".to_string(),
        author: "octocat".to_string(),
        author_avatar_url: None,
        labels: vec![],
        state: ItemState::Open,
        is_pull_request: false,
        comments: 0,
        created_at: at(2024, 1, 1),
        updated_at: at(2024, 1, 1),
        closed_at: None,
        categories: vec![],
    }
}

pub(crate) fn updated(mut item: SearchItem, when: DateTime<Utc>) -> SearchItem {
    item.updated_at = when;
    item
}

pub(crate) fn parent(id: &str, number: u64) -> ParentRef {
    ParentRef {
        id: id.to_string(),
        number,
        title: format!("Parent {}", number),
        url: format!("https://github.com/acme/widgets/issues/{}", number),
    }
}

pub(crate) fn iteration(title: &str, y: i32, m: u32, d: u32) -> Iteration {
    Iteration {
        title: title.to_string(),
        start_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        duration: None,
    }
}

/// Scripted `IssueSource`
///
/// Search results are matched by the first needle contained in the query.
#[derive(Default)]
pub(crate) struct FakeSource {
    searches: Vec<(String, Vec<SearchItem>)>,
    failing_search: Option<(String, Option<u16>)>,
    metadata: HashMap<String, IssueMetadata>,
    fail_metadata: bool,
    partial: Option<String>,
    search_calls: AtomicUsize,
    per_page: Mutex<Vec<u8>>,
    metadata_calls: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn with_search(mut self, needle: &str, items: Vec<SearchItem>) -> Self {
        self.searches.push((needle.to_string(), items));
        self
    }

    pub(crate) fn failing_search(mut self, needle: &str, status: u16) -> Self {
        self.failing_search = Some((needle.to_string(), Some(status)));
        self
    }

    pub(crate) fn timing_out_search(mut self, needle: &str) -> Self {
        self.failing_search = Some((needle.to_string(), None));
        self
    }

    pub(crate) fn with_metadata(mut self, node_id: &str, metadata: IssueMetadata) -> Self {
        self.metadata.insert(node_id.to_string(), metadata);
        self
    }

    pub(crate) fn failing_metadata(mut self) -> Self {
        self.fail_metadata = true;
        self
    }

    pub(crate) fn partial_metadata(mut self, message: &str) -> Self {
        self.partial = Some(message.to_string());
        self
    }

    pub(crate) fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// `per_page` of every search, in call order
    pub(crate) fn per_page_requested(&self) -> Vec<u8> {
        self.per_page.lock().unwrap().clone()
    }

    pub(crate) fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IssueSource for FakeSource {
    async fn search(&self, query: &str, per_page: u8) -> Result<Vec<SearchItem>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.per_page.lock().unwrap().push(per_page);

        if let Some((needle, status)) = &self.failing_search {
            if query.contains(needle.as_str()) {
                return Err(match status {
                    Some(status) => Error::RemoteApi {
                        status: *status,
                        message: "scripted failure".to_string(),
                    },
                    None => Error::Timeout(Duration::from_secs(30)),
                });
            }
        }

        Ok(self
            .searches
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
            .map(|(_, items)| items.clone())
            .unwrap_or_default())
    }

    async fn issue_metadata(&self, node_ids: &[String]) -> Result<MetadataBatch> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_metadata {
            return Err(Error::Timeout(Duration::from_secs(30)));
        }

        Ok(MetadataBatch {
            metadata: node_ids
                .iter()
                .filter_map(|id| self.metadata.get(id).map(|m| (id.clone(), m.clone())))
                .collect(),
            partial: self.partial.clone().map(Error::PartialRemote),
        })
    }
}
