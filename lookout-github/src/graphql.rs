//! GitHub GraphQL API support for issue parents and project iterations

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{Error, GitHubClient, IssueMetadata, Iteration, MetadataBatch, ParentRef, Result};

/// Parent and iteration fields for a batch of issue node ids
const ISSUE_METADATA_QUERY: &str = r#"
    query($ids: [ID!]!) {
        nodes(ids: $ids) {
            ... on Issue {
                id
                parent {
                    id
                    number
                    title
                    url
                }
                projectItems(first: 20) {
                    nodes {
                        fieldValues(first: 50) {
                            nodes {
                                ... on ProjectV2ItemFieldIterationValue {
                                    title
                                    startDate
                                    duration
                                }
                            }
                        }
                    }
                }
            }
        }
    }
"#;

/// GraphQL query response wrapper
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error
#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct NodesData {
    nodes: Vec<Option<IssueNode>>,
}

/// Connection whose `nodes` may be null or contain nulls
#[derive(Debug, Deserialize)]
struct Connection<T> {
    nodes: Option<Vec<Option<T>>>,
}

impl<T> Connection<T> {
    fn into_nodes(self) -> impl Iterator<Item = T> {
        self.nodes.unwrap_or_default().into_iter().flatten()
    }
}

/// Issue node; fields are absent when the id resolved to something else
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueNode {
    id: Option<String>,
    parent: Option<ParentNode>,
    project_items: Option<Connection<ProjectItemNode>>,
}

#[derive(Debug, Deserialize)]
struct ParentNode {
    id: String,
    number: u64,
    title: String,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectItemNode {
    field_values: Option<Connection<FieldValueNode>>,
}

/// Project field value; only iteration values carry these fields
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldValueNode {
    title: Option<String>,
    start_date: Option<NaiveDate>,
    duration: Option<u32>,
}

impl From<ParentNode> for ParentRef {
    fn from(node: ParentNode) -> Self {
        ParentRef {
            id: node.id,
            number: node.number,
            title: node.title,
            url: node.url,
        }
    }
}

impl FieldValueNode {
    fn into_iteration(self) -> Option<Iteration> {
        Some(Iteration {
            title: self.title?,
            start_date: self.start_date?,
            duration: self.duration,
        })
    }
}

impl IssueNode {
    /// Metadata keyed by node id
    ///
    /// When an issue sits in several projects with iteration fields, the last
    /// iteration value in response order wins.
    fn into_metadata(self) -> Option<(String, IssueMetadata)> {
        let id = self.id?;

        let iteration = self
            .project_items
            .into_iter()
            .flat_map(Connection::into_nodes)
            .filter_map(|item| item.field_values)
            .flat_map(Connection::into_nodes)
            .filter_map(FieldValueNode::into_iteration)
            .last();

        Some((
            id,
            IssueMetadata {
                parent: self.parent.map(ParentRef::from),
                iteration,
            },
        ))
    }
}

fn metadata_batch(data: NodesData, errors: Vec<String>) -> MetadataBatch {
    MetadataBatch {
        metadata: data
            .nodes
            .into_iter()
            .flatten()
            .filter_map(IssueNode::into_metadata)
            .collect(),
        partial: (!errors.is_empty()).then(|| Error::PartialRemote(errors.join("; "))),
    }
}

/// Split a GraphQL body into data and error messages
fn split_response<T>(response: GraphQLResponse<T>) -> Result<(T, Vec<String>)> {
    let errors: Vec<String> = response
        .errors
        .unwrap_or_default()
        .into_iter()
        .map(|e| e.message)
        .collect();

    match response.data {
        Some(data) => Ok((data, errors)),
        None if errors.is_empty() => Err(Error::GraphQL("response missing data".to_string())),
        None => Err(Error::GraphQL(errors.join("; "))),
    }
}

impl GitHubClient {
    /// Fetch parent and iteration metadata for issues in one request
    ///
    /// Node ids that don't resolve to an issue are left out of the batch.
    pub async fn get_issue_metadata(&self, node_ids: &[String]) -> Result<MetadataBatch> {
        debug!(count = node_ids.len(), "Fetching issue metadata via GraphQL");

        let variables = json!({ "ids": node_ids });
        let (data, errors) = self
            .graphql_query::<NodesData>(ISSUE_METADATA_QUERY, &variables)
            .await?;

        Ok(metadata_batch(data, errors))
    }

    /// Execute a GraphQL query
    ///
    /// Returns the data together with any error messages GitHub sent next to it.
    async fn graphql_query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: &serde_json::Value,
    ) -> Result<(T, Vec<String>)> {
        let request_body = json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .http()
            .post(self.graphql_url().clone())
            .bearer_auth(self.token())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            return Err(Error::RemoteApi {
                status: status.as_u16(),
                message,
            });
        }

        let body: GraphQLResponse<T> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.timeout())
            } else {
                Error::Parse(format!("Failed to parse GraphQL response: {}", e))
            }
        })?;

        split_response(body)
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout())
        } else {
            Error::Http(e)
        }
    }
}
