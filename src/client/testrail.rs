//! TestRail HTTP client
//!
//! Talks to the TestRail v2 API (`index.php?/api/v2/...`) with basic auth.
//! List endpoints answer either with a bare array (older servers) or with a
//! paginated object carrying `_links.next`; both shapes are accepted.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::TestManagementClient;
use crate::config::TestRailConfig;
use crate::models::{Batch, Plan, Project, Run, RunId, TestInstance};

/// TestRail API errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Connection refused to {0}")]
    ConnectionRefused(String),

    #[error("HTTP {status} from {endpoint}: {body}")]
    Status {
        status: u16,
        endpoint: String,
        body: String,
    },

    #[error("Unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

#[derive(Debug, Deserialize)]
struct NamedEntity {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlanDetail {
    #[serde(default)]
    entries: Vec<PlanEntry>,
}

#[derive(Debug, Deserialize)]
struct PlanEntry {
    #[serde(default)]
    runs: Vec<RunEntity>,
}

#[derive(Debug, Deserialize)]
struct RunEntity {
    id: u64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct TestEntity {
    id: u64,
    case_id: u64,
}

#[derive(Debug, Serialize)]
struct AddResults<'a> {
    results: Vec<ResultPayload<'a>>,
}

#[derive(Debug, Serialize)]
struct ResultPayload<'a> {
    test_id: u64,
    status_id: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
    assignedto_id: u64,
}

impl<'a> AddResults<'a> {
    fn from_batch(batch: &'a Batch) -> Self {
        Self {
            results: batch
                .iter()
                .map(|record| ResultPayload {
                    test_id: record.instance_id.get(),
                    status_id: record.verdict.status_id(),
                    comment: record.comment.as_deref(),
                    assignedto_id: record.assignee_id,
                })
                .collect(),
        }
    }
}

/// TestRail API client
#[derive(Clone)]
pub struct TestRailClient {
    client: Client,
    base_url: String,
    username: String,
    api_key: String,
    timeout_secs: u64,
}

impl TestRailClient {
    /// Create a client from resolved configuration
    pub fn new(config: &TestRailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Build full URL for an API endpoint such as `get_plan/7`
    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/index.php?/api/v2/{}", self.base_url, endpoint)
    }

    /// Build full URL for a `_links.next` value such as `/api/v2/get_tests/1&offset=250`
    fn link_url(&self, link: &str) -> String {
        format!("{}/index.php?{}", self.base_url, link)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.api_key))
    }

    async fn send(&self, builder: RequestBuilder, endpoint: &str) -> Result<Value, ApiError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                ApiError::ConnectionRefused(self.base_url.clone())
            } else {
                ApiError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        debug!("Response: {} from {}", status.as_u16(), endpoint);

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    async fn get(&self, endpoint: &str) -> Result<Value, ApiError> {
        debug!("GET {}", endpoint);
        let url = self.endpoint_url(endpoint);
        self.send(self.request(Method::GET, &url), endpoint).await
    }

    /// Fetch every page of a list endpoint
    async fn get_list<T: DeserializeOwned>(&self, endpoint: &str, key: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = self.get(endpoint).await?;

        loop {
            let (chunk, next) = split_page(page, endpoint, key)?;
            items.extend(chunk);

            match next {
                Some(link) => {
                    debug!("GET {}", link);
                    let url = self.link_url(&link);
                    page = self.send(self.request(Method::GET, &url), &link).await?;
                }
                None => break,
            }
        }

        Ok(items)
    }
}

/// Split one list response into its items and the next-page link
fn split_page<T: DeserializeOwned>(
    page: Value,
    endpoint: &str,
    key: &str,
) -> Result<(Vec<T>, Option<String>), ApiError> {
    let decode = |reason: String| ApiError::Decode {
        endpoint: endpoint.to_string(),
        reason,
    };

    match page {
        Value::Array(list) => {
            let items =
                serde_json::from_value(Value::Array(list)).map_err(|e| decode(e.to_string()))?;
            Ok((items, None))
        }
        Value::Object(mut map) => {
            let next = map
                .get("_links")
                .and_then(|links| links.get("next"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let list = map
                .remove(key)
                .ok_or_else(|| decode(format!("missing '{key}' field")))?;
            let items = serde_json::from_value(list).map_err(|e| decode(e.to_string()))?;
            Ok((items, next))
        }
        other => Err(decode(format!("expected a list, got {other}"))),
    }
}

#[async_trait]
impl TestManagementClient for TestRailClient {
    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        let projects: Vec<NamedEntity> = self.get_list("get_projects", "projects").await?;
        Ok(projects
            .into_iter()
            .find(|p| p.name == name)
            .map(|p| Project {
                id: p.id,
                name: p.name,
            }))
    }

    async fn find_plan_by_name(&self, project: &Project, name: &str) -> Result<Option<Plan>> {
        let endpoint = format!("get_plans/{}", project.id);
        let plans: Vec<NamedEntity> = self.get_list(&endpoint, "plans").await?;
        Ok(plans.into_iter().find(|p| p.name == name).map(|p| Plan {
            id: p.id,
            name: p.name,
        }))
    }

    async fn list_runs(&self, plan: &Plan) -> Result<Vec<Run>> {
        let endpoint = format!("get_plan/{}", plan.id);
        let value = self.get(&endpoint).await?;
        let detail: PlanDetail = serde_json::from_value(value).map_err(|e| ApiError::Decode {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;

        Ok(detail
            .entries
            .into_iter()
            .flat_map(|entry| entry.runs)
            .map(|run| Run::new(run.id, run.name))
            .collect())
    }

    async fn list_test_instances(&self, run: &Run) -> Result<Vec<TestInstance>> {
        let endpoint = format!("get_tests/{}", run.id.get());
        let tests: Vec<TestEntity> = self.get_list(&endpoint, "tests").await?;
        Ok(tests
            .into_iter()
            .map(|t| TestInstance::new(t.id, t.case_id))
            .collect())
    }

    async fn submit_results(&self, run_id: RunId, batch: &Batch) -> Result<()> {
        let endpoint = format!("add_results/{}", run_id.get());
        debug!("POST {} ({} results)", endpoint, batch.len());

        let url = self.endpoint_url(&endpoint);
        let builder = self
            .request(Method::POST, &url)
            .json(&AddResults::from_batch(batch));
        self.send(builder, &endpoint).await?;
        Ok(())
    }
}
