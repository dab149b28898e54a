//! Scoped data-access tool.
//!
//! The data tool turns one subquery description into a tabular payload for
//! a single organization. The organization id is the only access-control
//! boundary and is forwarded untouched on every call.

use crate::config::DataSourceConfig;
use crate::error::DataAccessError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Executes one subquery for one organization and returns the raw payload.
///
/// The payload is expected to be JSON of the form
/// `{"table": {"columns": [...], "rows": [[...]]}, "text": "..."}`; parsing
/// is left to the caller so malformed payloads can be told apart from
/// transport failures.
#[async_trait]
pub trait DataAccessTool: Send + Sync {
    async fn execute(
        &self,
        descriptor: &str,
        organization_id: &str,
    ) -> Result<String, DataAccessError>;
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    organization_id: &'a str,
}

/// Data tool backed by an HTTP query service.
pub struct HttpDataTool {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpDataTool {
    pub fn new(config: &DataSourceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/query", self.base_url)
    }
}

#[async_trait]
impl DataAccessTool for HttpDataTool {
    async fn execute(
        &self,
        descriptor: &str,
        organization_id: &str,
    ) -> Result<String, DataAccessError> {
        debug!("Querying data source for org {}: {}", organization_id, descriptor);

        let response = self
            .http_client
            .post(self.endpoint())
            .json(&QueryRequest {
                query: descriptor,
                organization_id,
            })
            .send()
            .await
            .map_err(|e| DataAccessError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DataAccessError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(DataAccessError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let config = DataSourceConfig {
            url: "http://localhost:8000/".to_string(),
            timeout_seconds: 10,
        };
        let tool = HttpDataTool::new(&config).unwrap();
        assert_eq!(tool.endpoint(), "http://localhost:8000/query");
    }

    #[test]
    fn test_request_carries_scope() {
        let body = serde_json::to_value(QueryRequest {
            query: "Count hierarchies by type",
            organization_id: "org-42",
        })
        .unwrap();

        assert_eq!(body["query"], "Count hierarchies by type");
        assert_eq!(body["organization_id"], "org-42");
    }
}
