//! Subquery execution with per-subquery failure isolation.

use crate::datasource::DataAccessTool;
use crate::models::{DataToolPayload, SubqueryOutcome, SubqueryResult};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{error, info};

/// Message recorded when the data tool answers with something that is not
/// the expected tabular payload.
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse data tool output";

/// Runs subqueries against the scoped data tool.
pub struct SubqueryExecutor {
    tool: Arc<dyn DataAccessTool>,
    concurrency: usize,
}

impl SubqueryExecutor {
    pub fn new(tool: Arc<dyn DataAccessTool>, concurrency: usize) -> Self {
        Self {
            tool,
            concurrency: concurrency.max(1),
        }
    }

    /// Execute every descriptor under `organization_id`.
    ///
    /// Returns exactly one outcome per descriptor, in descriptor order. A
    /// failing subquery becomes a [`SubqueryOutcome::Failed`] record and
    /// never stops the ones after it.
    pub async fn execute(
        &self,
        descriptors: &[String],
        organization_id: &str,
    ) -> Vec<SubqueryOutcome> {
        info!(
            "Executing {} subqueries for org {} (concurrency {})",
            descriptors.len(),
            organization_id,
            self.concurrency
        );

        // `buffered` yields in submission order regardless of completion order.
        let outcomes: Vec<SubqueryOutcome> = stream::iter(descriptors)
            .map(|descriptor| self.execute_one(descriptor, organization_id))
            .buffered(self.concurrency)
            .collect()
            .await;

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        if failed > 0 {
            info!("{} of {} subqueries failed", failed, outcomes.len());
        }

        outcomes
    }

    async fn execute_one(&self, descriptor: &str, organization_id: &str) -> SubqueryOutcome {
        let raw = match self.tool.execute(descriptor, organization_id).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(
                    "Error executing subquery '{}' for org {}: {}",
                    descriptor, organization_id, e
                );
                return SubqueryOutcome::failed(e.to_string());
            }
        };

        match serde_json::from_str::<DataToolPayload>(&raw) {
            Ok(payload) => SubqueryOutcome::Ok(SubqueryResult::from(payload)),
            Err(e) => {
                error!(
                    "Failed to decode data tool output for '{}': {}",
                    descriptor, e
                );
                SubqueryOutcome::failed(PARSE_FAILURE_MESSAGE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ERROR_COLUMN;
    use crate::testing::{table_payload, StubDataTool};
    use serde_json::json;
    use std::time::Duration;

    fn plan(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_results_align_with_plan() {
        let tool = StubDataTool::new()
            .with_payload("q1", table_payload(&["n"], vec![json!([1])], "one"))
            .with_payload("q2", table_payload(&["n"], vec![json!([2])], "two"))
            .with_payload("q3", table_payload(&["n"], vec![json!([3])], "three"));
        let executor = SubqueryExecutor::new(Arc::new(tool), 1);

        let outcomes = executor.execute(&plan(&["q1", "q2", "q3"]), "org-1").await;

        assert_eq!(outcomes.len(), 3);
        let narratives: Vec<_> = outcomes.iter().map(|o| o.result().narrative.as_str()).collect();
        assert_eq!(narratives, vec!["one", "two", "three"]);
        assert!(outcomes.iter().all(|o| o.is_ok() && o.result().ok));
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let tool = Arc::new(
            StubDataTool::new()
                .with_payload("q1", table_payload(&["n"], vec![json!([1])], "ok"))
                .with_failure("q2", "relation does not exist")
                .with_payload("q3", table_payload(&["n"], vec![json!([3])], "ok")),
        );
        let executor = SubqueryExecutor::new(tool.clone(), 1);

        let outcomes = executor.execute(&plan(&["q1", "q2", "q3"]), "org-1").await;

        assert!(outcomes[0].is_ok());
        assert!(outcomes[2].is_ok());

        let failed = outcomes[1].result();
        assert!(!outcomes[1].is_ok());
        assert!(!failed.ok);
        assert_eq!(failed.columns, vec![ERROR_COLUMN]);
        let message = failed.rows[0][0].as_str().unwrap();
        assert!(message.contains("relation does not exist"));
        assert_eq!(failed.narrative, format!("Error: {}", message));

        assert_eq!(tool.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_unparsable_payload_is_a_failed_record() {
        let tool = StubDataTool::new()
            .with_raw("q1", "SELECT count(*) returned 5")
            .with_raw("q2", r#"{"text": "no table here"}"#);
        let executor = SubqueryExecutor::new(Arc::new(tool), 1);

        let outcomes = executor.execute(&plan(&["q1", "q2"]), "org-1").await;

        for outcome in &outcomes {
            let result = outcome.result();
            assert!(!result.ok);
            assert_eq!(result.columns, vec![ERROR_COLUMN]);
            assert_eq!(result.rows, vec![vec![json!(PARSE_FAILURE_MESSAGE)]]);
            assert_eq!(result.narrative, format!("Error: {}", PARSE_FAILURE_MESSAGE));
        }
    }

    #[tokio::test]
    async fn test_scope_is_forwarded_unchanged() {
        let tool = Arc::new(
            StubDataTool::new()
                .with_payload("q1", table_payload(&["n"], vec![], "ok"))
                .with_payload("q2", table_payload(&["n"], vec![], "ok")),
        );
        let executor = SubqueryExecutor::new(tool.clone(), 1);

        executor.execute(&plan(&["q1", "q2"]), "org-7f3a").await;

        assert_eq!(
            tool.calls(),
            vec![
                ("q1".to_string(), "org-7f3a".to_string()),
                ("q2".to_string(), "org-7f3a".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_execution_preserves_order() {
        let tool = StubDataTool::new()
            .with_payload("slow", table_payload(&["n"], vec![json!([1])], "slow"))
            .with_delay("slow", Duration::from_millis(80))
            .with_payload("medium", table_payload(&["n"], vec![json!([2])], "medium"))
            .with_delay("medium", Duration::from_millis(30))
            .with_payload("fast", table_payload(&["n"], vec![json!([3])], "fast"));
        let executor = SubqueryExecutor::new(Arc::new(tool), 3);

        let outcomes = executor
            .execute(&plan(&["slow", "medium", "fast"]), "org-1")
            .await;

        let narratives: Vec<_> = outcomes.iter().map(|o| o.result().narrative.as_str()).collect();
        assert_eq!(narratives, vec!["slow", "medium", "fast"]);
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let executor = SubqueryExecutor::new(Arc::new(StubDataTool::new()), 0);
        assert_eq!(executor.concurrency, 1);
    }
}
