//! Result aggregation.
//!
//! Turns the ordered (descriptor, outcome) pairs into the bounded text
//! context handed to synthesis. Each result contributes at most
//! [`SAMPLE_ROWS`] rows plus its true row count.

use crate::models::SubqueryOutcome;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use tracing::debug;

/// Maximum rows per subquery carried into the synthesis context.
pub const SAMPLE_ROWS: usize = 5;

/// One subquery's contribution to the synthesis context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextBlock {
    pub descriptor: String,
    pub columns: Vec<String>,
    /// First rows of the result, at most [`SAMPLE_ROWS`].
    pub sample_rows: Vec<Vec<Value>>,
    /// Row count of the full result.
    pub total_rows: usize,
}

impl ContextBlock {
    pub fn is_truncated(&self) -> bool {
        self.total_rows > self.sample_rows.len()
    }
}

impl fmt::Display for ContextBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = json!({"columns": self.columns, "rows": self.sample_rows});
        let table = serde_json::to_string_pretty(&table).unwrap_or_default();

        writeln!(f, "Subquery: {}", self.descriptor)?;
        writeln!(f, "Results (showing up to {} rows): {}", SAMPLE_ROWS, table)?;
        write!(f, "Total rows in original result: {}", self.total_rows)
    }
}

/// Read-only view of all subquery results, in plan order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedContext {
    pub blocks: Vec<ContextBlock>,
}

impl AggregatedContext {
    /// Render the context as the text block used in the synthesis prompt.
    pub fn render(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl fmt::Display for AggregatedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Pair descriptors with their outcomes and truncate each row set.
pub fn aggregate(descriptors: &[String], outcomes: &[SubqueryOutcome]) -> AggregatedContext {
    debug_assert_eq!(descriptors.len(), outcomes.len());

    let blocks = descriptors
        .iter()
        .zip(outcomes)
        .map(|(descriptor, outcome)| {
            let result = outcome.result();
            ContextBlock {
                descriptor: descriptor.clone(),
                columns: result.columns.clone(),
                sample_rows: result.rows.iter().take(SAMPLE_ROWS).cloned().collect(),
                total_rows: result.rows.len(),
            }
        })
        .collect::<Vec<ContextBlock>>();

    for block in blocks.iter().filter(|b| b.is_truncated()) {
        debug!(
            "Truncated '{}' to {} of {} rows",
            block.descriptor,
            block.sample_rows.len(),
            block.total_rows
        );
    }

    AggregatedContext { blocks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubqueryResult;

    fn ok_outcome(columns: &[&str], rows: Vec<Vec<Value>>) -> SubqueryOutcome {
        SubqueryOutcome::Ok(SubqueryResult::success(
            columns.iter().map(|c| c.to_string()).collect(),
            rows,
            "ok".to_string(),
        ))
    }

    #[test]
    fn test_small_result_is_kept_whole() {
        let descriptors = vec!["Count hierarchies by type".to_string()];
        let outcomes = vec![ok_outcome(
            &["type", "count"],
            vec![vec![json!("A"), json!(3)], vec![json!("B"), json!(5)]],
        )];

        let context = aggregate(&descriptors, &outcomes);

        assert_eq!(context.blocks.len(), 1);
        let block = &context.blocks[0];
        assert_eq!(block.sample_rows.len(), 2);
        assert_eq!(block.total_rows, 2);
        assert!(!block.is_truncated());

        let text = context.render();
        assert!(text.contains("Subquery: Count hierarchies by type"));
        assert!(text.contains("Total rows in original result: 2"));
        assert!(text.contains("\"type\""));
    }

    #[test]
    fn test_large_result_is_truncated_with_true_count() {
        let rows: Vec<Vec<Value>> = (0..42).map(|i| vec![json!(i)]).collect();
        let descriptors = vec!["Events per day".to_string()];
        let outcomes = vec![ok_outcome(&["n"], rows)];

        let context = aggregate(&descriptors, &outcomes);
        let block = &context.blocks[0];

        assert_eq!(block.sample_rows.len(), SAMPLE_ROWS);
        assert_eq!(block.sample_rows[4], vec![json!(4)]);
        assert_eq!(block.total_rows, 42);
        assert!(block.is_truncated());
        assert!(context.render().contains("Total rows in original result: 42"));
    }

    #[test]
    fn test_blocks_follow_plan_order() {
        let descriptors = vec!["first".to_string(), "second".to_string()];
        let outcomes = vec![ok_outcome(&["a"], vec![]), SubqueryOutcome::failed("boom")];

        let context = aggregate(&descriptors, &outcomes);
        let text = context.render();

        assert_eq!(context.blocks[0].descriptor, "first");
        assert_eq!(context.blocks[1].columns, vec!["Error"]);
        assert!(text.find("Subquery: first").unwrap() < text.find("Subquery: second").unwrap());
        assert!(text.contains("boom"));
    }
}
