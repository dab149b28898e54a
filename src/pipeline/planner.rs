//! Query decomposition.
//!
//! The planner asks the decomposition oracle for a JSON array of atomic
//! subqueries. It never fails: anything unusable collapses to a single
//! subquery equal to the original query.

use crate::config::PlannerConfig;
use crate::oracle::LanguageOracle;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Turns one high-level query into an ordered, non-empty list of subqueries.
pub struct QueryPlanner {
    oracle: Arc<dyn LanguageOracle>,
    config: PlannerConfig,
}

impl QueryPlanner {
    pub fn new(oracle: Arc<dyn LanguageOracle>, config: PlannerConfig) -> Self {
        Self { oracle, config }
    }

    /// Decompose `query` into subquery descriptors. Always non-empty.
    pub async fn decompose(&self, query: &str) -> Vec<String> {
        let prompt = decomposition_prompt(query);

        let raw = match self.oracle.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Decomposition oracle failed, using the query as-is: {}", e);
                return vec![query.to_string()];
            }
        };
        debug!("Raw decomposition output: {}", raw);

        let Some(descriptors) = parse_descriptors(&raw) else {
            warn!("Decomposition output is not a JSON array of subqueries, using the query as-is");
            return vec![query.to_string()];
        };

        let plan = self.apply_limits(descriptors);
        info!("Decomposed query into {} subqueries", plan.len());
        plan
    }

    fn apply_limits(&self, mut descriptors: Vec<String>) -> Vec<String> {
        let max = self.config.max_subqueries.max(1);
        if descriptors.len() > max {
            warn!(
                "Decomposition returned {} subqueries, keeping the first {}",
                descriptors.len(),
                max
            );
            descriptors.truncate(max);
        }

        let limit = self.config.max_descriptor_chars.max(1);
        for descriptor in descriptors.iter_mut() {
            if descriptor.chars().count() > limit {
                warn!("Truncating subquery to {} characters", limit);
                *descriptor = descriptor.chars().take(limit).collect();
            }
        }

        descriptors
    }
}

/// Remove a surrounding ```` ```json ```` / ```` ``` ```` code fence.
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// Parse oracle output into descriptors.
///
/// Returns `None` unless the output is a JSON array holding at least one
/// non-blank string. Non-string elements are skipped.
pub fn parse_descriptors(raw: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(strip_code_fence(raw)).ok()?;
    let Value::Array(items) = value else {
        return None;
    };

    let descriptors: Vec<String> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();

    if descriptors.is_empty() {
        None
    } else {
        Some(descriptors)
    }
}

fn decomposition_prompt(query: &str) -> String {
    format!(
        r#"You are a data analyst. Given the following high-level query or analysis request,
break it down into 2-5 specific, atomic subqueries that need to be executed to gather the necessary data.

The query may already contain resolved entity names and IDs (e.g. "...for Main Library (ID: 1f2e...)").
When IDs are provided, write subqueries that use those exact IDs for filtering or joining.

High-level query: {query}

Format your response as a JSON array of strings, each one a self-contained description of a
single data question.
Example with resolved IDs: ["Retrieve borrow count for hierarchy ID '1f2e' in the last 30 days", "Retrieve borrow count for hierarchy ID '9a7c' in the last 30 days"]
Example without IDs: ["Count active hierarchies by type", "Count subscriptions by type"]

Return ONLY the JSON array without any explanation or comments."#
    )
}
