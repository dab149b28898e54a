//! Narrative synthesis.

use super::aggregator::AggregatedContext;
use crate::error::OracleError;
use crate::oracle::LanguageOracle;
use std::sync::Arc;
use tracing::debug;

/// Produces the final answer from the query and the aggregated results.
pub struct Synthesizer {
    oracle: Arc<dyn LanguageOracle>,
}

impl Synthesizer {
    pub fn new(oracle: Arc<dyn LanguageOracle>) -> Self {
        Self { oracle }
    }

    /// One synthesis oracle call. Errors are returned as-is; there is no
    /// fallback narrative.
    pub async fn synthesize(
        &self,
        query: &str,
        context: &AggregatedContext,
    ) -> Result<String, OracleError> {
        let prompt = synthesis_prompt(query, &context.render());
        debug!("Synthesis prompt is {} bytes", prompt.len());

        let summary = self.oracle.complete(&prompt).await?;
        Ok(summary.trim().to_string())
    }
}

fn synthesis_prompt(query: &str, results: &str) -> String {
    format!(
        r#"You are a data analyst. Given the following high-level query and results from subqueries,
synthesize a coherent, insightful summary that addresses the original question.

Original query: {query}

Subquery results:
{results}

Provide a summary that:
1. Directly answers the original query
2. Highlights key figures, patterns and trends
3. Mentions any notable outliers or anomalies
4. Uses specific numbers and percentages when relevant
5. Is written in a professional, concise style

Your summary:"#
    )
}
