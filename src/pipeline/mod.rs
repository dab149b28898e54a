//! The decompose → execute → aggregate → synthesize pipeline.
//!
//! Decomposition and subquery failures are absorbed into data; only a
//! synthesis failure fails the run.

pub mod aggregator;
pub mod executor;
pub mod planner;
pub mod synthesis;

pub use aggregator::aggregate;
pub use executor::SubqueryExecutor;
pub use planner::QueryPlanner;
pub use synthesis::Synthesizer;

use crate::config::Config;
use crate::datasource::DataAccessTool;
use crate::error::PipelineError;
use crate::models::{PipelineResult, RunTrace, TracedSubquery};
use crate::oracle::LanguageOracle;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Collaborators injected into a [`Pipeline`].
pub struct Collaborators {
    pub decomposition_oracle: Arc<dyn LanguageOracle>,
    pub synthesis_oracle: Arc<dyn LanguageOracle>,
    pub data_tool: Arc<dyn DataAccessTool>,
}

/// One summary pipeline. Holds no per-run state, so one instance can
/// serve any number of runs.
pub struct Pipeline {
    planner: QueryPlanner,
    executor: SubqueryExecutor,
    synthesizer: Synthesizer,
}

impl Pipeline {
    pub fn new(collaborators: Collaborators, config: &Config) -> Self {
        Self {
            planner: QueryPlanner::new(
                collaborators.decomposition_oracle,
                config.planner.clone(),
            ),
            executor: SubqueryExecutor::new(
                collaborators.data_tool,
                config.executor.concurrency,
            ),
            synthesizer: Synthesizer::new(collaborators.synthesis_oracle),
        }
    }

    /// Answer `query` using data scoped to `organization_id`.
    #[allow(dead_code)] // The CLI renders full traces via run_traced
    pub async fn run(
        &self,
        query: &str,
        organization_id: &str,
    ) -> Result<PipelineResult, PipelineError> {
        self.run_traced(query, organization_id)
            .await
            .map(PipelineResult::from)
    }

    /// Only decompose the query.
    pub async fn plan(&self, query: &str) -> Vec<String> {
        self.planner.decompose(query).await
    }

    /// Like [`Pipeline::run`], but keeps the plan and every subquery outcome.
    pub async fn run_traced(
        &self,
        query: &str,
        organization_id: &str,
    ) -> Result<RunTrace, PipelineError> {
        let started_at = Utc::now();
        let start = Instant::now();
        info!("Running summary pipeline for org {}", organization_id);

        let descriptors = self.planner.decompose(query).await;
        let outcomes = self.executor.execute(&descriptors, organization_id).await;
        let context = aggregate(&descriptors, &outcomes);

        let narrative = self
            .synthesizer
            .synthesize(query, &context)
            .await
            .map_err(|e| {
                warn!("Synthesis failed, no answer produced: {}", e);
                PipelineError::Synthesis(e)
            })?;
        info!("Successfully generated summary");

        let subqueries = descriptors
            .into_iter()
            .zip(outcomes)
            .map(|(descriptor, outcome)| TracedSubquery {
                descriptor,
                outcome,
            })
            .collect();

        Ok(RunTrace {
            query: query.to_string(),
            organization_id: organization_id.to_string(),
            started_at,
            duration_seconds: start.elapsed().as_secs_f64(),
            subqueries,
            narrative,
        })
    }
}
