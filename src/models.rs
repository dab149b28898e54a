//! Data models for the summary pipeline.
//!
//! This module contains the records that flow between the pipeline stages:
//! subquery results, the data tool's wire payload, and the run trace used
//! for reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Column header used for synthetic error results.
pub const ERROR_COLUMN: &str = "Error";

/// Tabular result of one subquery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubqueryResult {
    /// Column headers, in order.
    pub columns: Vec<String>,
    /// Row values, in order.
    pub rows: Vec<Vec<Value>>,
    /// Short text summary returned by the data tool (or the error text).
    pub narrative: String,
    /// Whether the subquery succeeded.
    pub ok: bool,
}

impl SubqueryResult {
    /// Creates a successful result.
    pub fn success(columns: Vec<String>, rows: Vec<Vec<Value>>, narrative: String) -> Self {
        Self {
            columns,
            rows,
            narrative,
            ok: true,
        }
    }

    /// Creates an error-shaped result carrying `message`.
    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            columns: vec![ERROR_COLUMN.to_string()],
            rows: vec![vec![Value::String(message.clone())]],
            narrative: format!("Error: {}", message),
            ok: false,
        }
    }
}

/// Outcome of executing one subquery.
///
/// Both variants carry a full [`SubqueryResult`] so a failure is still a
/// record, never an absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "result", rename_all = "lowercase")]
pub enum SubqueryOutcome {
    Ok(SubqueryResult),
    Failed(SubqueryResult),
}

impl SubqueryOutcome {
    /// Builds a failed outcome from an error message.
    pub fn failed(message: impl Into<String>) -> Self {
        SubqueryOutcome::Failed(SubqueryResult::error(message))
    }

    /// Borrow the underlying result record.
    pub fn result(&self) -> &SubqueryResult {
        match self {
            SubqueryOutcome::Ok(r) | SubqueryOutcome::Failed(r) => r,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, SubqueryOutcome::Ok(_))
    }
}

impl fmt::Display for SubqueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubqueryOutcome::Ok(r) => write!(f, "ok ({} rows)", r.rows.len()),
            SubqueryOutcome::Failed(r) => write!(f, "failed: {}", r.narrative),
        }
    }
}

/// Table section of the data tool payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TablePayload {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

/// Payload returned by the scoped data-access tool.
#[derive(Debug, Clone, Deserialize)]
pub struct DataToolPayload {
    pub table: TablePayload,
    #[serde(default)]
    pub text: String,
}

impl From<DataToolPayload> for SubqueryResult {
    fn from(payload: DataToolPayload) -> Self {
        SubqueryResult::success(payload.table.columns, payload.table.rows, payload.text)
    }
}

/// Final output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub text: String,
}

/// One planned subquery and what happened to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracedSubquery {
    pub descriptor: String,
    pub outcome: SubqueryOutcome,
}

/// Full record of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTrace {
    /// The original query.
    pub query: String,
    /// Organization scope the subqueries ran under.
    pub organization_id: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run in seconds.
    pub duration_seconds: f64,
    /// Subqueries in plan order.
    pub subqueries: Vec<TracedSubquery>,
    /// Synthesized narrative.
    pub narrative: String,
}

impl RunTrace {
    /// Number of subqueries that failed.
    pub fn failed_count(&self) -> usize {
        self.subqueries
            .iter()
            .filter(|s| !s.outcome.is_ok())
            .count()
    }
}

impl From<RunTrace> for PipelineResult {
    fn from(trace: RunTrace) -> Self {
        PipelineResult {
            text: trace.narrative,
        }
    }
}
