//! Answer rendering.
//!
//! This module renders a [`RunTrace`] as plain text, a Markdown report,
//! or JSON.

use crate::config::OutputFormat;
use crate::models::{RunTrace, SubqueryOutcome};
use anyhow::Result;
use serde_json::Value;

/// Render a run in the requested format.
pub fn render(trace: &RunTrace, format: OutputFormat, model: &str) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => format!("{}\n", trace.narrative),
        OutputFormat::Markdown => generate_markdown_report(trace, model),
        OutputFormat::Json => generate_json_report(trace)?,
    })
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(trace: &RunTrace, model: &str) -> String {
    let mut output = String::new();

    output.push_str("# Summary Report\n\n");
    output.push_str(&generate_metadata_section(trace, model));
    output.push_str(&generate_answer_section(&trace.narrative));
    output.push_str(&generate_plan_section(trace));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(trace: &RunTrace, model: &str) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Query:** {}\n", trace.query));
    section.push_str(&format!("- **Organization:** `{}`\n", trace.organization_id));
    section.push_str(&format!(
        "- **Run Date:** {}\n",
        trace.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", model));
    section.push_str(&format!("- **Subqueries:** {}\n", trace.subqueries.len()));
    let failed = trace.failed_count();
    if failed > 0 {
        section.push_str(&format!("- **Subqueries Failed:** {}\n", failed));
    }
    section.push_str(&format!("- **Duration:** {:.1}s\n", trace.duration_seconds));
    section.push('\n');

    section
}

fn generate_answer_section(narrative: &str) -> String {
    format!("## Answer\n\n{}\n\n", narrative)
}

/// Generate the plan table, one row per subquery.
fn generate_plan_section(trace: &RunTrace) -> String {
    let mut section = String::new();

    section.push_str("## Subqueries\n\n");
    section.push_str("| # | Subquery | Status | Rows | Notes |\n");
    section.push_str("|:---:|:---|:---:|:---:|:---|\n");

    for (i, sub) in trace.subqueries.iter().enumerate() {
        let result = sub.outcome.result();
        let (status, rows) = match &sub.outcome {
            SubqueryOutcome::Ok(_) => ("✅", result.rows.len().to_string()),
            SubqueryOutcome::Failed(_) => ("❌", "-".to_string()),
        };
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            i + 1,
            escape_cell(&sub.descriptor),
            status,
            rows,
            escape_cell(&result.narrative)
        ));
    }
    section.push('\n');

    section
}

/// Keep a value on one table row.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by summary-synth*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(trace: &RunTrace) -> Result<String> {
    serde_json::to_string_pretty(trace).map_err(Into::into)
}

/// Render a decomposition plan (for `--plan-only`).
pub fn render_plan(descriptors: &[String], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&Value::from(descriptors.to_vec()))?,
        OutputFormat::Text | OutputFormat::Markdown => descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| format!("{}. {}\n", i + 1, d))
            .collect(),
    })
}
