//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Values left unset fall back to the config file.

use crate::config::{OutputFormat, Provider};
use clap::Parser;
use std::path::PathBuf;

/// Summary Synth - answer analytic questions over your organization's data
///
/// Breaks a high-level question into atomic subqueries, runs each one
/// against the organization-scoped data service, and synthesizes the
/// partial results into one narrative answer.
///
/// Examples:
///   summary-synth --org 1f2e "How did borrowing change across branches last month?"
///   summary-synth --org 1f2e --format markdown -o answer.md "Summarize subscriptions"
///   summary-synth --org 1f2e --plan-only "Compare event volume by hierarchy type"
///   summary-synth --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// The high-level question to answer
    #[arg(value_name = "QUERY", required_unless_present = "init_config")]
    pub query: Option<String>,

    /// Organization id every subquery is scoped to
    #[arg(
        long,
        value_name = "ID",
        env = "SUMMARY_SYNTH_ORG",
        required_unless_present = "init_config"
    )]
    pub org: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .summary-synth.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Oracle backend (ollama, azure)
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<Provider>,

    /// Model used for decomposition and synthesis
    #[arg(short, long, env = "SUMMARY_SYNTH_MODEL")]
    pub model: Option<String>,

    /// Oracle API base URL
    #[arg(long, value_name = "URL", env = "SUMMARY_SYNTH_ORACLE_URL")]
    pub oracle_url: Option<String>,

    /// API key for the azure provider
    #[arg(long, value_name = "KEY", env = "AZURE_OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Data service base URL
    #[arg(long, value_name = "URL", env = "SUMMARY_SYNTH_DATA_URL")]
    pub data_url: Option<String>,

    /// Number of subqueries executed at once
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Request timeout in seconds for oracle and data calls
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format (text, markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the answer to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Only decompose the query and print the plan
    ///
    /// No data or synthesis calls are made.
    #[arg(long)]
    pub plan_only: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .summary-synth.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The query text (empty if unset; validate first).
    pub fn query_text(&self) -> &str {
        self.query.as_deref().unwrap_or("")
    }

    /// The organization id (empty if unset; validate first).
    pub fn organization_id(&self) -> &str {
        self.org.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.query_text().trim().is_empty() {
            return Err("Query must not be empty".to_string());
        }

        if self.organization_id().trim().is_empty() {
            return Err("Organization id must not be empty".to_string());
        }

        for (name, url) in [("Oracle", &self.oracle_url), ("Data", &self.data_url)] {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(format!("{} URL must start with 'http://' or 'https://'", name));
                }
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            query: Some("Summarize activity by hierarchy type".to_string()),
            org: Some("org-1".to_string()),
            config: None,
            provider: None,
            model: None,
            oracle_url: None,
            api_key: None,
            data_url: None,
            concurrency: None,
            timeout: None,
            format: None,
            output: None,
            plan_only: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_valid_args() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_empty_query() {
        let mut args = make_args();
        args.query = Some("   ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_org() {
        let mut args = make_args();
        args.org = None;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.data_url = Some("localhost:8000".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_concurrency() {
        let mut args = make_args();
        args.concurrency = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.query = None;
        args.org = None;
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
