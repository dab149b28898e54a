//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.summary-synth.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".summary-synth.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Language oracle settings.
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Query planner settings.
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Subquery executor settings.
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Data source settings.
    #[serde(default)]
    pub data_source: DataSourceConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output format for the answer.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Output format for the answer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Narrative text only (default)
    #[default]
    Text,
    /// Markdown report with the plan and subquery status
    Markdown,
    /// JSON run trace
    Json,
}

/// Which oracle backend to talk to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Ollama chat API
    #[default]
    Ollama,
    /// Azure OpenAI chat completions
    Azure,
}

/// Language oracle settings shared by both pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Backend provider.
    #[serde(default)]
    pub provider: Provider,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the oracle API.
    #[serde(default = "default_oracle_url")]
    pub url: String,

    /// Azure deployment name (falls back to the model name).
    #[serde(default)]
    pub deployment: String,

    /// Azure API version.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// API key. Usually supplied through the environment instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_oracle_timeout")]
    pub timeout_seconds: u64,

    /// Temperature for query decomposition (favor format compliance).
    #[serde(default = "default_decomposition_temperature")]
    pub decomposition_temperature: f32,

    /// Temperature for synthesis (favor fluent prose).
    #[serde(default = "default_synthesis_temperature")]
    pub synthesis_temperature: f32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: default_model(),
            url: default_oracle_url(),
            deployment: String::new(),
            api_version: default_api_version(),
            api_key: None,
            timeout_seconds: default_oracle_timeout(),
            decomposition_temperature: default_decomposition_temperature(),
            synthesis_temperature: default_synthesis_temperature(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_oracle_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_api_version() -> String {
    "2024-02-01".to_string()
}

fn default_oracle_timeout() -> u64 {
    300
}

fn default_decomposition_temperature() -> f32 {
    0.1
}

fn default_synthesis_temperature() -> f32 {
    0.3
}

/// Bounds on what the decomposition oracle may ask for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Maximum number of subqueries kept from one decomposition.
    #[serde(default = "default_max_subqueries")]
    pub max_subqueries: usize,

    /// Maximum characters per subquery descriptor.
    #[serde(default = "default_max_descriptor_chars")]
    pub max_descriptor_chars: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_subqueries: default_max_subqueries(),
            max_descriptor_chars: default_max_descriptor_chars(),
        }
    }
}

fn default_max_subqueries() -> usize {
    8
}

fn default_max_descriptor_chars() -> usize {
    500
}

/// Subquery executor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Number of subqueries in flight at once. 1 runs them one after another.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    1
}

/// Scoped data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Base URL of the query service.
    #[serde(default = "default_data_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_data_timeout")]
    pub timeout_seconds: u64,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            url: default_data_url(),
            timeout_seconds: default_data_timeout(),
        }
    }
}

fn default_data_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_data_timeout() -> u64 {
    60
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.summary-synth.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(provider) = args.provider {
            self.oracle.provider = provider;
        }
        if let Some(ref model) = args.model {
            self.oracle.model = model.clone();
        }
        if let Some(ref url) = args.oracle_url {
            self.oracle.url = url.clone();
        }
        if let Some(ref key) = args.api_key {
            self.oracle.api_key = Some(key.clone());
        }
        if let Some(timeout) = args.timeout {
            self.oracle.timeout_seconds = timeout;
            self.data_source.timeout_seconds = timeout;
        }

        if let Some(ref url) = args.data_url {
            self.data_source.url = url.clone();
        }
        if let Some(concurrency) = args.concurrency {
            self.executor.concurrency = concurrency;
        }

        if let Some(format) = args.format {
            self.general.format = format;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
