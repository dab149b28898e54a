//! Language oracle clients.
//!
//! An oracle is anything that turns a prompt into text. The pipeline holds
//! two of them: a low-temperature one for decomposition and a warmer one
//! for synthesis.

pub mod azure;
pub mod ollama;

pub use azure::AzureOracle;
pub use ollama::OllamaOracle;

use crate::config::{OracleConfig, Provider};
use crate::error::OracleError;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Prompt in, text out.
#[async_trait]
pub trait LanguageOracle: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError>;
}

/// Connection settings for one oracle instance.
#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub api_key: Option<String>,
    pub deployment: String,
    pub api_version: String,
}

impl OracleSettings {
    /// Settings derived from config with the given temperature.
    pub fn from_config(config: &OracleConfig, temperature: f32) -> Self {
        Self {
            url: config.url.clone(),
            model: config.model.clone(),
            temperature,
            timeout_seconds: config.timeout_seconds,
            api_key: config.api_key.clone(),
            deployment: config.deployment.clone(),
            api_version: config.api_version.clone(),
        }
    }
}

/// Build the decomposition and synthesis oracles for the configured provider.
pub fn build_oracles(
    config: &OracleConfig,
) -> Result<(Arc<dyn LanguageOracle>, Arc<dyn LanguageOracle>)> {
    let decomposition = OracleSettings::from_config(config, config.decomposition_temperature);
    let synthesis = OracleSettings::from_config(config, config.synthesis_temperature);

    let oracles: (Arc<dyn LanguageOracle>, Arc<dyn LanguageOracle>) = match config.provider {
        Provider::Ollama => (
            Arc::new(OllamaOracle::new(decomposition)?),
            Arc::new(OllamaOracle::new(synthesis)?),
        ),
        Provider::Azure => (
            Arc::new(AzureOracle::new(decomposition)?),
            Arc::new(AzureOracle::new(synthesis)?),
        ),
    };
    Ok(oracles)
}

/// Map a reqwest transport error onto an [`OracleError`].
pub(crate) fn transport_error(e: reqwest::Error, url: &str, timeout_seconds: u64) -> OracleError {
    if e.is_timeout() {
        OracleError::Timeout(timeout_seconds)
    } else if e.is_connect() {
        OracleError::Connect(url.to_string())
    } else {
        OracleError::Request(e.to_string())
    }
}
