//! Azure OpenAI chat-completions client.

use super::{transport_error, LanguageOracle, OracleSettings};
use crate::error::OracleError;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    messages: Vec<CompletionMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Oracle backed by an Azure OpenAI deployment.
pub struct AzureOracle {
    settings: OracleSettings,
    api_key: String,
    http_client: reqwest::Client,
}

impl AzureOracle {
    pub fn new(settings: OracleSettings) -> Result<Self> {
        let Some(api_key) = settings.api_key.clone() else {
            bail!("Azure provider requires an API key (--api-key or AZURE_OPENAI_API_KEY)");
        };

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            settings,
            api_key,
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        let deployment = if self.settings.deployment.is_empty() {
            &self.settings.model
        } else {
            &self.settings.deployment
        };
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.settings.url.trim_end_matches('/'),
            deployment,
            self.settings.api_version
        )
    }
}

#[async_trait]
impl LanguageOracle for AzureOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let url = self.endpoint();
        debug!("Sending prompt to Azure deployment at {}", url);

        let request = CompletionRequest {
            messages: vec![CompletionMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
        };

        let response = self
            .http_client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, &self.settings.url, self.settings.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Api { status, body });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OracleError::InvalidResponse("response has no choices".to_string()))
    }
}
