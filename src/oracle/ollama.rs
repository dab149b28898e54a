//! Ollama chat client.

use super::{transport_error, LanguageOracle, OracleSettings};
use crate::error::OracleError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Oracle backed by a local or remote Ollama server.
pub struct OllamaOracle {
    settings: OracleSettings,
    http_client: reqwest::Client,
}

impl OllamaOracle {
    pub fn new(settings: OracleSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            settings,
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.settings.url.trim_end_matches('/'))
    }

    fn build_request(&self, prompt: &str) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.settings.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            options: OllamaOptions {
                temperature: self.settings.temperature,
            },
        }
    }
}

#[async_trait]
impl LanguageOracle for OllamaOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let url = self.endpoint();
        debug!(
            "Sending prompt to {} (model {}, temperature {})",
            url, self.settings.model, self.settings.temperature
        );

        let response = self
            .http_client
            .post(&url)
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| transport_error(e, &self.settings.url, self.settings.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Api { status, body });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

        Ok(chat_response.message.content)
    }
}
