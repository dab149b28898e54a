//! Test doubles for the oracle and data tool seams.

use crate::datasource::DataAccessTool;
use crate::error::{DataAccessError, OracleError};
use crate::oracle::LanguageOracle;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Oracle that replies with a canned answer and records every prompt.
pub struct StubOracle {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl StubOracle {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// An oracle whose every call fails.
    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageOracle for StubOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(OracleError::Api {
                status: 503,
                body: "model overloaded".to_string(),
            }),
        }
    }
}

enum StubReply {
    Payload(String),
    Fail(String),
}

/// Data tool keyed by descriptor. Unknown descriptors fail.
#[derive(Default)]
pub struct StubDataTool {
    replies: HashMap<String, StubReply>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StubDataTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, descriptor: &str, payload: serde_json::Value) -> Self {
        self.replies
            .insert(descriptor.to_string(), StubReply::Payload(payload.to_string()));
        self
    }

    pub fn with_raw(mut self, descriptor: &str, raw: &str) -> Self {
        self.replies
            .insert(descriptor.to_string(), StubReply::Payload(raw.to_string()));
        self
    }

    pub fn with_failure(mut self, descriptor: &str, message: &str) -> Self {
        self.replies
            .insert(descriptor.to_string(), StubReply::Fail(message.to_string()));
        self
    }

    pub fn with_delay(mut self, descriptor: &str, delay: Duration) -> Self {
        self.delays.insert(descriptor.to_string(), delay);
        self
    }

    /// `(descriptor, organization_id)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataAccessTool for StubDataTool {
    async fn execute(
        &self,
        descriptor: &str,
        organization_id: &str,
    ) -> Result<String, DataAccessError> {
        self.calls
            .lock()
            .unwrap()
            .push((descriptor.to_string(), organization_id.to_string()));

        if let Some(delay) = self.delays.get(descriptor) {
            tokio::time::sleep(*delay).await;
        }

        match self.replies.get(descriptor) {
            Some(StubReply::Payload(p)) => Ok(p.clone()),
            Some(StubReply::Fail(m)) => Err(DataAccessError::Request(m.clone())),
            None => Err(DataAccessError::Request(format!("no data for '{}'", descriptor))),
        }
    }
}

/// A well-formed payload with the given columns and rows.
pub fn table_payload(
    columns: &[&str],
    rows: Vec<serde_json::Value>,
    text: &str,
) -> serde_json::Value {
    serde_json::json!({
        "table": {"columns": columns, "rows": rows},
        "text": text,
    })
}
