use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{AiConfig, AiCredentials};
use crate::error::CompletionError;
use crate::replies::AI_APOLOGY;

/// Text completion service: one user message in, one reply out.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, text: &str) -> Result<String, CompletionError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest<'a> {
    model_uri: String,
    completion_options: CompletionOptions,
    messages: [Message<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    result: CompletionResult,
}

#[derive(Debug, Deserialize)]
struct CompletionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    message: AlternativeMessage,
}

#[derive(Debug, Deserialize)]
struct AlternativeMessage {
    text: Option<String>,
}

/// YandexGPT foundation-models completion client.
pub struct YandexGpt {
    client: reqwest::Client,
    config: AiConfig,
    credentials: AiCredentials,
}

impl YandexGpt {
    /// `client` is shared; it should already carry the request timeout.
    pub fn new(client: reqwest::Client, config: AiConfig, credentials: AiCredentials) -> Self {
        Self {
            client,
            config,
            credentials,
        }
    }

    fn build_request<'a>(&'a self, text: &'a str) -> CompletionRequest<'a> {
        CompletionRequest {
            model_uri: self.config.model_uri(&self.credentials.folder_id),
            completion_options: CompletionOptions {
                stream: false,
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            },
            messages: [
                Message {
                    role: "system",
                    text: &self.config.system_prompt,
                },
                Message { role: "user", text },
            ],
        }
    }
}

#[async_trait]
impl Completer for YandexGpt {
    async fn complete(&self, text: &str) -> Result<String, CompletionError> {
        let request = self.build_request(text);

        debug!("Sending completion request to {}", self.config.endpoint);

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Api-Key {}", self.credentials.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Upstream(format!(
                "status {}: {}",
                status, error_body
            )));
        }

        let body: CompletionResponse = response.json().await?;

        body.result
            .alternatives
            .into_iter()
            .next()
            .and_then(|alt| alt.message.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                CompletionError::Upstream("response has no result.alternatives[0].message.text".into())
            })
    }
}

/// Turns completion failures into the apology string; never fails.
#[derive(Clone)]
pub struct AiResponder {
    completer: Arc<dyn Completer>,
}

impl AiResponder {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self { completer }
    }

    pub async fn reply(&self, text: &str) -> String {
        match self.completer.complete(text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Completion failed, sending apology: {}", e);
                AI_APOLOGY.to_string()
            }
        }
    }
}
