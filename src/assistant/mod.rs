//! Assistant client
//!
//! Turns the chat transcript plus the file being viewed into a single
//! chat-completion request against an OpenAI-compatible API.

pub mod prompt;

use crate::config::{AssistantConfig, CredentialStore};
use crate::error::{ExplorerError, Result};
use crate::models::Message;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub use prompt::{build_prompt, PromptMessage, PromptRole, HISTORY_WINDOW};

/// Reply given when no API key is configured
pub const NO_CREDENTIAL_REPLY: &str =
    "Please add your OpenAI API key in the settings to enable AI-powered answers about your code.";

/// Reply given when no file is selected
pub const NO_FILE_REPLY: &str =
    "Please select a file from the repository to ask questions about its content.";

const QUOTA_CODES: &[&str] = &["insufficient_quota", "rate_limit_exceeded"];

/// Something that can answer questions about the file being viewed
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Answers the last message of `history` in the context of the current file
    async fn ask(
        &self,
        history: &[Message],
        current_file_content: Option<&str>,
        current_file_path: Option<&str>,
    ) -> Result<String>;

    /// Checks that the provider accepts `key`
    async fn verify_credential(&self, key: &str) -> bool;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
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

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl ApiError {
    fn is_quota(&self) -> bool {
        [&self.code, &self.kind]
            .into_iter()
            .flatten()
            .any(|value| QUOTA_CODES.contains(&value.as_str()))
    }
}

/// Maps a non-success provider response to an error
fn classify_failure(status: StatusCode, body: &str) -> ExplorerError {
    let api_error = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .unwrap_or_default();
    let detail = api_error
        .message
        .clone()
        .unwrap_or_else(|| format!("HTTP {}", status));

    if status == StatusCode::TOO_MANY_REQUESTS || api_error.is_quota() {
        ExplorerError::QuotaExceeded(detail)
    } else {
        ExplorerError::Assistant(format!("HTTP {}: {}", status.as_u16(), detail))
    }
}

/// Chat-completion client for OpenAI-compatible providers
///
/// The API key is read from the credential store on every request, so a key
/// saved mid-session is picked up without rebuilding the client.
#[derive(Clone)]
pub struct OpenAiAssistant {
    client: Client,
    config: AssistantConfig,
    credentials: Arc<dyn CredentialStore>,
}

impl OpenAiAssistant {
    /// Creates a new client
    pub fn new(config: AssistantConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExplorerError::Network(e.to_string()))?;

        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    fn api_key(&self) -> Result<String> {
        self.credentials.load()?.ok_or(ExplorerError::NoCredential)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn complete(&self, key: &str, messages: &[PromptMessage]) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
        };

        debug!(
            "Sending {} prompt messages to {}",
            messages.len(),
            self.config.model
        );
        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExplorerError::Assistant(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            ExplorerError::Assistant(format!("Unexpected completion response: {}", e))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ExplorerError::Assistant("Empty completion".into()))
    }
}

#[async_trait]
impl Assistant for OpenAiAssistant {
    async fn ask(
        &self,
        history: &[Message],
        current_file_content: Option<&str>,
        current_file_path: Option<&str>,
    ) -> Result<String> {
        let Some(content) = current_file_content else {
            return Ok(NO_FILE_REPLY.to_string());
        };
        let key = match self.api_key() {
            Ok(key) => key,
            Err(ExplorerError::NoCredential) => {
                info!("No API key configured, returning guidance");
                return Ok(NO_CREDENTIAL_REPLY.to_string());
            }
            Err(e) => return Err(e),
        };

        let messages = build_prompt(history, content, current_file_path);
        let reply = self.complete(&key, &messages).await;
        if let Err(e) = &reply {
            warn!("Assistant request failed: {}", e);
        }
        reply
    }

    async fn verify_credential(&self, key: &str) -> bool {
        let response = match self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(key.trim())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Could not reach the assistant provider: {}", e);
                return false;
            }
        };

        match response.status() {
            StatusCode::UNAUTHORIZED => false,
            StatusCode::TOO_MANY_REQUESTS => true,
            status => status.is_success(),
        }
    }
}
