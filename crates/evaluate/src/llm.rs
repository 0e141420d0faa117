use crate::schema::ChatMessage;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("No API key configured for the text-generation service")]
    MissingCredential,

    #[error("Request to text-generation service timed out")]
    Timeout,

    #[error("Failed to reach text-generation service: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Text-generation service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Malformed response from text-generation service: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Failures worth a second attempt: timeouts, connection errors,
    /// rate limiting and server-side errors.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Timeout => true,
            RemoteError::Transport(e) => e.is_connect() || e.is_timeout(),
            RemoteError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            RemoteError::MissingCredential | RemoteError::Malformed(_) => false,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else if e.is_decode() {
            RemoteError::Malformed(e.to_string())
        } else {
            RemoteError::Transport(e)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            temperature: None,
            top_p: None,
        }
    }
}

/// Client for an OpenAI-compatible chat-completion endpoint
/// (Hugging Face router, OpenAI, vLLM, Ollama's /v1).
#[derive(Clone)]
pub struct ChatClient {
    base_url: String,
    model: String,
    api_key: String,
    params: GenerationParams,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatClient {
    pub fn new(
        base_url: String,
        model: String,
        api_key: String,
        params: GenerationParams,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RemoteError::Transport)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            params,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one chat-completion request and return the first choice's text
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, RemoteError> {
        if self.api_key.is_empty() {
            return Err(RemoteError::MissingCredential);
        }

        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.params.max_tokens,
            temperature: self.params.temperature,
            top_p: self.params.top_p,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status { status, body });
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::Malformed("response has no choices".to_string()))?
            .message
            .content
            .ok_or_else(|| RemoteError::Malformed("first choice has no content".to_string()))
    }
}
