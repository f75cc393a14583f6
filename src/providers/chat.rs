//! OpenAI-compatible chat completions backend (`/v1/chat/completions`).
//!
//! Talks to any gateway speaking the OpenAI chat format, e.g. vsegpt.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    check_http_response, http_client, GenerationBackend, GenerationError, GenerationOptions,
    PromptMessage,
};

/// Default gateway endpoint.
pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.vsegpt.ru/v1/chat/completions";
const DEFAULT_TEMPERATURE: f32 = 0.7;

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Chat completions request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Upstream model name.
    pub model: String,
    /// Prompt messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Number of completions; always one.
    pub n: u32,
    /// Maximum completion tokens.
    pub max_tokens: u32,
}

/// A message in chat format.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct ChatMessage {
    /// Role (`system`, `user`).
    pub role: String,
    /// Message text.
    pub content: String,
}

/// Chat completions response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Response choices.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// A response choice.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// Assistant message for this choice.
    pub message: ChatResponseMessage,
}

/// Assistant message.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    /// Generated text; gateways send `null` when filtered.
    pub content: Option<String>,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Chat completions backend bound to one model.
#[derive(Debug, Clone)]
pub struct ChatBackend {
    model_id: String,
    model_name: String,
    api_key: String,
    endpoint: String,
    app_title: Option<String>,
    client: reqwest::Client,
}

impl ChatBackend {
    /// Create a backend for the default gateway endpoint.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Transport` if the HTTP client cannot be built.
    pub fn new(
        model_id: String,
        model_name: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        Self::with_endpoint(
            model_id,
            model_name,
            api_key,
            DEFAULT_CHAT_ENDPOINT.to_owned(),
            timeout,
        )
    }

    /// Create a backend for a custom endpoint.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Transport` if the HTTP client cannot be built.
    pub fn with_endpoint(
        model_id: String,
        model_name: String,
        api_key: String,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            model_id,
            model_name,
            api_key,
            endpoint,
            app_title: None,
            client: http_client(timeout)?,
        })
    }

    /// Send `X-Title` with every request.
    pub fn with_app_title(mut self, title: Option<String>) -> Self {
        self.app_title = title;
        self
    }
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build a chat request from a prompt.
#[doc(hidden)]
pub fn build_request(
    model: &str,
    prompt: &[PromptMessage],
    options: GenerationOptions,
) -> ChatRequest {
    ChatRequest {
        model: model.to_owned(),
        messages: prompt
            .iter()
            .map(|m| ChatMessage {
                role: m.role.as_str().to_owned(),
                content: m.content.clone(),
            })
            .collect(),
        temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        n: 1,
        max_tokens: options.max_tokens,
    }
}

/// Extract the first choice's text.
///
/// # Errors
///
/// Returns `GenerationError::Parse` on malformed JSON and
/// `GenerationError::EmptyResult` when there is no choice or its content is
/// empty or null.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<String, GenerationError> {
    let resp: ChatResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Parse(e.to_string()))?;

    resp.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(GenerationError::EmptyResult)
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl GenerationBackend for ChatBackend {
    async fn generate(
        &self,
        prompt: &[PromptMessage],
        options: GenerationOptions,
    ) -> Result<String, GenerationError> {
        let api_request = build_request(&self.model_name, prompt, options);
        debug!(
            model = %self.model_name,
            messages = api_request.messages.len(),
            max_tokens = api_request.max_tokens,
            "sending chat completion request"
        );

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", self.api_key));
        if let Some(title) = &self.app_title {
            builder = builder.header("x-title", title);
        }

        let response = builder.json(&api_request).send().await?;
        let payload = check_http_response(response).await?;
        parse_response(&payload)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
