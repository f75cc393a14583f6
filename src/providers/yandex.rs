//! Yandex foundation models backend using the synchronous `/completion` API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    check_http_response, http_client, GenerationBackend, GenerationError, GenerationOptions,
    PromptMessage,
};

/// Default completion endpoint.
pub const DEFAULT_YANDEX_ENDPOINT: &str =
    "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";
const DEFAULT_TEMPERATURE: f32 = 0.9;

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Completion request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YandexRequest {
    /// `gpt://{folder}/{model}`.
    pub model_uri: String,
    /// Sampling options.
    pub completion_options: YandexCompletionOptions,
    /// Prompt messages.
    pub messages: Vec<YandexMessage>,
}

/// Completion options. `maxTokens` is an int64 and travels as a string.
#[doc(hidden)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YandexCompletionOptions {
    /// Always `false`; the pipeline has no partial results.
    pub stream: bool,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum generated tokens.
    pub max_tokens: String,
}

/// A message in Yandex format.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct YandexMessage {
    /// Role (`system`, `user`, `assistant`).
    pub role: String,
    /// Message text.
    #[serde(default)]
    pub text: String,
}

/// Completion response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct YandexResponse {
    /// Result envelope.
    pub result: YandexResult,
}

/// Result envelope.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YandexResult {
    /// Generated alternatives.
    #[serde(default)]
    pub alternatives: Vec<YandexAlternative>,
    /// Version of the model that served the call.
    #[serde(default)]
    pub model_version: Option<String>,
}

/// One generated alternative.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct YandexAlternative {
    /// Generated message.
    pub message: YandexMessage,
    /// Alternative status, e.g. `ALTERNATIVE_STATUS_FINAL`.
    #[serde(default)]
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Yandex completion backend bound to one model.
#[derive(Debug, Clone)]
pub struct YandexBackend {
    model_id: String,
    model_uri: String,
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl YandexBackend {
    /// Create a backend for `gpt://{folder_id}/{model_name}`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Transport` if the HTTP client cannot be built.
    pub fn new(
        model_id: String,
        folder_id: &str,
        model_name: &str,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        Self::with_endpoint(
            model_id,
            folder_id,
            model_name,
            api_key,
            DEFAULT_YANDEX_ENDPOINT.to_owned(),
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
        folder_id: &str,
        model_name: &str,
        api_key: String,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            model_id,
            model_uri: model_uri(folder_id, model_name),
            api_key,
            endpoint,
            client: http_client(timeout)?,
        })
    }

    /// The `modelUri` sent with every request.
    pub fn model_uri(&self) -> &str {
        &self.model_uri
    }
}

/// Compose a foundation model URI.
pub fn model_uri(folder_id: &str, model_name: &str) -> String {
    format!("gpt://{folder_id}/{model_name}")
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build a completion request from a prompt.
#[doc(hidden)]
pub fn build_request(
    model_uri: &str,
    prompt: &[PromptMessage],
    options: GenerationOptions,
) -> YandexRequest {
    YandexRequest {
        model_uri: model_uri.to_owned(),
        completion_options: YandexCompletionOptions {
            stream: false,
            temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: options.max_tokens.to_string(),
        },
        messages: prompt
            .iter()
            .map(|m| YandexMessage {
                role: m.role.as_str().to_owned(),
                text: m.content.clone(),
            })
            .collect(),
    }
}

/// Extract the first alternative's text.
///
/// # Errors
///
/// Returns `GenerationError::Parse` on malformed JSON and
/// `GenerationError::EmptyResult` when no alternative carries text.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<String, GenerationError> {
    let resp: YandexResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Parse(e.to_string()))?;

    if let Some(version) = &resp.result.model_version {
        debug!(model_version = %version, "yandex completion served");
    }

    resp.result
        .alternatives
        .into_iter()
        .next()
        .map(|alt| alt.message.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or(GenerationError::EmptyResult)
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl GenerationBackend for YandexBackend {
    async fn generate(
        &self,
        prompt: &[PromptMessage],
        options: GenerationOptions,
    ) -> Result<String, GenerationError> {
        let api_request = build_request(&self.model_uri, prompt, options);
        debug!(
            model_uri = %self.model_uri,
            messages = api_request.messages.len(),
            "sending yandex completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .header("authorization", format!("Api-Key {}", self.api_key))
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        parse_response(&payload)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
