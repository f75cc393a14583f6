//! Generation backend abstraction layer.
//!
//! Defines the [`GenerationBackend`] trait and the shared prompt and error
//! types used by all backend implementations.
//!
//! Two wire formats are implemented:
//! - [`yandex::YandexBackend`]: Yandex foundation models `/completion` API
//! - [`chat::ChatBackend`]: OpenAI-compatible `/chat/completions` API
//!
//! The [`registry::ModelRegistry`] is the allow-list: it maps the model
//! identifiers callers may use to instantiated backends.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod chat;
pub mod registry;
pub mod yandex;

// ---------------------------------------------------------------------------
// Prompt types
// ---------------------------------------------------------------------------

/// Prompt message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    /// Instruction or context for the model.
    System,
    /// The request the model answers.
    User,
}

impl PromptRole {
    /// Lowercase wire name shared by both backends.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }
}

/// One role-tagged message of a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Author role.
    pub role: PromptRole,
    /// Message text.
    pub content: String,
}

impl PromptMessage {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }
}

/// Per-call generation options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Upper bound on generated tokens (the requested article length).
    pub max_tokens: u32,
    /// Sampling temperature; backends fall back to their own default.
    pub temperature: Option<f32>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by generation backends.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The backend answered successfully but produced no text.
    #[error("backend returned no generated text")]
    EmptyResult,
    /// Upstream responded with a non-success status.
    #[error("backend returned non-success status {status}: {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        body: String,
    },
    /// Network-level failure: timeout, DNS, connection reset.
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Response did not match the expected schema.
    #[error("backend response parse error: {0}")]
    Parse(String),
}

// ---------------------------------------------------------------------------
// HTTP helpers (shared by backends and the search client)
// ---------------------------------------------------------------------------

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `GenerationError::Transport` when the body cannot be read and
/// `GenerationError::Upstream` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, GenerationError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(GenerationError::Upstream {
            status: status.as_u16(),
            body: sanitize_http_error_body(&body),
        });
    }
    Ok(body)
}

/// Collapse whitespace, redact key-like tokens and truncate an error body.
pub fn sanitize_http_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    for pattern in [
        r"sk-[A-Za-z0-9_\-]{20,}",
        r"AQVN[A-Za-z0-9_\-]{20,}",
        r"t1\.[A-Za-z0-9_\-.]{20,}",
        r"(?i)api-key\s+[A-Za-z0-9_\-]{10,}",
        r"(?i)bearer\s+[A-Za-z0-9_\-.]{10,}",
    ] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}

/// Build a reqwest client with a whole-request timeout.
///
/// # Errors
///
/// Fails if the TLS backend cannot initialise.
pub(crate) fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A text generation service reachable over HTTP.
///
/// Each implementation owns its request/response mapping. Implementations
/// must be `Send + Sync` so one instance serves concurrent requests.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Send the prompt and return the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] on empty output, upstream status,
    /// transport or parse failure.
    async fn generate(
        &self,
        prompt: &[PromptMessage],
        options: GenerationOptions,
    ) -> Result<String, GenerationError>;

    /// The identifier this backend is registered under.
    fn model_id(&self) -> &str;
}
