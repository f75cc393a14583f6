//! Web search used to ground articles in current material.
//!
//! The [`SearchClient`] trait is the seam the pipeline depends on;
//! [`yandex::YandexSearchClient`] implements it against the Yandex XML API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod yandex;

/// One search hit.
///
/// Fields the engine omitted are left empty; callers skip hits without a url.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page address.
    pub url: String,
    /// Page title.
    pub title: String,
    /// Snippets in engine order.
    pub passages: Vec<String>,
}

/// Parsed search response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResponse {
    /// Hits in rank order.
    pub results: Vec<SearchResult>,
    /// Human-readable match estimate (`found-human`), when present.
    pub found_human: Option<String>,
}

/// Search failures. The pipeline recovers from all of them.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Transport failure (the URL, which carries the API key, is stripped).
    #[error("search request failed: {0}")]
    Request(reqwest::Error),
    /// Non-success HTTP status.
    #[error("search returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        body: String,
    },
    /// The engine reported an error inside a well-formed response.
    #[error("search engine error {code}: {message}")]
    Api {
        /// Engine error code.
        code: String,
        /// Engine error message.
        message: String,
    },
    /// The body was not parseable XML and nothing could be salvaged.
    #[error("search response parse error: {0}")]
    Parse(String),
    /// Search is not configured for this process.
    #[error("search is disabled")]
    Disabled,
}

/// Keyword search over the web.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run one query for `"{topic} + {keywords}"`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on transport, HTTP, engine or parse failure.
    async fn search(&self, topic: &str, keywords: &str) -> Result<SearchResponse, SearchError>;
}

/// Compose the query string sent to the engine.
pub fn build_query(topic: &str, keywords: &str) -> String {
    format!("{topic} + {keywords}")
}

/// Search client used when no search credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSearch;

#[async_trait]
impl SearchClient for DisabledSearch {
    async fn search(&self, _topic: &str, _keywords: &str) -> Result<SearchResponse, SearchError> {
        Err(SearchError::Disabled)
    }
}
