//! Readable-text extraction from arbitrary web pages.
//!
//! [`ContentExtractor::extract`] never fails: every problem (timeout,
//! non-2xx, non-HTML body, oversized body, unparseable markup) degrades to an
//! empty string, which the pipeline treats as "no document".
//!
//! Main-content detection is `readability`; its cleaned HTML is flattened to
//! plain text with `scraper`.

use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::config::ExtractionConfig;

/// Subtrees that never hold article text.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "iframe", "svg",
    "button", "select", "template",
];

/// Elements that start a new line when flattened.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "article", "section",
    "main", "blockquote", "pre", "figcaption", "dd", "dt",
];

/// Turns a URL into readable text.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Fetch `url` and return its article text, or an empty string.
    async fn extract(&self, url: &str) -> String;
}

/// Failures inside the extractor; logged, never surfaced.
#[derive(Debug, thiserror::Error)]
enum ExtractError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unsupported scheme '{0}'")]
    Scheme(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("status {0}")]
    Status(u16),
    #[error("content type '{0}' is not HTML")]
    NotHtml(String),
    #[error("body exceeds {0} bytes")]
    TooLarge(usize),
    #[error("parser task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Fetches pages over HTTP and extracts the main content.
#[derive(Debug, Clone)]
pub struct HttpExtractor {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpExtractor {
    /// Create an extractor with the configured timeout and limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ExtractionConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build extractor HTTP client: {e}"))?;
        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    async fn fetch_and_extract(&self, raw_url: &str) -> Result<String, ExtractError> {
        let url = Url::parse(raw_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ExtractError::Scheme(url.scheme().to_owned()));
        }

        let mut response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(ExtractError::NotHtml(content_type));
        }
        if response
            .content_length()
            .is_some_and(|length| usize::try_from(length).map_or(true, |n| n > self.max_body_bytes))
        {
            return Err(ExtractError::TooLarge(self.max_body_bytes));
        }

        // Chunked bodies carry no length up front.
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len().saturating_add(chunk.len()) > self.max_body_bytes {
                return Err(ExtractError::TooLarge(self.max_body_bytes));
            }
            body.extend_from_slice(&chunk);
        }
        let html = decode_body(&body, &content_type);

        let text = tokio::task::spawn_blocking(move || extract_article_text(&html, &url)).await?;
        Ok(text)
    }
}

#[async_trait]
impl ContentExtractor for HttpExtractor {
    async fn extract(&self, url: &str) -> String {
        match self.fetch_and_extract(url).await {
            Ok(text) => {
                debug!(url, chars = text.chars().count(), "page extracted");
                text
            }
            Err(e) => {
                warn!(url, error = %e, "page extraction failed");
                String::new()
            }
        }
    }
}

/// Decode `body` with the charset named in `content_type`, defaulting to
/// UTF-8. A BOM wins over the header; malformed sequences become U+FFFD.
pub fn decode_body(body: &[u8], content_type: &str) -> String {
    let encoding = content_type
        .split(';')
        .filter_map(|param| param.trim().split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, label)| Encoding::for_label(label.trim().trim_matches('"').as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

// ---------------------------------------------------------------------------
// Boilerplate removal
// ---------------------------------------------------------------------------

/// Extract the main article text from an HTML document.
///
/// `base` resolves relative links inside the page. Falls back to the whole
/// body when readability finds no article; returns an empty string when
/// nothing readable is left.
pub fn extract_article_text(html: &str, base: &Url) -> String {
    let article = match readability::extractor::extract(&mut html.as_bytes(), base) {
        Ok(product) => flatten_html(&product.content),
        Err(e) => {
            debug!(error = ?e, "readability found no article");
            String::new()
        }
    };
    if article.is_empty() {
        flatten_html(html)
    } else {
        article
    }
}

/// Visible text of an HTML document or fragment, one line per block.
pub fn flatten_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };
    let root = document
        .select(&selector)
        .next()
        .unwrap_or_else(|| document.root_element());
    let mut buf = String::new();
    collect_text(&root, &mut buf);
    collapse_lines(&buf)
}

/// Flatten an element's text, skipping noisy subtrees.
fn collect_text(node: &ElementRef<'_>, buf: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => buf.push_str(text),
            Node::Element(el) => {
                let tag = el.name();
                if SKIP_TAGS.contains(&tag) {
                    continue;
                }
                if BLOCK_TAGS.contains(&tag) {
                    buf.push('\n');
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(&child_ref, buf);
                }
                if BLOCK_TAGS.contains(&tag) {
                    buf.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Collapse whitespace per line and drop empty lines.
fn collapse_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
