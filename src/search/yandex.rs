//! Yandex XML search client.
//!
//! Response layout (abridged):
//!
//! ```text
//! <yandexsearch><response>
//!   <found-human>...</found-human>
//!   <results><grouping>
//!     <group><doc>
//!       <url>...</url><title>..<hlword>..</hlword>..</title>
//!       <passages><passage>...</passage></passages>
//!     </doc></group>
//!   </grouping></results>
//! </response></yandexsearch>
//! ```

use std::time::Duration;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::providers::sanitize_http_error_body;

use super::{build_query, SearchClient, SearchError, SearchResponse, SearchResult};

/// Engine error code meaning "nothing found"; not a failure.
const NO_RESULTS_CODE: &str = "15";

/// Yandex XML search API client.
#[derive(Debug, Clone)]
pub struct YandexSearchClient {
    config: SearchConfig,
    folder_id: String,
    api_key: String,
    client: reqwest::Client,
}

impl YandexSearchClient {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Request` if the HTTP client cannot be built.
    pub fn new(
        config: SearchConfig,
        folder_id: String,
        api_key: String,
    ) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(SearchError::Request)?;
        Ok(Self {
            config,
            folder_id,
            api_key,
            client,
        })
    }
}

/// Query parameters for one search call.
#[doc(hidden)]
pub fn build_query_params(
    config: &SearchConfig,
    folder_id: &str,
    api_key: &str,
    topic: &str,
    keywords: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("folderid", folder_id.to_owned()),
        ("apikey", api_key.to_owned()),
        ("query", build_query(topic, keywords)),
        ("l10n", config.l10n.clone()),
        ("sortby", config.sort_by.clone()),
        ("filter", config.filter.clone()),
        ("maxpassages", config.max_passages.to_string()),
        ("groupby", config.group_by()),
        ("page", config.page.to_string()),
    ]
}

#[async_trait]
impl SearchClient for YandexSearchClient {
    async fn search(&self, topic: &str, keywords: &str) -> Result<SearchResponse, SearchError> {
        let params = build_query_params(&self.config, &self.folder_id, &self.api_key, topic, keywords);
        info!(query = %build_query(topic, keywords), "sending search request");

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| SearchError::Request(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Request(e.without_url()))?;
        if !status.is_success() {
            return Err(SearchError::HttpStatus {
                status: status.as_u16(),
                body: sanitize_http_error_body(&body),
            });
        }

        let mut parsed = parse_search_response(&body)?;
        parsed.results.truncate(self.config.fan_out_width());
        info!(
            results = parsed.results.len(),
            found = parsed.found_human.as_deref().unwrap_or("-"),
            "search completed"
        );
        Ok(parsed)
    }
}

// ---------------------------------------------------------------------------
// XML parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocField {
    Url,
    Title,
    Passage,
}

#[derive(Default)]
struct DocBuilder {
    url: String,
    title: String,
    passages: Vec<String>,
    passage: String,
}

impl DocBuilder {
    fn push_text(&mut self, field: DocField, text: &str) {
        match field {
            DocField::Url => self.url.push_str(text),
            DocField::Title => self.title.push_str(text),
            DocField::Passage => self.passage.push_str(text),
        }
    }

    fn close_passage(&mut self) {
        let passage = collapse(&std::mem::take(&mut self.passage));
        if !passage.is_empty() {
            self.passages.push(passage);
        }
    }

    fn finish(self) -> SearchResult {
        SearchResult {
            url: self.url.trim().to_owned(),
            title: collapse(&self.title),
            passages: self.passages,
        }
    }
}

/// Where the current text node belongs.
enum Sink {
    Doc(DocField),
    FoundHuman,
    Error,
    Ignore,
}

/// Parse a Yandex XML response.
///
/// Missing elements leave the corresponding field empty. A syntax error
/// keeps every document completed before it; only a response with no
/// salvageable document fails.
///
/// # Errors
///
/// Returns `SearchError::Api` for engine errors (except "no results") and
/// `SearchError::Parse` for unparseable input.
pub fn parse_search_response(xml: &str) -> Result<SearchResponse, SearchError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut response = SearchResponse::default();
    let mut doc: Option<DocBuilder> = None;
    let mut found_human = String::new();
    let mut error_code: Option<String> = None;
    let mut error_text = String::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                let position = reader.buffer_position();
                if response.results.is_empty() {
                    return Err(SearchError::Parse(format!("at byte {position}: {e}")));
                }
                warn!(position, error = %e, kept = response.results.len(), "search XML truncated");
                break;
            }
        };

        match event {
            Event::Start(start) => {
                let name = start.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"doc" if in_element(&stack, b"group") => doc = Some(DocBuilder::default()),
                    b"error" if in_element(&stack, b"response") => {
                        error_code = start
                            .attributes()
                            .flatten()
                            .find(|attr| attr.key.as_ref() == b"code")
                            .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
                            .or_else(|| Some(String::new()));
                    }
                    _ => {}
                }
                stack.push(name);
            }
            Event::End(end) => {
                let name = end.local_name();
                match name.as_ref() {
                    b"passage" => {
                        if let Some(builder) = doc.as_mut() {
                            builder.close_passage();
                        }
                    }
                    b"doc" => {
                        if let Some(builder) = doc.take() {
                            response.results.push(builder.finish());
                        }
                    }
                    _ => {}
                }
                stack.pop();
            }
            Event::Text(text) => {
                let decoded = String::from_utf8_lossy(&text);
                route_text(&stack, &mut doc, &mut found_human, &mut error_text, &decoded);
            }
            Event::CData(data) => {
                let decoded = String::from_utf8_lossy(&data);
                route_text(&stack, &mut doc, &mut found_human, &mut error_text, &decoded);
            }
            Event::GeneralRef(entity) => {
                let name = String::from_utf8_lossy(&entity);
                if let Some(resolved) = resolve_entity(&name) {
                    let mut buf = [0_u8; 4];
                    let resolved = resolved.encode_utf8(&mut buf);
                    route_text(&stack, &mut doc, &mut found_human, &mut error_text, resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(code) = error_code {
        let message = collapse(&error_text);
        if code == NO_RESULTS_CODE {
            debug!(message = %message, "search found nothing");
        } else if response.results.is_empty() {
            return Err(SearchError::Api { code, message });
        }
    }

    let found_human = collapse(&found_human);
    if !found_human.is_empty() {
        response.found_human = Some(found_human);
    }
    Ok(response)
}

fn in_element(stack: &[Vec<u8>], name: &[u8]) -> bool {
    stack.iter().any(|open| open.as_slice() == name)
}

fn route_text(
    stack: &[Vec<u8>],
    doc: &mut Option<DocBuilder>,
    found_human: &mut String,
    error_text: &mut String,
    text: &str,
) {
    match sink_for(stack, doc.is_some()) {
        Sink::Doc(field) => {
            if let Some(builder) = doc.as_mut() {
                builder.push_text(field, text);
            }
        }
        Sink::FoundHuman => found_human.push_str(text),
        Sink::Error => error_text.push_str(text),
        Sink::Ignore => {}
    }
}

/// Nearest enclosing element that collects text. `<hlword>` and other
/// inline markup inherit their parent's sink.
fn sink_for(stack: &[Vec<u8>], in_doc: bool) -> Sink {
    for open in stack.iter().rev() {
        match open.as_slice() {
            b"url" if in_doc => return Sink::Doc(DocField::Url),
            b"title" if in_doc => return Sink::Doc(DocField::Title),
            b"passage" if in_doc => return Sink::Doc(DocField::Passage),
            b"doc" | b"group" | b"results" => return Sink::Ignore,
            b"found-human" => return Sink::FoundHuman,
            b"error" => return Sink::Error,
            _ => {}
        }
    }
    Sink::Ignore
}

/// Resolve a predefined or numeric character reference (`amp`, `#39`, `#x27`).
fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let numeric = name.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
