//! Page extraction tests.

use ghostwriter::config::ExtractionConfig;
use ghostwriter::extract::{extract_article_text, ContentExtractor, HttpExtractor};
use url::Url;

use crate::support::{serve_once, serve_raw};

const ARTICLE_PAGE: &str = r#"<!doctype html>
<html><head><title>Rust</title><style>body { color: red; }</style></head>
<body>
<nav>Home | About | Contact us today for more links and offers</nav>
<article>
  <h1>Why Rust</h1>
  <p>Rust guarantees memory safety without a garbage collector at runtime.</p>
  <p>Ownership rules are checked by the compiler during every single build.</p>
</article>
<footer>Copyright 2024 Example Corporation. All rights reserved worldwide.</footer>
<script>trackVisitor();</script>
</body></html>"#;

fn extractor(config: &ExtractionConfig) -> HttpExtractor {
    match HttpExtractor::new(config) {
        Ok(extractor) => extractor,
        Err(err) => panic!("extractor should build: {err}"),
    }
}

fn base() -> Url {
    match Url::parse("https://example.com/post") {
        Ok(url) => url,
        Err(err) => panic!("base url should parse: {err}"),
    }
}

fn assert_article_only(text: &str) {
    assert!(text.contains("Rust guarantees memory safety without a garbage collector"));
    assert!(text.contains("Ownership rules are checked by the compiler"));
    assert!(!text.contains("Home | About"), "navigation leaked: {text}");
    assert!(!text.contains("Copyright"), "footer leaked: {text}");
    assert!(!text.contains("trackVisitor"), "script leaked: {text}");
    assert!(!text.contains("color: red"), "style leaked: {text}");
}

/// Raw chunked HTTP response with `chunk_size`-byte chunks.
fn chunked_response(content_type: &str, body: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n"
    )
    .into_bytes();
    for part in body.chunks(chunk_size) {
        response.extend_from_slice(format!("{:x}\r\n", part.len()).as_bytes());
        response.extend_from_slice(part);
        response.extend_from_slice(b"\r\n");
    }
    response.extend_from_slice(b"0\r\n\r\n");
    response
}

/// Raw response with a known length and arbitrary body bytes.
fn sized_response(content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

#[test]
fn article_text_excludes_page_chrome() {
    assert_article_only(&extract_article_text(ARTICLE_PAGE, &base()));
}

#[test]
fn menus_are_dropped_without_semantic_markup() {
    let html = r#"<html><body>
<div class="menu"><p><a href="/1">A very long link text that goes on and on for a while</a></p></div>
<div class="content">
  <p>First paragraph of the actual story, long enough to count as text, with a comma.</p>
  <p>Second paragraph continues the story with more words in it, and another comma.</p>
</div>
</body></html>"#;
    let text = extract_article_text(html, &base());
    assert!(text.contains("First paragraph of the actual story"));
    assert!(text.contains("Second paragraph continues"));
    assert!(!text.contains("very long link"));
}

#[test]
fn pages_without_an_article_fall_back_to_body_text() {
    let html = "<html><body><div>Line one</div><div>Line two</div><script>var x = 1;</script></body></html>";
    assert_eq!(extract_article_text(html, &base()), "Line one\nLine two");
}

#[test]
fn empty_document_yields_empty_text() {
    assert!(extract_article_text("", &base()).is_empty());
}

#[tokio::test]
async fn fetches_and_extracts_html_pages() {
    let url = serve_once("200 OK", "text/html; charset=utf-8", ARTICLE_PAGE).await;
    let text = extractor(&ExtractionConfig::default()).extract(&url).await;
    assert_article_only(&text);
}

#[tokio::test]
async fn declared_charset_is_decoded() {
    let page = "<html><body><article>\
                <p>Привет, мир! Это статья о языке Rust, написанная по-русски.</p>\
                <p>Владение и заимствование проверяются компилятором при сборке.</p>\
                </article></body></html>";
    let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode(page);
    let url = serve_raw(sized_response("text/html; charset=windows-1251", &bytes)).await;

    let text = extractor(&ExtractionConfig::default()).extract(&url).await;
    assert!(text.contains("Привет, мир!"), "decoded text was: {text}");
    assert!(text.contains("Владение и заимствование"));
}

#[tokio::test]
async fn invalid_utf8_without_charset_still_extracts() {
    let body = b"<html><body><p>Caf\xe9 au lait is served every morning in the old town square.</p></body></html>";
    let url = serve_raw(sized_response("text/html", body)).await;

    let text = extractor(&ExtractionConfig::default()).extract(&url).await;
    assert!(text.contains("au lait is served every morning"), "text was: {text}");
    assert!(text.contains('\u{fffd}'));
}

#[tokio::test]
async fn chunked_body_within_limit_is_read() {
    let url = serve_raw(chunked_response("text/html", ARTICLE_PAGE.as_bytes(), 100)).await;
    let text = extractor(&ExtractionConfig::default()).extract(&url).await;
    assert_article_only(&text);
}

#[tokio::test]
async fn chunked_body_over_limit_yields_empty_text() {
    let url = serve_raw(chunked_response("text/html", ARTICLE_PAGE.as_bytes(), 32)).await;
    let config = ExtractionConfig {
        max_body_bytes: 64,
        ..ExtractionConfig::default()
    };
    let text = extractor(&config).extract(&url).await;
    assert!(text.is_empty());
}

#[tokio::test]
async fn non_success_status_yields_empty_text() {
    let url = serve_once("404 Not Found", "text/html", ARTICLE_PAGE).await;
    let text = extractor(&ExtractionConfig::default()).extract(&url).await;
    assert!(text.is_empty());
}

#[tokio::test]
async fn non_html_content_yields_empty_text() {
    let url = serve_once("200 OK", "application/pdf", "%PDF-1.7 binary").await;
    let text = extractor(&ExtractionConfig::default()).extract(&url).await;
    assert!(text.is_empty());
}

#[tokio::test]
async fn oversized_body_yields_empty_text() {
    let url = serve_once("200 OK", "text/html", ARTICLE_PAGE).await;
    let config = ExtractionConfig {
        max_body_bytes: 64,
        ..ExtractionConfig::default()
    };
    let text = extractor(&config).extract(&url).await;
    assert!(text.is_empty());
}

#[tokio::test]
async fn unsupported_scheme_yields_empty_text() {
    let text = extractor(&ExtractionConfig::default())
        .extract("ftp://example.com/file.txt")
        .await;
    assert!(text.is_empty());
}
