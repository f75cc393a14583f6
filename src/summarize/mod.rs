//! Extractive text statistics: sentence splitting, tokenization, TextRank
//! summaries and TF-IDF keywords.

use std::collections::HashSet;

pub mod keywords;
pub mod textrank;

pub use keywords::{analyze_text, IdentityLemmatizer, KeywordStat, Lemmatizer, MapLemmatizer};
pub use textrank::TextRankSummarizer;

const TERMINATORS: &[char] = &['.', '!', '?', '…'];
const CLOSERS: &[char] = &['"', '\'', '»', '”', ')', ']'];

/// Split text into sentences.
///
/// A sentence ends at `.`, `!`, `?` or `…` (plus any closing quotes or
/// brackets) followed by whitespace or the end of text. Blank lines always
/// end a sentence. Whitespace inside a sentence is collapsed.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let normalized = text.replace("\r\n", "\n");
    for paragraph in normalized.split("\n\n") {
        let mut chars = paragraph.chars().peekable();
        let mut current = String::new();
        while let Some(c) = chars.next() {
            current.push(c);
            if !TERMINATORS.contains(&c) {
                continue;
            }
            while let Some(&next) = chars.peek() {
                if !TERMINATORS.contains(&next) && !CLOSERS.contains(&next) {
                    break;
                }
                current.push(next);
                chars.next();
            }
            if chars.peek().map_or(true, |next| next.is_whitespace()) {
                push_sentence(&mut sentences, &current);
                current.clear();
            }
        }
        push_sentence(&mut sentences, &current);
    }
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let sentence = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if sentence.chars().any(char::is_alphanumeric) {
        sentences.push(sentence);
    }
}

/// Lowercase alphanumeric words of `text`, minus `stop_words`.
pub fn tokenize(text: &str, stop_words: &HashSet<String>) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .filter(|word| !stop_words.contains(word))
        .collect()
}

/// Parse a stop-word list: whitespace separated, `#` starts a comment.
pub fn parse_stop_words(text: &str) -> HashSet<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(str::split_whitespace)
        .map(str::to_lowercase)
        .collect()
}
