//! TextRank extractive summarizer.
//!
//! Sentences are graph nodes; edge weights are word overlap normalised by
//! sentence length (Mihalcea & Tarau). Scores come from weighted PageRank.
//! The selected sentences are returned in document order.
//!
//! The similarity graph is dense, so only the first
//! [`DEFAULT_MAX_SENTENCES`] sentences of a document are ranked unless the
//! caller picks another bound.

use std::collections::HashSet;

use super::{split_sentences, tokenize};

const DAMPING: f64 = 0.85;
const EPSILON: f64 = 1e-4;
const MAX_ITERATIONS: usize = 100;

/// Sentences ranked per document when no other bound is set.
pub const DEFAULT_MAX_SENTENCES: usize = 300;

/// A sentence and its TextRank score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSentence {
    /// Position in the document.
    pub index: usize,
    /// Sentence text.
    pub text: String,
    /// PageRank score.
    pub score: f64,
}

/// Extractive summarizer with an injected stop-word set.
#[derive(Debug, Clone)]
pub struct TextRankSummarizer {
    stop_words: HashSet<String>,
    max_sentences: usize,
}

impl Default for TextRankSummarizer {
    fn default() -> Self {
        Self {
            stop_words: HashSet::new(),
            max_sentences: DEFAULT_MAX_SENTENCES,
        }
    }
}

impl TextRankSummarizer {
    /// Summarizer without stop words.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rank only the first `max_sentences` sentences; later ones are ignored.
    pub fn with_max_sentences(mut self, max_sentences: usize) -> Self {
        self.max_sentences = max_sentences;
        self
    }

    /// Ignore these words when comparing sentences.
    pub fn with_stop_words(mut self, stop_words: HashSet<String>) -> Self {
        self.stop_words = stop_words;
        self
    }

    /// Return the `sentence_count` highest-ranked sentences in document
    /// order, joined by single spaces.
    ///
    /// Empty input or a zero count yields an empty string. Equal scores
    /// resolve to the earlier sentence.
    pub fn summarize(&self, text: &str, sentence_count: usize) -> String {
        if sentence_count == 0 || text.trim().is_empty() {
            return String::new();
        }

        let mut ranked = self.rank(text);
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));
        ranked.truncate(sentence_count);
        ranked.sort_by_key(|s| s.index);

        ranked
            .into_iter()
            .map(|s| s.text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Score the leading sentences, in document order.
    pub fn rank(&self, text: &str) -> Vec<RankedSentence> {
        let mut sentences = split_sentences(text);
        sentences.truncate(self.max_sentences);
        let tokens: Vec<Vec<String>> = sentences
            .iter()
            .map(|s| tokenize(s, &self.stop_words))
            .collect();
        let scores = pagerank(&similarity_matrix(&tokens));

        sentences
            .into_iter()
            .zip(scores)
            .enumerate()
            .map(|(index, (text, score))| RankedSentence { index, text, score })
            .collect()
    }
}

/// Overlap similarity between two token lists.
#[allow(clippy::cast_precision_loss)] // token counts are far below 2^52
fn similarity(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    let overlap = set_a.intersection(&set_b).count() as f64;
    if overlap == 0.0 {
        return 0.0;
    }
    let norm = (a.len() as f64).ln() + (b.len() as f64).ln();
    if norm.abs() < f64::EPSILON {
        overlap
    } else {
        overlap / norm
    }
}

fn similarity_matrix(tokens: &[Vec<String>]) -> Vec<Vec<f64>> {
    let n = tokens.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..i {
            let weight = similarity(&tokens[i], &tokens[j]);
            matrix[i][j] = weight;
            matrix[j][i] = weight;
        }
    }
    matrix
}

/// Weighted PageRank over a symmetric similarity matrix.
fn pagerank(matrix: &[Vec<f64>]) -> Vec<f64> {
    let n = matrix.len();
    let out_weight: Vec<f64> = matrix.iter().map(|row| row.iter().sum()).collect();
    let mut scores = vec![1.0; n];

    for _ in 0..MAX_ITERATIONS {
        let mut next = vec![1.0 - DAMPING; n];
        for (i, slot) in next.iter_mut().enumerate() {
            let incoming: f64 = (0..n)
                .filter(|&j| j != i && out_weight[j] > 0.0)
                .map(|j| matrix[j][i] / out_weight[j] * scores[j])
                .sum();
            *slot += DAMPING * incoming;
        }
        let delta = next
            .iter()
            .zip(&scores)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        scores = next;
        if delta < EPSILON {
            break;
        }
    }
    scores
}
