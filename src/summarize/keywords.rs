//! TF-IDF keyword statistics over lemmatized text.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::{split_sentences, tokenize};

/// Maps a word form to its dictionary form.
pub trait Lemmatizer: Send + Sync {
    /// Lemma of a lowercase word.
    fn lemmatize<'a>(&self, word: &'a str) -> Cow<'a, str>;
}

/// Leaves words unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLemmatizer;

impl Lemmatizer for IdentityLemmatizer {
    fn lemmatize<'a>(&self, word: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(word)
    }
}

/// Dictionary lemmatizer; unknown words pass through.
#[derive(Debug, Clone, Default)]
pub struct MapLemmatizer {
    lemmas: HashMap<String, String>,
}

impl MapLemmatizer {
    /// Build from `(form, lemma)` pairs. Both sides are lowercased.
    pub fn from_pairs<I, F, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (F, L)>,
        F: AsRef<str>,
        L: AsRef<str>,
    {
        Self {
            lemmas: pairs
                .into_iter()
                .map(|(form, lemma)| (form.as_ref().to_lowercase(), lemma.as_ref().to_lowercase()))
                .collect(),
        }
    }

    /// Parse tab-separated `form<TAB>lemma` lines; malformed lines are skipped.
    pub fn from_tsv(text: &str) -> Self {
        Self::from_pairs(text.lines().filter_map(|line| {
            let (form, lemma) = line.split_once('\t')?;
            let (form, lemma) = (form.trim(), lemma.trim());
            (!form.is_empty() && !lemma.is_empty()).then_some((form, lemma))
        }))
    }
}

impl Lemmatizer for MapLemmatizer {
    fn lemmatize<'a>(&self, word: &'a str) -> Cow<'a, str> {
        match self.lemmas.get(word) {
            Some(lemma) => Cow::Owned(lemma.clone()),
            None => Cow::Borrowed(word),
        }
    }
}

/// One ranked keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordStat {
    /// Lemma.
    pub keyword: String,
    /// Occurrences in the whole text.
    pub count: usize,
    /// Term frequency × smoothed inverse sentence frequency.
    pub score: f64,
}

/// Rank the `top_n` keywords of `text`.
///
/// Sentences act as documents for IDF (`ln((1+N)/(1+df)) + 1`). Stop words
/// are checked before and after lemmatization; numbers and one-letter tokens
/// are dropped. Ordering is score, then count (both descending), then
/// keyword, so equal inputs always produce equal output.
#[allow(clippy::cast_precision_loss)] // term counts are far below 2^52
pub fn analyze_text(
    text: &str,
    stop_words: &HashSet<String>,
    lemmatizer: &dyn Lemmatizer,
    top_n: usize,
) -> Vec<KeywordStat> {
    let sentences: Vec<Vec<String>> = split_sentences(text)
        .iter()
        .map(|sentence| {
            tokenize(sentence, stop_words)
                .iter()
                .map(|word| lemmatizer.lemmatize(word).into_owned())
                .filter(|lemma| is_keyword_candidate(lemma, stop_words))
                .collect()
        })
        .collect();

    let total_terms: usize = sentences.iter().map(Vec::len).sum();
    if total_terms == 0 || top_n == 0 {
        return Vec::new();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut document_frequency: HashMap<&str, usize> = HashMap::new();
    for sentence in &sentences {
        let mut seen: HashSet<&str> = HashSet::new();
        for lemma in sentence {
            let count = counts.entry(lemma.as_str()).or_insert(0);
            *count = count.saturating_add(1);
            if seen.insert(lemma.as_str()) {
                let df = document_frequency.entry(lemma.as_str()).or_insert(0);
                *df = df.saturating_add(1);
            }
        }
    }

    let n_docs = sentences.len() as f64;
    let mut stats: Vec<KeywordStat> = counts
        .into_iter()
        .map(|(keyword, count)| {
            let df = document_frequency.get(keyword).copied().unwrap_or(0) as f64;
            let tf = count as f64 / total_terms as f64;
            let idf = ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0;
            KeywordStat {
                keyword: keyword.to_owned(),
                count,
                score: tf * idf,
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(b.count.cmp(&a.count))
            .then_with(|| a.keyword.cmp(&b.keyword))
    });
    stats.truncate(top_n);
    stats
}

fn is_keyword_candidate(lemma: &str, stop_words: &HashSet<String>) -> bool {
    lemma.chars().count() > 1
        && !lemma.chars().all(|c| c.is_numeric())
        && !stop_words.contains(lemma)
}
