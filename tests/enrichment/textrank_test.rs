//! TextRank summarizer tests.

use std::collections::HashSet;

use ghostwriter::summarize::{split_sentences, TextRankSummarizer};

const TEXT: &str = "The Rust compiler checks memory safety. \
                    Bananas are yellow. \
                    The Rust compiler rejects unsafe memory access. \
                    Memory safety in Rust comes from the compiler.";

#[test]
fn central_sentence_outranks_unrelated_one() {
    let summary = TextRankSummarizer::new().summarize(TEXT, 1);
    assert!(!summary.is_empty());
    assert_ne!(summary, "Bananas are yellow.");
    assert!(split_sentences(TEXT).contains(&summary));
}

#[test]
fn selected_sentences_keep_document_order() {
    let sentences = split_sentences(TEXT);
    let summary = TextRankSummarizer::new().summarize(TEXT, 2);

    let positions: Vec<usize> = sentences
        .iter()
        .enumerate()
        .filter(|(_, sentence)| summary.contains(sentence.as_str()))
        .map(|(index, _)| index)
        .collect();
    assert_eq!(positions.len(), 2);

    let picked: Vec<&str> = positions.iter().map(|&i| sentences[i].as_str()).collect();
    assert_eq!(summary, picked.join(" "));
}

#[test]
fn asking_for_more_sentences_than_exist_returns_all() {
    let summary = TextRankSummarizer::new().summarize(TEXT, 10);
    assert_eq!(summary, split_sentences(TEXT).join(" "));
}

#[test]
fn empty_input_and_zero_count_yield_empty_summary() {
    let summarizer = TextRankSummarizer::new();
    assert!(summarizer.summarize("", 3).is_empty());
    assert!(summarizer.summarize("   \n\n ", 3).is_empty());
    assert!(summarizer.summarize(TEXT, 0).is_empty());
}

#[test]
fn summary_is_deterministic() {
    let stop: HashSet<String> = ["the", "in", "from", "are"]
        .iter()
        .map(|w| (*w).to_owned())
        .collect();
    let summarizer = TextRankSummarizer::new().with_stop_words(stop);
    assert_eq!(summarizer.summarize(TEXT, 2), summarizer.summarize(TEXT, 2));
}

#[test]
fn rank_scores_every_sentence_in_order() {
    let ranked = TextRankSummarizer::new().rank(TEXT);
    assert_eq!(ranked.len(), 4);
    for (expected, sentence) in ranked.iter().enumerate() {
        assert_eq!(sentence.index, expected);
        assert!(sentence.score > 0.0);
    }
}

#[test]
fn only_leading_sentences_are_ranked() {
    let summarizer = TextRankSummarizer::new().with_max_sentences(2);
    let sentences = split_sentences(TEXT);

    assert_eq!(summarizer.rank(TEXT).len(), 2);
    assert_eq!(summarizer.summarize(TEXT, 10), sentences[..2].join(" "));
}

#[test]
fn long_documents_are_ranked_up_to_the_default_bound() {
    let text = "Rust keeps memory safe without a collector. ".repeat(5_000);
    let ranked = TextRankSummarizer::new().rank(&text);
    assert_eq!(ranked.len(), ghostwriter::summarize::textrank::DEFAULT_MAX_SENTENCES);
}
