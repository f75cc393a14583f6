//! Prompt assembly.
//!
//! Layout of every prompt:
//!
//! 1. system: the persona, in first person
//! 2. system × k: one message per context document, in search rank order
//! 3. system: the goal (if any) and quality expectations
//! 4. user: topic, keywords, length and structure requirements

use std::fmt::Write as _;

use crate::persona::Persona;
use crate::providers::PromptMessage;

/// What the article should be about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleBrief {
    /// Article topic; also the article name.
    pub topic: String,
    /// Keywords to weave in.
    pub keywords: String,
    /// Why the article is written.
    pub goal: Option<String>,
    /// Requested length in tokens.
    pub target_length: u32,
}

/// Builds prompts. Pure: equal inputs give byte-identical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBuilder {
    faq_count: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self { faq_count: 5 }
    }
}

impl PromptBuilder {
    /// Builder requesting `faq_count` FAQ items (zero disables the FAQ).
    pub fn new(faq_count: usize) -> Self {
        Self { faq_count }
    }

    /// Assemble the full prompt.
    pub fn build(
        &self,
        persona: &Persona,
        brief: &ArticleBrief,
        context_docs: &[String],
    ) -> Vec<PromptMessage> {
        let mut messages = Vec::with_capacity(context_docs.len().saturating_add(3));
        messages.push(PromptMessage::system(persona_directive(persona)));
        messages.extend(
            context_docs
                .iter()
                .map(|doc| PromptMessage::system(doc.trim())),
        );
        messages.push(PromptMessage::system(quality_directive(brief.goal.as_deref())));
        messages.push(PromptMessage::user(self.writing_instruction(brief)));
        messages
    }

    fn writing_instruction(&self, brief: &ArticleBrief) -> String {
        let mut text = String::new();
        let _ = write!(
            text,
            "Write a unique, SEO-optimized article on the topic \"{}\"",
            brief.topic
        );
        if brief.keywords.trim().is_empty() {
            text.push_str(". ");
        } else {
            let _ = write!(text, " using the keywords \"{}\". ", brief.keywords.trim());
        }
        let _ = write!(
            text,
            "The article must not exceed {} tokens. ",
            brief.target_length
        );
        text.push_str(
            "Write in your own words and do not copy text from other sources. \
             Stories on the topic are welcome as long as the piece stays structured and engaging. \
             Structure it as a blog article: introduction, main ideas and conclusion. \
             Do not use a chat format; write finished prose. ",
        );
        match self.faq_count {
            0 => text.push_str("Finish the article with conclusions."),
            n => {
                let _ = write!(
                    text,
                    "Finish the article with conclusions and add {n} unique frequently asked questions (FAQ) at the end."
                );
            }
        }
        text
    }
}

fn persona_directive(persona: &Persona) -> String {
    let mut text = String::new();
    let _ = writeln!(
        text,
        "You are {}, and your task is to write articles that match your personal traits.",
        persona.name
    );
    let _ = writeln!(text, "Your biography: {}.", persona.description.trim_end_matches('.'));
    if let Some(words) = non_empty(persona.favored_keywords.as_deref()) {
        let _ = writeln!(text, "Your favorite words: {words}.");
    }
    match (
        non_empty(persona.domain.as_deref()),
        non_empty(persona.tone.as_deref()),
    ) {
        (Some(domain), Some(tone)) => {
            let _ = writeln!(text, "You are an expert in {domain} and write in a {tone} style.");
        }
        (Some(domain), None) => {
            let _ = writeln!(text, "You are an expert in {domain}.");
        }
        (None, Some(tone)) => {
            let _ = writeln!(text, "You write in a {tone} style.");
        }
        (None, None) => {}
    }
    text.push_str(
        "Use your knowledge and experience to write informative and engaging articles.",
    );
    text
}

fn quality_directive(goal: Option<&str>) -> String {
    let mut text = String::new();
    if let Some(goal) = non_empty(goal) {
        let _ = write!(text, "Goal of the article: {}. ", goal.trim_end_matches('.'));
    }
    text.push_str(
        "Use the information about yourself and the provided context to create high-quality content. \
         The article must be accurate and well structured.",
    );
    text
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
