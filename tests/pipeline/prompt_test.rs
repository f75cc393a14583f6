//! Prompt assembly tests.

use uuid::Uuid;

use ghostwriter::prompt::{ArticleBrief, PromptBuilder};
use ghostwriter::providers::PromptRole;

use crate::mocks::persona;

fn brief() -> ArticleBrief {
    ArticleBrief {
        topic: "Rust ownership".to_owned(),
        keywords: "borrow checker, lifetimes".to_owned(),
        goal: Some("Teach beginners.".to_owned()),
        target_length: 5000,
    }
}

#[test]
fn layout_is_persona_context_quality_instruction() {
    let persona = persona(Uuid::new_v4(), false);
    let docs = vec!["  First doc.  ".to_owned(), "Second doc.".to_owned()];
    let prompt = PromptBuilder::default().build(&persona, &brief(), &docs);

    let roles: Vec<PromptRole> = prompt.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            PromptRole::System,
            PromptRole::System,
            PromptRole::System,
            PromptRole::System,
            PromptRole::User
        ]
    );
    assert!(prompt[0].content.contains("Ada"));
    assert!(prompt[0].content.contains("ownership, lifetimes"));
    assert!(prompt[0].content.contains("programming languages"));
    assert!(prompt[0].content.contains("friendly"));
    assert_eq!(prompt[1].content, "First doc.");
    assert_eq!(prompt[2].content, "Second doc.");
    assert!(prompt[3].content.contains("Goal of the article: Teach beginners."));
}

#[test]
fn instruction_names_topic_keywords_length_and_faq() {
    let persona = persona(Uuid::new_v4(), false);
    let prompt = PromptBuilder::new(7).build(&persona, &brief(), &[]);
    let instruction = &prompt[prompt.len() - 1].content;

    assert!(instruction.contains("\"Rust ownership\""));
    assert!(instruction.contains("\"borrow checker, lifetimes\""));
    assert!(instruction.contains("must not exceed 5000 tokens"));
    assert!(instruction.contains("add 7 unique frequently asked questions"));
}

#[test]
fn zero_faq_count_asks_for_conclusions_only() {
    let persona = persona(Uuid::new_v4(), false);
    let prompt = PromptBuilder::new(0).build(&persona, &brief(), &[]);
    let instruction = &prompt[prompt.len() - 1].content;
    assert!(instruction.ends_with("Finish the article with conclusions."));
    assert!(!instruction.contains("FAQ"));
}

#[test]
fn missing_optional_fields_are_omitted() {
    let mut persona = persona(Uuid::new_v4(), true);
    persona.favored_keywords = None;
    persona.domain = Some("  ".to_owned());
    persona.tone = None;
    let mut brief = brief();
    brief.goal = None;
    brief.keywords = String::new();

    let prompt = PromptBuilder::default().build(&persona, &brief, &[]);
    assert_eq!(prompt.len(), 3);
    assert!(!prompt[0].content.contains("favorite words"));
    assert!(!prompt[0].content.contains("expert in"));
    assert!(!prompt[1].content.contains("Goal of the article"));
    assert!(!prompt[2].content.contains("using the keywords"));
}

#[test]
fn equal_inputs_give_identical_prompts() {
    let persona = persona(Uuid::new_v4(), false);
    let docs = vec!["Doc.".to_owned()];
    let builder = PromptBuilder::default();
    assert_eq!(
        builder.build(&persona, &brief(), &docs),
        builder.build(&persona, &brief(), &docs)
    );
}
