//! Article service: persona lookup, pipeline run, article persistence.
//!
//! Storage is behind [`PersonaStore`] and [`ArticleStore`]; the crate ships
//! an in-memory implementation of both.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::persona::{Caller, Persona};
use crate::pipeline::{GenerateError, GenerationOutcome, GenerationRequest, Orchestrator};

/// Maximum stored article name length, in characters.
pub const MAX_ARTICLE_NAME_CHARS: usize = 100;

/// Default requested length when the caller does not pass one.
pub const DEFAULT_TARGET_LENGTH: u32 = 4096;

/// Persona lookup.
#[async_trait]
pub trait PersonaStore: Send + Sync {
    /// Persona by id, or `None` if it does not exist.
    async fn get_persona(&self, id: Uuid) -> anyhow::Result<Option<Persona>>;
}

/// Article persistence.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Store a new article and return it with its assigned id.
    async fn create_article(&self, article: NewArticle) -> anyhow::Result<Article>;
}

/// An article before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    /// Article name (the topic, truncated).
    pub name: String,
    /// Generated text.
    pub content: String,
    /// Owning user.
    pub owner_id: Uuid,
}

/// A stored article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    /// Store-assigned id.
    pub id: u64,
    /// Article name.
    pub name: String,
    /// Generated text.
    pub content: String,
    /// Owning user.
    pub owner_id: Uuid,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// Public view returned to the caller.
    pub fn to_public(&self) -> ArticlePublic {
        ArticlePublic {
            id: self.id,
            name: self.name.clone(),
            content: self.content.clone(),
        }
    }
}

/// Article as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticlePublic {
    /// Article id.
    pub id: u64,
    /// Article name.
    pub name: String,
    /// Generated text.
    pub content: String,
}

/// Inbound parameters of a generation call.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateParams {
    /// Persona to write as.
    pub avatar_id: Uuid,
    /// Allow-listed model identifier.
    pub model_id: String,
    /// Article topic.
    pub topic: String,
    /// Search and SEO keywords.
    #[serde(default)]
    pub keywords: String,
    /// Requested length in tokens.
    #[serde(default = "default_target_length")]
    pub target_length: u32,
    /// Why the article is written.
    #[serde(default)]
    pub goal: Option<String>,
    /// Skip search. Unset means "global persona with a goal".
    #[serde(default)]
    pub global_role: Option<bool>,
}

fn default_target_length() -> u32 {
    DEFAULT_TARGET_LENGTH
}

/// What a generation call produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArticleOutcome {
    /// The article was generated and stored.
    Created(ArticlePublic),
    /// The backend produced nothing; nothing was stored.
    #[serde(rename = "error")]
    GenerationFailed {
        /// Human-readable reason.
        message: String,
    },
}

/// Ties the pipeline to persona and article storage.
pub struct ArticleService {
    orchestrator: Arc<Orchestrator>,
    personas: Arc<dyn PersonaStore>,
    articles: Arc<dyn ArticleStore>,
}

impl ArticleService {
    /// Create a service.
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        personas: Arc<dyn PersonaStore>,
        articles: Arc<dyn ArticleStore>,
    ) -> Self {
        Self {
            orchestrator,
            personas,
            articles,
        }
    }

    /// Validate, generate and store one article for `caller`.
    ///
    /// Checks run in order: length, model, persona existence, persona
    /// access. Nothing is stored unless the backend produced text.
    ///
    /// # Errors
    ///
    /// Any [`GenerateError`]; storage failures map to
    /// [`GenerateError::Storage`].
    pub async fn generate_article(
        &self,
        caller: Caller,
        params: GenerateParams,
    ) -> Result<ArticleOutcome, GenerateError> {
        self.orchestrator
            .check_parameters(params.target_length, &params.model_id)?;

        let persona = self
            .personas
            .get_persona(params.avatar_id)
            .await
            .map_err(GenerateError::Storage)?
            .ok_or(GenerateError::PersonaNotFound {
                id: params.avatar_id,
            })?;
        if !persona.readable_by(&caller) {
            return Err(GenerateError::AccessDenied { id: persona.id });
        }

        let global_role = params
            .global_role
            .unwrap_or(persona.is_global && params.goal.is_some());
        let request = GenerationRequest {
            persona,
            caller,
            topic: params.topic,
            keywords: params.keywords,
            target_length: params.target_length,
            goal: params.goal,
            model_id: params.model_id,
            global_role,
        };

        match self.orchestrator.generate(&request).await? {
            GenerationOutcome::Generated(content) => {
                let article = self
                    .articles
                    .create_article(NewArticle {
                        name: article_name(&request.topic),
                        content,
                        owner_id: caller.id,
                    })
                    .await
                    .map_err(GenerateError::Storage)?;
                info!(article_id = article.id, owner = %caller.id, "article stored");
                Ok(ArticleOutcome::Created(article.to_public()))
            }
            GenerationOutcome::Failed { reason } => {
                Ok(ArticleOutcome::GenerationFailed { message: reason })
            }
        }
    }
}

/// Topic trimmed to the stored name limit.
pub fn article_name(topic: &str) -> String {
    topic.trim().chars().take(MAX_ARTICLE_NAME_CHARS).collect()
}

/// Process-local persona and article storage.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    personas: RwLock<HashMap<Uuid, Persona>>,
    articles: RwLock<Vec<Article>>,
}

impl InMemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a persona.
    pub async fn insert_persona(&self, persona: Persona) {
        self.personas.write().await.insert(persona.id, persona);
    }

    /// Snapshot of stored articles, oldest first.
    pub async fn articles(&self) -> Vec<Article> {
        self.articles.read().await.clone()
    }
}

#[async_trait]
impl PersonaStore for InMemoryStore {
    async fn get_persona(&self, id: Uuid) -> anyhow::Result<Option<Persona>> {
        Ok(self.personas.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl ArticleStore for InMemoryStore {
    async fn create_article(&self, article: NewArticle) -> anyhow::Result<Article> {
        let mut articles = self.articles.write().await;
        let id = u64::try_from(articles.len())
            .ok()
            .and_then(|len| len.checked_add(1))
            .ok_or_else(|| anyhow::anyhow!("article id space exhausted"))?;
        let stored = Article {
            id,
            name: article.name,
            content: article.content,
            owner_id: article.owner_id,
            created_at: Utc::now(),
        };
        articles.push(stored.clone());
        Ok(stored)
    }
}
