//! Article generation pipeline.
//!
//! Stages, strictly forward:
//! - Validating: target length, model allow-list, persona access (no I/O)
//! - Searching: one search call, skipped for global-role requests
//! - Extracting+Summarizing: concurrent per-URL fetch, optional TextRank
//! - Prompting: [`PromptBuilder`]
//! - Generating: the selected [`GenerationBackend`](crate::providers::GenerationBackend)
//!
//! Enrichment failures (search, extraction, summarization) degrade the
//! context and never abort a request. Only validation and backend failures
//! reach the caller.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{Config, ContextMode};
use crate::extract::ContentExtractor;
use crate::persona::{Caller, Persona};
use crate::prompt::{ArticleBrief, PromptBuilder};
use crate::providers::registry::{ContextProfile, ModelRegistry, RegisteredModel};
use crate::providers::{GenerationError, GenerationOptions};
use crate::search::SearchClient;
use crate::summarize::TextRankSummarizer;

/// Errors surfaced to the caller of the pipeline.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Requested length is outside the accepted range.
    #[error("target length {length} is outside [{min}, {max}]")]
    InvalidLength {
        /// Requested length.
        length: u32,
        /// Lower bound.
        min: u32,
        /// Upper bound.
        max: u32,
    },
    /// Model identifier is not allow-listed.
    #[error("model '{model}' is unavailable or not supported")]
    ModelUnavailable {
        /// Requested identifier.
        model: String,
    },
    /// Persona does not exist.
    #[error("persona {id} does not exist")]
    PersonaNotFound {
        /// Requested persona id.
        id: Uuid,
    },
    /// Caller may not use the persona.
    #[error("no access to persona {id}")]
    AccessDenied {
        /// Persona id.
        id: Uuid,
    },
    /// Backend answered with a non-success status.
    #[error("generation backend returned status {status}: {body}")]
    Upstream {
        /// Upstream HTTP status.
        status: u16,
        /// Sanitized upstream body.
        body: String,
    },
    /// Backend could not be reached.
    #[error("generation backend unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    /// Backend answered with something other than the documented schema.
    #[error("generation backend response invalid: {0}")]
    InvalidResponse(String),
    /// Persona or article storage failed.
    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

impl GenerateError {
    /// HTTP status a route handler should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidLength { .. } => 400,
            Self::AccessDenied { .. } => 403,
            Self::ModelUnavailable { .. } | Self::PersonaNotFound { .. } => 404,
            Self::Upstream { .. } | Self::Transport(_) | Self::InvalidResponse(_) => 502,
            Self::Storage(_) => 500,
        }
    }
}

impl From<GenerationError> for GenerateError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Upstream { status, body } => Self::Upstream { status, body },
            GenerationError::Transport(e) => Self::Transport(e),
            GenerationError::Parse(reason) => Self::InvalidResponse(reason),
            empty @ GenerationError::EmptyResult => Self::InvalidResponse(empty.to_string()),
        }
    }
}

/// One article generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Persona the article is attributed to.
    pub persona: Persona,
    /// Authenticated caller.
    pub caller: Caller,
    /// Article topic.
    pub topic: String,
    /// Search and SEO keywords.
    pub keywords: String,
    /// Requested length in tokens.
    pub target_length: u32,
    /// Why the article is written.
    pub goal: Option<String>,
    /// Allow-listed model identifier.
    pub model_id: String,
    /// Skip web search and write from the persona and goal alone.
    pub global_role: bool,
}

/// Result of a request that passed validation and reached a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Article text.
    Generated(String),
    /// The backend produced no text.
    Failed {
        /// Human-readable reason.
        reason: String,
    },
}

/// Accepted target length range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthLimits {
    /// Inclusive lower bound.
    pub min: u32,
    /// Inclusive upper bound.
    pub max: u32,
}

impl LengthLimits {
    /// Whether `length` is accepted.
    pub fn contains(&self, length: u32) -> bool {
        (self.min..=self.max).contains(&length)
    }
}

/// The generation pipeline. Holds only read-only collaborators, so one
/// instance serves concurrent requests.
pub struct Orchestrator {
    search: Arc<dyn SearchClient>,
    extractor: Arc<dyn ContentExtractor>,
    summarizer: Arc<TextRankSummarizer>,
    prompts: PromptBuilder,
    models: Arc<ModelRegistry>,
    limits: LengthLimits,
    max_context_documents: usize,
}

impl Orchestrator {
    /// Wire the pipeline from its collaborators and the loaded config.
    pub fn new(
        search: Arc<dyn SearchClient>,
        extractor: Arc<dyn ContentExtractor>,
        models: Arc<ModelRegistry>,
        config: &Config,
    ) -> Self {
        Self {
            search,
            extractor,
            summarizer: Arc::new(TextRankSummarizer::new()),
            prompts: PromptBuilder::new(config.generation.faq_count),
            models,
            limits: LengthLimits {
                min: config.generation.min_length,
                max: config.generation.max_length,
            },
            max_context_documents: config.search.fan_out_width(),
        }
    }

    /// Replace the default summarizer (e.g. to inject stop words).
    pub fn with_summarizer(mut self, summarizer: TextRankSummarizer) -> Self {
        self.summarizer = Arc::new(summarizer);
        self
    }

    /// The model allow-list.
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Accepted target length range.
    pub fn limits(&self) -> LengthLimits {
        self.limits
    }

    /// Validate the request shape: length first, then model.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::InvalidLength`] or
    /// [`GenerateError::ModelUnavailable`].
    pub fn check_parameters(
        &self,
        target_length: u32,
        model_id: &str,
    ) -> Result<&RegisteredModel, GenerateError> {
        if !self.limits.contains(target_length) {
            return Err(GenerateError::InvalidLength {
                length: target_length,
                min: self.limits.min,
                max: self.limits.max,
            });
        }
        self.models
            .resolve(model_id)
            .map_err(|_| GenerateError::ModelUnavailable {
                model: model_id.to_owned(),
            })
    }

    /// Run the pipeline for one request.
    ///
    /// # Errors
    ///
    /// Returns validation errors before any I/O, and backend errors other
    /// than an empty result (which becomes [`GenerationOutcome::Failed`]).
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerateError> {
        debug!(model = %request.model_id, persona = %request.persona.id, "stage: validating");
        let model = self.check_parameters(request.target_length, &request.model_id)?;
        if !request.persona.readable_by(&request.caller) {
            return Err(GenerateError::AccessDenied {
                id: request.persona.id,
            });
        }

        let context = if request.global_role {
            info!(persona = %request.persona.id, "global role: search skipped");
            Vec::new()
        } else {
            self.gather_context(&request.topic, &request.keywords, model.context)
                .await
        };

        debug!(context_documents = context.len(), "stage: prompting");
        let brief = ArticleBrief {
            topic: request.topic.clone(),
            keywords: request.keywords.clone(),
            goal: request.goal.clone(),
            target_length: request.target_length,
        };
        let prompt = self.prompts.build(&request.persona, &brief, &context);

        info!(
            model = %request.model_id,
            messages = prompt.len(),
            context_documents = context.len(),
            "stage: generating"
        );
        let options = GenerationOptions {
            max_tokens: request.target_length,
            temperature: model.temperature,
        };
        match model.backend.generate(&prompt, options).await {
            Ok(text) => {
                info!(model = %request.model_id, chars = text.chars().count(), "article generated");
                Ok(GenerationOutcome::Generated(text))
            }
            Err(empty @ GenerationError::EmptyResult) => {
                warn!(model = %request.model_id, "backend returned no text");
                Ok(GenerationOutcome::Failed {
                    reason: empty.to_string(),
                })
            }
            Err(e) => {
                error!(model = %request.model_id, error = %e, "generation failed");
                Err(e.into())
            }
        }
    }

    /// Search, then extract (and optionally summarize) every hit concurrently.
    ///
    /// Returns context documents in search rank order. Any failure shrinks
    /// the result instead of failing it.
    pub async fn gather_context(
        &self,
        topic: &str,
        keywords: &str,
        profile: ContextProfile,
    ) -> Vec<String> {
        debug!("stage: searching");
        let response = match self.search.search(topic, keywords).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "search unavailable, continuing without context");
                return Vec::new();
            }
        };

        let urls: Vec<String> = response
            .results
            .into_iter()
            .map(|hit| hit.url)
            .filter(|url| !url.trim().is_empty())
            .take(self.max_context_documents)
            .collect();
        debug!(urls = urls.len(), mode = ?profile.mode, "stage: extracting");

        // Dropping the set aborts outstanding fetches.
        let mut tasks = JoinSet::new();
        for (rank, url) in urls.into_iter().enumerate() {
            let extractor = Arc::clone(&self.extractor);
            let summarizer = Arc::clone(&self.summarizer);
            tasks.spawn(async move {
                let text = extractor.extract(&url).await;
                let document = condense(summarizer, text, profile).await;
                if document.is_none() {
                    debug!(url = %url, "no usable text, document dropped");
                }
                (rank, document)
            });
        }

        let mut documents: Vec<(usize, String)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((rank, Some(document))) => documents.push((rank, document)),
                Ok((_, None)) => {}
                Err(e) => warn!(error = %e, "context task failed"),
            }
        }
        documents.sort_by_key(|(rank, _)| *rank);
        documents.into_iter().map(|(_, document)| document).collect()
    }
}

/// Turn extracted text into a context document, or `None` if nothing is left.
async fn condense(
    summarizer: Arc<TextRankSummarizer>,
    text: String,
    profile: ContextProfile,
) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    let document = match profile.mode {
        ContextMode::Full => text,
        ContextMode::Summary => {
            let sentences = profile.summary_sentences;
            match tokio::task::spawn_blocking(move || summarizer.summarize(&text, sentences)).await
            {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(error = %e, "summarizer task failed");
                    return None;
                }
            }
        }
    };
    let document = document.trim();
    (!document.is_empty()).then(|| document.to_owned())
}
