//! Model registry: the allow-list of selectable models and their backends.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{BackendKind, ContextMode, ModelConfig};
use crate::credentials::{Credentials, CHAT_API_KEY, YANDEX_FOLDER_ID, YANDEX_MODELS_API_KEY};

use super::chat::ChatBackend;
use super::yandex::YandexBackend;
use super::GenerationBackend;

/// Registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The identifier is not in the allow-list.
    #[error("model '{id}' is unavailable or not supported")]
    UnknownModel {
        /// Requested identifier.
        id: String,
    },
    /// Required API credential missing for the model's backend.
    #[error("missing credential for model '{id}': {key}")]
    MissingCredential {
        /// Model identifier.
        id: String,
        /// Missing credential key.
        key: String,
    },
    /// The backend could not be constructed.
    #[error("failed to initialise backend for model '{id}': {reason}")]
    Backend {
        /// Model identifier.
        id: String,
        /// Underlying error text.
        reason: String,
    },
}

/// How the pipeline feeds retrieved pages to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextProfile {
    /// Full text or summaries.
    pub mode: ContextMode,
    /// Sentences per summary when `mode` is [`ContextMode::Summary`].
    pub summary_sentences: usize,
}

impl Default for ContextProfile {
    fn default() -> Self {
        Self {
            mode: ContextMode::Full,
            summary_sentences: 1,
        }
    }
}

/// An allow-listed model.
#[derive(Clone)]
pub struct RegisteredModel {
    /// Backend instance bound to the model.
    pub backend: Arc<dyn GenerationBackend>,
    /// Context handling.
    pub context: ContextProfile,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
}

impl std::fmt::Debug for RegisteredModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredModel")
            .field("model_id", &self.backend.model_id())
            .field("context", &self.context)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Read-only allow-list built once at startup.
#[derive(Clone, Default, Debug)]
pub struct ModelRegistry {
    models: HashMap<String, RegisteredModel>,
}

impl ModelRegistry {
    /// Build the registry from model config and loaded credentials.
    ///
    /// Disabled entries are skipped. Enabled entries whose credentials are
    /// missing are skipped with a warning, so they are treated as unknown.
    pub fn from_config(models: &[ModelConfig], credentials: &Credentials) -> Self {
        let mut registry = Self::default();
        for entry in models.iter().filter(|m| m.enabled) {
            match instantiate_backend(entry, credentials) {
                Ok(backend) => {
                    info!(model = %entry.id, backend = ?entry.backend, "model enabled");
                    registry.models.insert(
                        entry.id.clone(),
                        RegisteredModel {
                            backend,
                            context: ContextProfile {
                                mode: entry.context,
                                summary_sentences: entry.summary_sentences,
                            },
                            temperature: entry.temperature,
                        },
                    );
                }
                Err(e) => warn!(model = %entry.id, error = %e, "model skipped"),
            }
        }
        registry
    }

    /// Register a backend directly (tests and embedding hosts).
    pub fn with_backend(
        mut self,
        backend: Arc<dyn GenerationBackend>,
        context: ContextProfile,
    ) -> Self {
        self.models.insert(
            backend.model_id().to_owned(),
            RegisteredModel {
                backend,
                context,
                temperature: None,
            },
        );
        self
    }

    /// Look up an allow-listed model.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownModel`] for identifiers outside the allow-list.
    pub fn resolve(&self, id: &str) -> Result<&RegisteredModel, RegistryError> {
        self.models.get(id).ok_or_else(|| RegistryError::UnknownModel { id: id.to_owned() })
    }

    /// Returns true when a model identifier is allow-listed.
    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    /// Returns the number of allow-listed models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true when no model is allow-listed.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Returns all allow-listed identifiers in sorted order.
    pub fn available_ids(&self) -> Vec<String> {
        let mut values: Vec<String> = self.models.keys().cloned().collect();
        values.sort();
        values
    }
}

fn instantiate_backend(
    entry: &ModelConfig,
    credentials: &Credentials,
) -> Result<Arc<dyn GenerationBackend>, RegistryError> {
    let timeout = Duration::from_secs(entry.timeout_secs);
    let require = |key: &str| {
        credentials
            .get(key)
            .map(str::to_owned)
            .ok_or_else(|| RegistryError::MissingCredential {
                id: entry.id.clone(),
                key: key.to_owned(),
            })
    };
    let backend_error = |e: super::GenerationError| RegistryError::Backend {
        id: entry.id.clone(),
        reason: e.to_string(),
    };

    match entry.backend {
        BackendKind::Yandex => {
            let folder_id = require(YANDEX_FOLDER_ID)?;
            let api_key = require(YANDEX_MODELS_API_KEY)?;
            let backend = match &entry.endpoint {
                Some(endpoint) => YandexBackend::with_endpoint(
                    entry.id.clone(),
                    &folder_id,
                    &entry.model,
                    api_key,
                    endpoint.clone(),
                    timeout,
                ),
                None => {
                    YandexBackend::new(entry.id.clone(), &folder_id, &entry.model, api_key, timeout)
                }
            }
            .map_err(backend_error)?;
            Ok(Arc::new(backend))
        }
        BackendKind::Chat => {
            let api_key = require(CHAT_API_KEY)?;
            let backend = match &entry.endpoint {
                Some(endpoint) => ChatBackend::with_endpoint(
                    entry.id.clone(),
                    entry.model.clone(),
                    api_key,
                    endpoint.clone(),
                    timeout,
                ),
                None => ChatBackend::new(entry.id.clone(), entry.model.clone(), api_key, timeout),
            }
            .map_err(backend_error)?
            .with_app_title(entry.app_title.clone());
            Ok(Arc::new(backend))
        }
    }
}
