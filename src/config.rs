//! Configuration loading and validation.
//!
//! Ghostwriter keeps its state under a single runtime directory
//! (`~/.ghostwriter/`, or `$GHOSTWRITER_HOME`):
//! - `config.toml`: generation limits, search parameters, model allow-list
//! - `.env`: API keys (see [`crate::credentials`])
//! - `logs/`: rolling JSON logs

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Generation limits and prompt options.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Web search parameters.
    #[serde(default)]
    pub search: SearchConfig,

    /// Page fetching and extraction limits.
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Model entries. Entries with `enabled = true` form the allow-list.
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

/// Target length bounds and prompt options.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Smallest accepted target length.
    #[serde(default = "default_min_length")]
    pub min_length: u32,

    /// Largest accepted target length.
    #[serde(default = "default_max_length")]
    pub max_length: u32,

    /// Number of FAQ items requested at the end of each article.
    #[serde(default = "default_faq_count")]
    pub faq_count: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_length: default_max_length(),
            faq_count: default_faq_count(),
        }
    }
}

/// Yandex XML search parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Search endpoint URL.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Result localisation (`l10n`).
    #[serde(default = "default_l10n")]
    pub l10n: String,

    /// Sort order (`sortby`), `rlv` for relevance.
    #[serde(default = "default_sort_by")]
    pub sort_by: String,

    /// Family filter (`filter`).
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Maximum passages per document (`maxpassages`).
    #[serde(default = "default_max_passages")]
    pub max_passages: u32,

    /// Result groups per page.
    #[serde(default = "default_groups_on_page")]
    pub groups_on_page: u32,

    /// Documents per result group.
    #[serde(default = "default_docs_in_group")]
    pub docs_in_group: u32,

    /// Result page number (`page`).
    #[serde(default = "default_page")]
    pub page: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl SearchConfig {
    /// Upper bound on documents one search call can return.
    pub fn fan_out_width(&self) -> usize {
        let groups = usize::try_from(self.groups_on_page).unwrap_or(usize::MAX);
        let docs = usize::try_from(self.docs_in_group).unwrap_or(usize::MAX);
        groups.saturating_mul(docs)
    }

    /// The `groupby` parameter value.
    pub fn group_by(&self) -> String {
        format!(
            "attr=d.mode=deep.groups-on-page={}.docs-in-group={}",
            self.groups_on_page, self.docs_in_group
        )
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            l10n: default_l10n(),
            sort_by: default_sort_by(),
            filter: default_filter(),
            max_passages: default_max_passages(),
            groups_on_page: default_groups_on_page(),
            docs_in_group: default_docs_in_group(),
            page: default_page(),
            timeout_secs: default_search_timeout(),
        }
    }
}

/// Page fetching limits for the content extractor.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Per-URL fetch timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Bodies larger than this are discarded.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// User-Agent header sent with page requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            max_body_bytes: default_max_body_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

/// Wire format a model entry talks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Yandex foundation models completion API (`{role, text}` messages).
    Yandex,
    /// OpenAI-compatible chat completions API (`{role, content}` messages).
    Chat,
}

/// How retrieved pages are placed into the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    /// Full extracted text.
    #[default]
    Full,
    /// Extractive summary of each page.
    Summary,
}

/// One selectable model.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Identifier callers pass to select this model (e.g. `YandexGPT-lite`).
    pub id: String,

    /// Wire format.
    pub backend: BackendKind,

    /// Upstream model name (`yandexgpt-lite`, `openai/gpt-4o`, ...).
    pub model: String,

    /// Whether the model is part of the allow-list.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Override for the upstream endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Sampling temperature.
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Full page text or per-page summaries in the prompt.
    #[serde(default)]
    pub context: ContextMode,

    /// Sentences kept per page when `context = "summary"`.
    #[serde(default = "default_summary_sentences")]
    pub summary_sentences: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Optional `X-Title` header for chat gateways that want an app name.
    #[serde(default)]
    pub app_title: Option<String>,
}

// Default value functions for serde

fn default_min_length() -> u32 {
    4096
}
fn default_max_length() -> u32 {
    120_000
}
fn default_faq_count() -> usize {
    5
}
fn default_search_endpoint() -> String {
    "https://yandex.ru/search/xml".to_owned()
}
fn default_l10n() -> String {
    "ru".to_owned()
}
fn default_sort_by() -> String {
    "rlv".to_owned()
}
fn default_filter() -> String {
    "strict".to_owned()
}
fn default_max_passages() -> u32 {
    2
}
fn default_groups_on_page() -> u32 {
    5
}
fn default_docs_in_group() -> u32 {
    3
}
fn default_page() -> u32 {
    2
}
fn default_search_timeout() -> u64 {
    10
}
fn default_fetch_timeout() -> u64 {
    15
}
fn default_max_body_bytes() -> usize {
    2_097_152
}
fn default_user_agent() -> String {
    concat!("ghostwriter/", env!("CARGO_PKG_VERSION")).to_owned()
}
fn default_true() -> bool {
    true
}
fn default_summary_sentences() -> usize {
    1
}
fn default_generation_timeout() -> u64 {
    120
}

/// Load the configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    validate(&config)?;
    Ok(config)
}

/// Reject configurations the pipeline cannot run with.
///
/// # Errors
///
/// Returns an error on inverted length bounds, a zero-sized search page,
/// duplicate model ids or a summary model that keeps no sentences.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    let generation = &config.generation;
    if generation.min_length > generation.max_length {
        anyhow::bail!(
            "generation.min_length ({}) exceeds generation.max_length ({})",
            generation.min_length,
            generation.max_length
        );
    }
    if config.search.fan_out_width() == 0 {
        anyhow::bail!("search.groups_on_page and search.docs_in_group must be non-zero");
    }
    let mut seen = std::collections::HashSet::new();
    for model in &config.models {
        if !seen.insert(model.id.as_str()) {
            anyhow::bail!("duplicate model id '{}'", model.id);
        }
        if model.context == ContextMode::Summary && model.summary_sentences == 0 {
            anyhow::bail!(
                "model '{}' uses summary context with summary_sentences = 0",
                model.id
            );
        }
    }
    Ok(())
}

/// Filesystem layout of the runtime directory.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    /// Root directory.
    pub root: PathBuf,
    /// `config.toml`.
    pub config_file: PathBuf,
    /// `.env` with API keys.
    pub env_file: PathBuf,
    /// Log directory.
    pub logs_dir: PathBuf,
}

impl RuntimePaths {
    /// Layout rooted at `root`.
    pub fn under(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.toml"),
            env_file: root.join(".env"),
            logs_dir: root.join("logs"),
            root,
        }
    }
}

/// Resolve the runtime directory: `$GHOSTWRITER_HOME` or `~/.ghostwriter/`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn runtime_paths() -> anyhow::Result<RuntimePaths> {
    runtime_paths_with(|key| std::env::var(key).ok())
}

/// Resolve runtime paths using a custom env resolver (for testing).
#[doc(hidden)]
pub fn runtime_paths_with(env: impl Fn(&str) -> Option<String>) -> anyhow::Result<RuntimePaths> {
    if let Some(root) = env("GHOSTWRITER_HOME").filter(|v| !v.trim().is_empty()) {
        return Ok(RuntimePaths::under(PathBuf::from(root)));
    }
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(RuntimePaths::under(home.home_dir().join(".ghostwriter")))
}
