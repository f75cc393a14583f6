//! Ghostwriter CLI entry point.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use uuid::Uuid;

use ghostwriter::articles::{ArticleService, GenerateParams, InMemoryStore};
use ghostwriter::config::{self, Config, RuntimePaths};
use ghostwriter::credentials::{self, Credentials};
use ghostwriter::extract::{ContentExtractor, HttpExtractor};
use ghostwriter::logging::{self, Verbosity};
use ghostwriter::persona::{Caller, Persona};
use ghostwriter::pipeline::Orchestrator;
use ghostwriter::providers::registry::ModelRegistry;
use ghostwriter::search::yandex::YandexSearchClient;
use ghostwriter::search::{DisabledSearch, SearchClient};
use ghostwriter::summarize::{
    analyze_text, parse_stop_words, IdentityLemmatizer, Lemmatizer, MapLemmatizer,
    TextRankSummarizer,
};

/// Persona-driven article generator.
#[derive(Debug, Parser)]
#[command(name = "ghostwriter", version, about)]
struct Cli {
    /// Config file (defaults to `config.toml` in the runtime directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log detail; repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate one article and print it as JSON.
    Generate {
        /// Persona TOML file.
        #[arg(long)]
        persona: PathBuf,
        /// Article topic.
        #[arg(long)]
        topic: String,
        /// Keywords for search and SEO.
        #[arg(long, default_value = "")]
        keywords: String,
        /// Allow-listed model identifier.
        #[arg(long)]
        model: String,
        /// Target length in tokens.
        #[arg(long, default_value_t = ghostwriter::articles::DEFAULT_TARGET_LENGTH)]
        length: u32,
        /// Why the article is written.
        #[arg(long)]
        goal: Option<String>,
        /// Skip web search.
        #[arg(long)]
        global_role: bool,
        /// Stop-word file used by summarizing models.
        #[arg(long)]
        stop_words: Option<PathBuf>,
    },
    /// List allow-listed models.
    Models,
    /// Print TF-IDF keyword statistics for a text file.
    Keywords {
        /// Text file to analyse.
        #[arg(long)]
        file: PathBuf,
        /// Number of keywords to print.
        #[arg(long, default_value_t = 20)]
        top: usize,
        /// Stop-word file.
        #[arg(long)]
        stop_words: Option<PathBuf>,
        /// `form<TAB>lemma` dictionary.
        #[arg(long)]
        lemmas: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = config::runtime_paths()?;

    match cli.command {
        Command::Generate {
            persona,
            topic,
            keywords,
            model,
            length,
            goal,
            global_role,
            stop_words,
        } => {
            let _guard = logging::init_production(
                &paths.logs_dir,
                Verbosity::raised(Verbosity::Normal, cli.verbose),
            )?;
            let config = load_config_or_default(cli.config.as_deref(), &paths)?;
            let credentials = load_credentials_or_empty(&paths);
            let persona = load_persona(&persona)?;
            let stop_words = read_stop_words(stop_words.as_deref())?;

            let models = Arc::new(ModelRegistry::from_config(&config.models, &credentials));
            let search = build_search(&config, &credentials)?;
            let extractor: Arc<dyn ContentExtractor> =
                Arc::new(HttpExtractor::new(&config.extraction)?);
            let orchestrator = Orchestrator::new(search, extractor, models, &config)
                .with_summarizer(TextRankSummarizer::new().with_stop_words(stop_words));

            let store = Arc::new(InMemoryStore::new());
            let avatar_id = persona.id;
            store.insert_persona(persona).await;
            let service = ArticleService::new(Arc::new(orchestrator), store.clone(), store);

            // The local operator acts as a superuser.
            let caller = Caller {
                id: Uuid::nil(),
                is_superuser: true,
            };
            let params = GenerateParams {
                avatar_id,
                model_id: model,
                topic,
                keywords,
                target_length: length,
                goal,
                global_role: global_role.then_some(true),
            };
            let outcome = service
                .generate_article(caller, params)
                .await
                .map_err(|e| anyhow::anyhow!("generation failed ({}): {e}", e.http_status()))?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Models => {
            logging::init_cli(Verbosity::raised(Verbosity::Quiet, cli.verbose));
            let config = load_config_or_default(cli.config.as_deref(), &paths)?;
            let credentials = load_credentials_or_empty(&paths);
            let registry = ModelRegistry::from_config(&config.models, &credentials);
            if registry.is_empty() {
                println!("no models available");
            }
            for id in registry.available_ids() {
                println!("{id}");
            }
        }
        Command::Keywords {
            file,
            top,
            stop_words,
            lemmas,
        } => {
            logging::init_cli(Verbosity::raised(Verbosity::Quiet, cli.verbose));
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let stop_words = read_stop_words(stop_words.as_deref())?;
            let lemmatizer: Box<dyn Lemmatizer> = match lemmas {
                Some(path) => {
                    let tsv = std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    Box::new(MapLemmatizer::from_tsv(&tsv))
                }
                None => Box::new(IdentityLemmatizer),
            };
            let stats = analyze_text(&text, &stop_words, lemmatizer.as_ref(), top);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn load_config_or_default(explicit: Option<&Path>, paths: &RuntimePaths) -> Result<Config> {
    match explicit {
        Some(path) => config::load_config(path),
        None if paths.config_file.exists() => config::load_config(&paths.config_file),
        None => {
            info!(path = %paths.config_file.display(), "no config file, using defaults");
            Ok(Config::default())
        }
    }
}

fn load_credentials_or_empty(paths: &RuntimePaths) -> Credentials {
    let loaded = match credentials::load_credentials(&paths.env_file) {
        Ok(credentials) => credentials,
        Err(e) => {
            warn!(error = %e, "credentials file unavailable, using environment only");
            Credentials::default()
        }
    };
    loaded.fill_missing_from(|key| std::env::var(key).ok())
}

fn load_persona(path: &Path) -> Result<Persona> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read persona {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("failed to parse persona {}", path.display()))
}

fn read_stop_words(path: Option<&Path>) -> Result<HashSet<String>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read stop words {}", path.display()))?;
            Ok(parse_stop_words(&text))
        }
        None => Ok(HashSet::new()),
    }
}

fn build_search(config: &Config, credentials: &Credentials) -> Result<Arc<dyn SearchClient>> {
    match credentials.search_keys() {
        Some(keys) => Ok(Arc::new(
            YandexSearchClient::new(config.search.clone(), keys.folder_id, keys.api_key)
                .context("failed to build search client")?,
        )),
        None => {
            warn!("search credentials missing, articles will be written without web context");
            Ok(Arc::new(DisabledSearch))
        }
    }
}
