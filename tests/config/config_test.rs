//! Config file loading tests.

use std::fs;

use ghostwriter::config::{load_config, runtime_paths_with, BackendKind, ContextMode};

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).expect("config should be written");
    (dir, path)
}

#[test]
fn full_config_round_trips_from_toml() {
    let (_dir, path) = write_config(
        r#"
[generation]
min_length = 1000
max_length = 8000
faq_count = 3

[search]
groups_on_page = 2
docs_in_group = 2
page = 0

[extraction]
timeout_secs = 5

[[models]]
id = "YandexGPT-lite"
backend = "yandex"
model = "yandexgpt-lite"
context = "summary"

[[models]]
id = "gpt-4o"
backend = "chat"
model = "openai/gpt-4o"
endpoint = "http://localhost:9999/v1/chat/completions"
app_title = "Ghostwriter"
"#,
    );

    let config = match load_config(&path) {
        Ok(config) => config,
        Err(err) => panic!("config should load: {err}"),
    };
    assert_eq!(config.generation.min_length, 1000);
    assert_eq!(config.generation.max_length, 8000);
    assert_eq!(config.generation.faq_count, 3);
    assert_eq!(config.search.fan_out_width(), 4);
    assert_eq!(config.search.page, 0);
    assert_eq!(config.search.l10n, "ru");
    assert_eq!(config.extraction.timeout_secs, 5);

    assert_eq!(config.models.len(), 2);
    assert_eq!(config.models[0].backend, BackendKind::Yandex);
    assert_eq!(config.models[0].context, ContextMode::Summary);
    assert_eq!(config.models[0].summary_sentences, 1);
    assert!(config.models[0].enabled);
    assert_eq!(config.models[1].backend, BackendKind::Chat);
    assert_eq!(config.models[1].context, ContextMode::Full);
    assert_eq!(config.models[1].app_title.as_deref(), Some("Ghostwriter"));
}

#[test]
fn empty_file_uses_defaults() {
    let (_dir, path) = write_config("");
    let config = match load_config(&path) {
        Ok(config) => config,
        Err(err) => panic!("empty config should load: {err}"),
    };
    assert_eq!(config.generation.min_length, 4096);
    assert_eq!(config.generation.max_length, 120_000);
    assert!(config.models.is_empty());
}

#[test]
fn inverted_length_bounds_are_rejected() {
    let (_dir, path) = write_config("[generation]\nmin_length = 9000\nmax_length = 100\n");
    let err = match load_config(&path) {
        Ok(_) => panic!("inverted bounds should be rejected"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("min_length"));
}

#[test]
fn duplicate_model_ids_are_rejected() {
    let (_dir, path) = write_config(
        r#"
[[models]]
id = "m"
backend = "chat"
model = "a"

[[models]]
id = "m"
backend = "yandex"
model = "b"
"#,
    );
    assert!(load_config(&path).is_err());
}

#[test]
fn summary_model_without_sentences_is_rejected() {
    let (_dir, path) = write_config(
        r#"
[[models]]
id = "YandexGPT-lite"
backend = "yandex"
model = "yandexgpt-lite"
context = "summary"
summary_sentences = 0
"#,
    );
    let err = match load_config(&path) {
        Ok(_) => panic!("summary model with zero sentences should be rejected"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("summary_sentences"));
}

#[test]
fn full_context_model_ignores_sentence_count() {
    let (_dir, path) = write_config(
        "[[models]]\nid = \"m\"\nbackend = \"chat\"\nmodel = \"x\"\nsummary_sentences = 0\n",
    );
    assert!(load_config(&path).is_ok());
}

#[test]
fn unknown_backend_is_a_parse_error() {
    let (_dir, path) = write_config("[[models]]\nid = \"m\"\nbackend = \"bard\"\nmodel = \"x\"\n");
    assert!(load_config(&path).is_err());
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(load_config(&dir.path().join("absent.toml")).is_err());
}

#[test]
fn runtime_home_override_is_honoured() {
    let paths = runtime_paths_with(|key| {
        (key == "GHOSTWRITER_HOME").then(|| "/srv/ghostwriter".to_owned())
    });
    let paths = match paths {
        Ok(paths) => paths,
        Err(err) => panic!("paths should resolve: {err}"),
    };
    assert_eq!(paths.config_file, std::path::Path::new("/srv/ghostwriter/config.toml"));
    assert_eq!(paths.env_file, std::path::Path::new("/srv/ghostwriter/.env"));
    assert_eq!(paths.logs_dir, std::path::Path::new("/srv/ghostwriter/logs"));
}
