use flashcard_distiller::load_config::{load_config, save_settings, ApiKey};
use flashcard_distiller_core::config::{Configuration, DEFAULT_SYSTEM_PROMPT};
use serial_test::serial;
use std::env;
use std::fs::{read_to_string, write};
use tempfile::NamedTempFile;

/// A partial settings blob is merged over the defaults and providers are loaded as given.
#[tokio::test]
#[serial]
async fn test_load_config_merges_settings_over_defaults() {
    let config_yaml = r#"
settings:
  flashcardRoot: Cards/
  excludedFolders:
    - Templates
    - Daily
providers:
  - id: ollama
    base_url: http://localhost:11434/v1
    model: qwen3:8b
    stream: true
default_provider: ollama
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.settings.output_root, "Cards/");
    assert_eq!(config.settings.tag_label, "flashcards");
    assert_eq!(config.settings.prompt_text, DEFAULT_SYSTEM_PROMPT);
    assert_eq!(
        config.settings.excluded_paths,
        vec!["Templates".to_string(), "Daily".to_string()]
    );
    assert_eq!(config.default_provider.as_deref(), Some("ollama"));
    assert_eq!(config.providers.len(), 1);
    let provider = &config.providers[0];
    assert_eq!(provider.name, "ollama", "name falls back to id");
    assert!(provider.stream);
    assert_eq!(provider.api_key, ApiKey::NotRequired);
}

/// An empty file yields the default settings and no providers.
#[tokio::test]
#[serial]
async fn test_load_config_empty_file_uses_defaults() {
    let config_file = NamedTempFile::new().expect("temp file");
    let config = load_config(config_file.path()).expect("Empty config should load");
    assert_eq!(config.settings, Configuration::default());
    assert!(config.providers.is_empty());
    assert_eq!(config.default_provider, None);
}

/// Provider secrets are injected from the variable named by `api_key_env`; a missing
/// variable is recorded on the provider instead of failing the load.
#[tokio::test]
#[serial]
async fn test_load_config_injects_provider_key_from_env() {
    let config_yaml = r#"
providers:
  - id: openai
    name: OpenAI
    base_url: https://api.openai.com/v1
    model: gpt-4o-mini
    api_key_env: FLASHCARD_TEST_OPENAI_KEY
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    env::set_var("FLASHCARD_TEST_OPENAI_KEY", "top-secret-test-key");
    let config = load_config(config_file.path()).expect("Config should load");
    assert_eq!(
        config.providers[0].api_key,
        ApiKey::Resolved("top-secret-test-key".into())
    );

    env::remove_var("FLASHCARD_TEST_OPENAI_KEY");
    let config = load_config(config_file.path()).expect("Missing key must not block loading");
    assert_eq!(
        config.providers[0].api_key,
        ApiKey::Missing("FLASHCARD_TEST_OPENAI_KEY".into())
    );
}

/// If the config file is not valid YAML, load_config errors and reports as such.
#[tokio::test]
#[serial]
async fn test_load_config_errors_for_invalid_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"not-yaml: [:::").unwrap();

    let err = load_config(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[tokio::test]
#[serial]
async fn test_load_config_errors_for_missing_file() {
    let err = load_config("/definitely/not/here/flashcards.yaml").unwrap_err();
    assert!(
        err.to_string().contains("Failed to read config file"),
        "got: {err}"
    );
}

/// Saving settings rewrites only the `settings:` section.
#[tokio::test]
#[serial]
async fn test_save_settings_keeps_providers() {
    let config_yaml = r#"
settings:
  flashcardRoot: Flashcards
providers:
  - id: ollama
    base_url: http://localhost:11434/v1
    model: qwen3:8b
default_provider: ollama
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let mut settings = load_config(config_file.path()).unwrap().settings;
    settings.apply_setting("flashcardRoot", "Cards").unwrap();
    settings.apply_setting("fileHeader", "Review weekly").unwrap();
    save_settings(config_file.path(), &settings).expect("Settings should save");

    let reloaded = load_config(config_file.path()).expect("Saved config should load");
    assert_eq!(reloaded.settings, settings);
    assert_eq!(reloaded.providers.len(), 1);
    assert_eq!(reloaded.default_provider.as_deref(), Some("ollama"));

    let raw = read_to_string(config_file.path()).unwrap();
    assert!(raw.contains("flashcardRoot: Cards"), "got: {raw}");
}
