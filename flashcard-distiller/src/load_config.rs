/// `load_config` module: Loads the YAML config file (settings blob plus provider list) and
/// injects provider secrets from the environment.
///
/// # Responsibilities
/// - Parse the user-supplied YAML into [`CliConfig`]
/// - Merge the `settings:` blob over the built-in defaults
/// - Resolve each provider's `api_key_env` to the actual key. A missing variable is
///   recorded on the provider and only fails requests sent to that provider.
/// - Persist settings updates back into the same file, leaving `providers:` untouched
///
/// # Errors
/// All errors use `anyhow::Error` for context-rich diagnostics, surfaced at the CLI boundary.
use anyhow::{Context, Result};
use flashcard_distiller_core::config::Configuration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub settings: Configuration,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// The generation service's own default provider id.
    #[serde(default)]
    pub default_provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// OpenAI-compatible API root, e.g. `http://localhost:11434/v1`.
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key, if the provider needs one.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub stream: bool,
    #[serde(skip)]
    pub api_key: ApiKey,
}

/// Outcome of resolving a provider's `api_key_env`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ApiKey {
    /// The provider declares no `api_key_env`.
    #[default]
    NotRequired,
    Resolved(String),
    /// The named variable is not set.
    Missing(String),
}

/// Loads the YAML config file and injects secrets for providers that declare `api_key_env`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: CliConfig = if config_content.trim().is_empty() {
        warn!(config_path = ?path_ref, "Config file is empty, using defaults");
        CliConfig::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    for provider in &mut config.providers {
        if provider.name.trim().is_empty() {
            provider.name = provider.id.clone();
        }
        if let Some(var) = &provider.api_key_env {
            match std::env::var(var) {
                Ok(key) => {
                    info!(provider_id = %provider.id, var = %var, "Provider API key found in env");
                    provider.api_key = ApiKey::Resolved(key);
                }
                Err(e) => {
                    warn!(error = ?e, provider_id = %provider.id, var = %var, "Provider API key missing");
                    provider.api_key = ApiKey::Missing(var.clone());
                }
            }
        }
    }

    info!(
        providers = config.providers.len(),
        default_provider = config.default_provider.as_deref().unwrap_or(""),
        "Config loaded and merged successfully"
    );
    Ok(config)
}

/// Writes `settings` into the `settings:` section of the config file at `path`.
///
/// Other top-level sections are kept as they are. A missing file is created.
pub fn save_settings<P: AsRef<Path>>(path: P, settings: &Configuration) -> Result<()> {
    let path_ref = path.as_ref();
    let mut document = if path_ref.exists() {
        let content = fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;
        if content.trim().is_empty() {
            serde_yaml::Mapping::new()
        } else {
            serde_yaml::from_str::<serde_yaml::Mapping>(&content)
                .context("Failed to parse config YAML")?
        }
    } else {
        serde_yaml::Mapping::new()
    };

    let settings_value = serde_yaml::to_value(settings).context("Failed to serialize settings")?;
    document.insert(serde_yaml::Value::from("settings"), settings_value);

    let rendered = serde_yaml::to_string(&document).context("Failed to render config YAML")?;
    fs::write(path_ref, rendered)
        .with_context(|| format!("Failed to write config file {}", path_ref.display()))?;
    info!(config_path = ?path_ref, "Settings persisted");
    Ok(())
}
