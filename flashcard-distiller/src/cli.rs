///
/// This module implements the CLI interface for flashcard-distiller: command parsing,
/// argument handling and user-visible output.
///
/// All business logic (placement, sanitation, the distillation pipeline) lives in the
/// [`flashcard-distiller-core`] crate. This module is strictly CLI glue.
///
/// ## Commands
/// - `generate`: distill one note of a vault into its flashcard file
/// - `providers`: list configured providers and show which one would be used
/// - `settings`: apply and persist settings updates
///
/// Notices go to stdout; logs go to stderr.
///
/// [`flashcard-distiller-core`]: ../../flashcard-distiller-core/
use crate::load_config::{load_config, save_settings};
use crate::provider::HttpGenerationService;
use anyhow::Result;
use clap::{Parser, Subcommand};
use flashcard_distiller_core::config::SettingsHandle;
use flashcard_distiller_core::distill::Distiller;
use flashcard_distiller_core::generation::{select_provider, GenerationService};
use flashcard_distiller_core::store::FsContentStore;
use std::path::PathBuf;

/// CLI for flashcard-distiller: turn notes into spaced-repetition flashcards.
#[derive(Parser)]
#[clap(
    name = "flashcard-distiller",
    version,
    about = "Generate spaced-repetition flashcards for a note with an LLM and store them in a mirrored folder"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate flashcards for a note
    Generate {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Root directory of the vault
        #[clap(long)]
        vault: PathBuf,
        /// Note to distill, relative to the vault root
        #[clap(long)]
        note: String,
    },
    /// List the configured providers
    Providers {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Show settings, optionally updating them first
    Settings {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Setting to update, e.g. `--set flashcardRoot=Cards`. Repeatable.
        #[clap(long = "set", value_name = "KEY=VALUE")]
        updates: Vec<String>,
    },
}

/// Turns a user-typed note path into the vault's logical form.
pub fn normalize_note_path(note: &str) -> String {
    let note = note.trim().replace('\\', "/");
    let mut note = note.as_str();
    while let Some(rest) = note.strip_prefix("./") {
        note = rest;
    }
    note.trim_start_matches('/').to_string()
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Generate {
            config,
            vault,
            note,
        } => {
            let config = load_config(config)?;
            config.settings.trace_loaded();
            let note = normalize_note_path(&note);
            tracing::info!(command = "generate", vault = %vault.display(), note = %note, "Starting generation");

            let settings = SettingsHandle::new(config.settings);
            let store = FsContentStore::new(vault).with_active(note);
            let service = match HttpGenerationService::new(config.providers, config.default_provider)
            {
                Ok(service) => Some(service),
                Err(e) => {
                    tracing::error!(command = "generate", error = %e, "Generation service unavailable");
                    None
                }
            };

            let notice = Distiller::new(settings, store, service).run_for_active().await;
            println!("{notice}");
            if notice.is_failure() {
                anyhow::bail!("flashcard generation failed");
            }
            Ok(())
        }
        Commands::Providers { config } => {
            let config = load_config(config)?;
            let configured = config.settings.selected_provider_id.clone();
            let service = HttpGenerationService::new(config.providers, config.default_provider)
                .map_err(|e| anyhow::anyhow!("Generation service unavailable: {e}"))?;
            let providers = service
                .list_providers()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list providers: {e}"))?;
            let default = service.default_provider_id().await;
            let selected = select_provider(&configured, default.as_deref(), &providers)
                .map(|p| p.id.clone());

            if providers.is_empty() {
                println!("No providers configured.");
            }
            for provider in &providers {
                let marker = if selected.as_deref() == Some(provider.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {}\t{}", provider.id, provider.name);
            }
            tracing::info!(command = "providers", count = providers.len(), selected = ?selected, "Listed providers");
            Ok(())
        }
        Commands::Settings { config, updates } => {
            let loaded = load_config(&config)?;
            let mut settings = loaded.settings;
            for update in &updates {
                let (key, value) = update
                    .split_once('=')
                    .ok_or_else(|| anyhow::anyhow!("Expected KEY=VALUE, got `{update}`"))?;
                settings.apply_setting(key.trim(), value)?;
            }
            if !updates.is_empty() {
                save_settings(&config, &settings)?;
                tracing::info!(command = "settings", updates = updates.len(), "Settings updated");
            }
            print!("{}", serde_yaml::to_string(&settings)?);
            Ok(())
        }
    }
}
