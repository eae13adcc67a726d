//! High-level pipeline: turns one note into one flashcard artifact.
//!
//! This module provides the orchestration for a single distillation run:
//!   - Decides whether the note may be read at all (output root, excluded folders)
//!   - Reads the note and skips empty notes and notes that already are artifacts
//!   - Selects a provider and submits the prompt to the [`GenerationService`]
//!   - Extracts and sanitizes the response
//!   - Commits the artifact at its mirrored path, replacing any earlier one
//!
//! # Major Types
//! - [`Distiller`]: holds the settings handle and both collaborators
//! - [`DistillOutcome`]: `Done` or `Skipped`; failures are [`DistillError`]
//! - [`Notice`]: the single user-visible message produced per invocation
//!
//! # Error Handling
//! The artifact write is the last step, so a failure anywhere earlier leaves
//! any existing artifact untouched. [`Distiller::run_for_active`] converts
//! every outcome into a [`Notice`]; nothing propagates past it.
//!
//! # Concurrency
//! Runs on the same note are not serialized. Concurrent runs race on the final
//! write and the last one to finish wins.

use crate::config::{Configuration, SettingsHandle};
use crate::generation::{
    extract_text, select_provider, GenerationRequest, GenerationService, StreamAccumulator,
};
use crate::placement::{self, SkipReason};
use crate::sanitize::sanitize;
use crate::store::{is_text_note, ContentStore, StoreError};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistillOutcome {
    Done {
        source: String,
        destination: String,
        replaced_existing: bool,
    },
    Skipped(SkipReason),
}

#[derive(Debug, thiserror::Error)]
pub enum DistillError {
    #[error("generation service unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("no generation provider available")]
    NoProvider,
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("the model returned an empty response")]
    EmptyResponse,
    #[error("the model response was empty after cleanup")]
    EmptyAfterSanitize,
    #[error("could not read note: {0}")]
    ReadFailure(#[source] StoreError),
    #[error("could not write flashcards: {0}")]
    WriteFailure(#[source] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Failure,
}

/// A single human-readable message surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn unavailable(reason: &str) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: format!("Flashcard generation unavailable: {reason}"),
        }
    }

    pub fn from_result(source: &str, result: &Result<DistillOutcome, DistillError>) -> Self {
        match result {
            Ok(DistillOutcome::Done { destination, .. }) => Self {
                level: NoticeLevel::Success,
                message: format!("Flashcards for {source} saved to {destination}"),
            },
            Ok(DistillOutcome::Skipped(reason)) => Self {
                level: NoticeLevel::Info,
                message: format!("Skipped {source}: {reason}"),
            },
            Err(e) => Self {
                level: NoticeLevel::Failure,
                message: format!("Flashcard generation failed for {source}: {e}"),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        self.level == NoticeLevel::Failure
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// `tag line`, blank line, optional header and blank line, then the body.
pub fn compose_artifact(tag_line: &str, header: &str, body: &str) -> String {
    let header = header.trim();
    if header.is_empty() {
        format!("{tag_line}\n\n{body}")
    } else {
        format!("{tag_line}\n\n{header}\n\n{body}")
    }
}

pub struct Distiller<S, G> {
    settings: SettingsHandle,
    store: S,
    generation: Option<G>,
}

impl<S, G> Distiller<S, G>
where
    S: ContentStore,
    G: GenerationService,
{
    /// `generation` is `None` when the generation service could not be reached or set up.
    pub fn new(settings: SettingsHandle, store: S, generation: Option<G>) -> Self {
        Self {
            settings,
            store,
            generation,
        }
    }

    /// The "generate flashcards for active note" command.
    pub async fn run_for_active(&self) -> Notice {
        let Some(active) = self.store.active_item() else {
            info!("[DISTILL] No active note");
            return Notice::unavailable("no active note");
        };
        if !is_text_note(&active) {
            info!(path = %active, "[DISTILL] Active item is not a text note");
            return Notice::unavailable(&format!("{active} is not a text note"));
        }
        let result = self.distill(&active).await;
        if let Err(e) = &result {
            error!(source = %active, error = ?e, "[DISTILL][ERROR] Distillation failed");
        }
        Notice::from_result(&active, &result)
    }

    /// Run one distillation for `source_path`.
    ///
    /// The settings snapshot is taken once at the start and used throughout.
    pub async fn distill(&self, source_path: &str) -> Result<DistillOutcome, DistillError> {
        let config = self.settings.snapshot().normalized();
        info!(source = %source_path, "[DISTILL] Starting distillation");

        if let Some(reason) = placement::skip_reason(source_path, &config) {
            info!(source = %source_path, %reason, "[DISTILL] Skipping note");
            return Ok(DistillOutcome::Skipped(reason));
        }

        let content = self
            .store
            .read(source_path)
            .await
            .map_err(DistillError::ReadFailure)?;
        if content.trim().is_empty() {
            info!(source = %source_path, "[DISTILL] Note is empty");
            return Ok(DistillOutcome::Skipped(SkipReason::EmptySource));
        }
        if content
            .trim_start()
            .starts_with(&placement::tag_marker(&config))
        {
            info!(source = %source_path, "[DISTILL] Note already carries the flashcard tag");
            return Ok(DistillOutcome::Skipped(SkipReason::AlreadyGenerated));
        }

        let sanitized = self.generate(source_path, &content, &config).await?;
        self.commit(source_path, &sanitized, &config).await
    }

    async fn generate(
        &self,
        source_path: &str,
        content: &str,
        config: &Configuration,
    ) -> Result<String, DistillError> {
        let service = self.generation.as_ref().ok_or_else(|| {
            DistillError::ProviderUnavailable("generation service is not configured".into())
        })?;

        let providers = service.list_providers().await.map_err(|e| {
            error!(error = ?e, "[DISTILL][ERROR] Could not list providers");
            DistillError::ProviderUnavailable(e.to_string())
        })?;
        let service_default = service.default_provider_id().await;
        let provider = select_provider(
            &config.selected_provider_id,
            service_default.as_deref(),
            &providers,
        )
        .ok_or(DistillError::NoProvider)?;
        info!(provider_id = %provider.id, provider_name = %provider.name, "[DISTILL] Selected provider");

        let request = GenerationRequest {
            provider_id: provider.id.clone(),
            prompt_text: config.prompt_text.clone(),
            source_content: content.to_string(),
        };
        let accumulator = StreamAccumulator::new();
        let raw = service
            .execute(request, Some(accumulator.clone()))
            .await
            .map_err(|e| {
                error!(source = %source_path, error = ?e, "[DISTILL][ERROR] Generation request failed");
                DistillError::Generation(e.to_string())
            })?;
        debug!(?raw, "[DISTILL] Raw generation result");

        let text = extract_text(&raw, accumulator.latest().as_deref())
            .ok_or(DistillError::EmptyResponse)?;
        let sanitized = sanitize(&text, &config.tag_label);
        if sanitized.is_empty() {
            warn!(source = %source_path, "[DISTILL] Response held only reasoning or tag noise");
            return Err(DistillError::EmptyAfterSanitize);
        }
        Ok(sanitized)
    }

    async fn commit(
        &self,
        source_path: &str,
        body: &str,
        config: &Configuration,
    ) -> Result<DistillOutcome, DistillError> {
        let destination = placement::destination_path(source_path, config);
        for folder in placement::parent_folders(&destination) {
            match self.store.create_folder(&folder).await {
                Ok(()) => {}
                Err(StoreError::AlreadyExists(_)) => {
                    debug!(folder = %folder, "[DISTILL] Folder already exists");
                }
                Err(e) => return Err(DistillError::WriteFailure(e)),
            }
        }

        let artifact = compose_artifact(
            &placement::tag_line(source_path, config),
            &config.header_text,
            body,
        );
        let mut replaced_existing = self
            .store
            .exists(&destination)
            .await
            .map_err(DistillError::WriteFailure)?;
        if replaced_existing {
            self.store
                .overwrite(&destination, &artifact)
                .await
                .map_err(DistillError::WriteFailure)?;
        } else {
            match self.store.create(&destination, &artifact).await {
                Ok(()) => {}
                // Another run created it after our existence check; last writer wins.
                Err(StoreError::AlreadyExists(_)) => {
                    debug!(destination = %destination, "[DISTILL] Artifact appeared concurrently, overwriting");
                    self.store
                        .overwrite(&destination, &artifact)
                        .await
                        .map_err(DistillError::WriteFailure)?;
                    replaced_existing = true;
                }
                Err(e) => return Err(DistillError::WriteFailure(e)),
            }
        }

        info!(
            source = %source_path,
            destination = %destination,
            replaced_existing,
            "[DISTILL] Flashcards saved"
        );
        Ok(DistillOutcome::Done {
            source: source_path.to_string(),
            destination,
            replaced_existing,
        })
    }
}
