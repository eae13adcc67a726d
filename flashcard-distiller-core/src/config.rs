use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

pub const DEFAULT_FLASHCARD_ROOT: &str = "Flashcards";
pub const DEFAULT_FLASHCARD_TAG: &str = "flashcards";
pub const DEFAULT_EXCLUDED_FOLDER: &str = "Templates";

/// Instruction text sent ahead of the note content when no custom prompt is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an assistant that turns study notes into spaced-repetition flashcards.

Read the note below and write flashcards covering its key facts, definitions and ideas.

Rules:
- One flashcard per line, formatted as `Front :: Back`.
- Keep each side short and self-contained; do not refer to \"the note\".
- Use the language the note is written in.
- Output only the flashcards: no headings, no tags, no commentary.";

/// User-facing settings, persisted by the host as a flat key-value blob.
///
/// Every key is optional on input: anything missing falls back to [`Configuration::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    #[serde(rename = "flashcardRoot")]
    pub output_root: String,
    /// Tag label without the leading `#` and trailing `/`.
    #[serde(rename = "flashcardTag")]
    pub tag_label: String,
    /// Empty means auto-select.
    #[serde(rename = "selectedProviderId")]
    pub selected_provider_id: String,
    #[serde(rename = "systemPrompt")]
    pub prompt_text: String,
    #[serde(rename = "excludedFolders")]
    pub excluded_paths: Vec<String>,
    #[serde(rename = "fileHeader")]
    pub header_text: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            output_root: DEFAULT_FLASHCARD_ROOT.to_string(),
            tag_label: DEFAULT_FLASHCARD_TAG.to_string(),
            selected_provider_id: String::new(),
            prompt_text: DEFAULT_SYSTEM_PROMPT.to_string(),
            excluded_paths: vec![DEFAULT_EXCLUDED_FOLDER.to_string()],
            header_text: String::new(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown setting `{0}`")]
    UnknownKey(String),
}

impl Configuration {
    /// Returns a copy with whitespace, `#` and trailing slashes cleaned off the
    /// path-like and tag settings. Empty excluded entries are dropped.
    pub fn normalized(&self) -> Self {
        let tag_label = self
            .tag_label
            .trim()
            .trim_start_matches('#')
            .trim_end_matches('/')
            .to_string();
        Self {
            output_root: crate::placement::normalize_root(&self.output_root).to_string(),
            tag_label,
            selected_provider_id: self.selected_provider_id.trim().to_string(),
            prompt_text: self.prompt_text.clone(),
            excluded_paths: self
                .excluded_paths
                .iter()
                .map(|p| crate::placement::normalize_root(p).to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            header_text: self.header_text.clone(),
        }
    }

    /// Applies a single settings update, addressed by its persisted key.
    pub fn apply_setting(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "flashcardRoot" => self.output_root = value.to_string(),
            "flashcardTag" => self.tag_label = value.to_string(),
            "selectedProviderId" => self.selected_provider_id = value.to_string(),
            "systemPrompt" => self.prompt_text = value.to_string(),
            "fileHeader" => self.header_text = value.to_string(),
            "excludedFolders" => {
                self.excluded_paths = value
                    .split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect();
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        info!(key, "Applied settings update");
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            output_root = %self.output_root,
            tag_label = %self.tag_label,
            selected_provider_id = %self.selected_provider_id,
            excluded_count = self.excluded_paths.len(),
            has_header = !self.header_text.trim().is_empty(),
            "Loaded Configuration"
        );
        debug!(?self, "Configuration loaded (full debug)");
    }
}

/// Process-wide holder of the current settings snapshot.
///
/// Settings are never mutated in place: every change replaces the whole
/// snapshot, so a distillation that already took its snapshot keeps seeing it.
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    current: Arc<RwLock<Arc<Configuration>>>,
}

impl SettingsHandle {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(configuration))),
        }
    }

    pub fn snapshot(&self) -> Arc<Configuration> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn replace(&self, configuration: Configuration) {
        let next = Arc::new(configuration);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
        info!("Settings snapshot replaced");
    }
}
