#![allow(unused)]

//! # generation: contract with the external text-generation service
//!
//! The distillation pipeline never talks to a model directly. It goes through the
//! [`GenerationService`] trait, which exposes the providers the service knows about,
//! the service's own default provider, and a single `execute` call.
//!
//! ## Response shapes
//! Services disagree on what `execute` returns: a plain string, text accumulated
//! from a stream, or a JSON object with the text under some field. All of them are
//! carried by [`GenerationResult`] and resolved by [`extract_text`].
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, exported under the `test-export-mocks` feature.

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub type GenerationError = Box<dyn std::error::Error + Send + Sync>;

/// A provider the generation service can run a request against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub provider_id: String,
    pub prompt_text: String,
    pub source_content: String,
}

impl GenerationRequest {
    /// The text actually sent to the model: instructions, blank line, note.
    pub fn prompt(&self) -> String {
        format!("{}\n\n{}", self.prompt_text, self.source_content)
    }
}

/// Holds the latest cumulative text reported by a streaming call.
///
/// Cloning shares the buffer, so the service can write while the caller keeps a handle.
#[derive(Debug, Clone, Default)]
pub struct StreamAccumulator {
    latest: Arc<Mutex<Option<String>>>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, full_text: &str) {
        match self.latest.lock() {
            Ok(mut guard) => *guard = Some(full_text.to_string()),
            Err(poisoned) => *poisoned.into_inner() = Some(full_text.to_string()),
        }
    }

    pub fn latest(&self) -> Option<String> {
        match self.latest.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Whatever the service handed back from `execute`.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Plain(String),
    Streamed(String),
    Structured(Map<String, Value>),
    Opaque(Value),
    Empty,
}

impl From<Value> for GenerationResult {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => GenerationResult::Empty,
            Value::String(s) => GenerationResult::Plain(s),
            Value::Object(map) => GenerationResult::Structured(map),
            other => GenerationResult::Opaque(other),
        }
    }
}

/// Fields searched, in order, on a structured result.
pub const TEXT_FIELDS: &[&str] = &[
    "text",
    "content",
    "response",
    "output",
    "result",
    "message",
    "answer",
    "completion",
];

fn non_empty(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn find_text_field(map: &Map<String, Value>) -> Option<String> {
    let direct = TEXT_FIELDS
        .iter()
        .filter_map(|field| map.get(*field))
        .find_map(|value| value.as_str().and_then(non_empty));
    if direct.is_some() {
        return direct;
    }
    // OpenAI-style bodies keep the text one level down.
    let choice = map.get("choices")?.get(0)?;
    choice
        .pointer("/message/content")
        .or_else(|| choice.get("text"))
        .and_then(Value::as_str)
        .and_then(non_empty)
}

/// Resolves a raw result to text.
///
/// Precedence: non-empty plain/streamed string, then the accumulated stream
/// buffer, then a known text field of a structured result, then a JSON dump of
/// that structure, then any other value stringified. Returns `None` when
/// nothing non-empty is left.
pub fn extract_text(result: &GenerationResult, accumulated: Option<&str>) -> Option<String> {
    let direct = match result {
        GenerationResult::Plain(s) | GenerationResult::Streamed(s) => non_empty(s),
        _ => None,
    };
    if direct.is_some() {
        return direct;
    }
    if let Some(buffer) = accumulated.and_then(non_empty) {
        debug!(len = buffer.len(), "Using accumulated stream buffer as response");
        return Some(buffer);
    }
    let extracted = match result {
        GenerationResult::Structured(map) => find_text_field(map).or_else(|| {
            warn!("No text field in structured response, falling back to a full dump");
            serde_json::to_string_pretty(map).ok()
        }),
        GenerationResult::Opaque(value) => Some(value.to_string()),
        _ => None,
    };
    extracted.and_then(|text| non_empty(&text))
}

/// Picks the provider to run against.
///
/// The configured id wins if it is still available, then the service default,
/// then the first provider listed.
pub fn select_provider<'a>(
    configured: &str,
    service_default: Option<&str>,
    available: &'a [ProviderInfo],
) -> Option<&'a ProviderInfo> {
    let by_id = move |id: &str| available.iter().find(|p| p.id == id);
    let configured = configured.trim();
    if !configured.is_empty() {
        if let Some(provider) = by_id(configured) {
            return Some(provider);
        }
        warn!(provider_id = configured, "Configured provider is no longer available");
    }
    service_default
        .and_then(by_id)
        .or_else(|| available.first())
}

/// Trait for the external service that turns a prompt into text.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// All providers currently available. An error means the service itself is unreachable.
    async fn list_providers(&self) -> Result<Vec<ProviderInfo>, GenerationError>;

    /// The service's own notion of a main provider, if it has one.
    async fn default_provider_id(&self) -> Option<String>;

    /// Run one request. Streaming implementations report cumulative text through `progress`.
    async fn execute(
        &self,
        request: GenerationRequest,
        progress: Option<StreamAccumulator>,
    ) -> Result<GenerationResult, GenerationError>;
}
