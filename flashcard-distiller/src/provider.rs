#![doc = "Generation-service integration for the CLI: bridges the core `GenerationService` trait to OpenAI-compatible chat-completion endpoints."]
//
//! # Generation Service Integration (CLI <-> Core)
//!
//! This module wires the [`GenerationService`] trait from
//! [`flashcard_distiller_core::generation`] to real HTTP endpoints.
//!
//! - Every entry of the config file's `providers:` list is one provider.
//! - Requests go to `{base_url}/chat/completions`, so anything speaking the
//!   OpenAI chat API works: OpenAI itself, Ollama, LM Studio, vLLM, llama.cpp.
//! - Streaming providers are read as server-sent events; each cumulative text
//!   is reported to the caller's [`StreamAccumulator`].

use async_trait::async_trait;
use flashcard_distiller_core::generation::{
    GenerationError, GenerationRequest, GenerationResult, GenerationService, ProviderInfo,
    StreamAccumulator,
};
use futures::StreamExt;
use serde_json::{json, Value};

use crate::load_config::{ApiKey, ProviderConfig};

/// Incremental parser for an OpenAI-style server-sent event stream.
///
/// Bytes may arrive split anywhere, including inside a UTF-8 sequence, so
/// only complete lines are decoded.
#[derive(Debug, Default)]
pub struct SseAccumulator {
    pending: Vec<u8>,
    text: String,
    done: bool,
}

impl SseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk. Returns `true` if the chunk added text.
    pub fn push(&mut self, chunk: &[u8]) -> bool {
        self.pending.extend_from_slice(chunk);
        let mut grew = false;
        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            grew |= self.handle_line(&String::from_utf8_lossy(&line));
        }
        grew
    }

    /// Processes whatever is left once the stream ends without a trailing newline.
    pub fn finish(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        let line = std::mem::take(&mut self.pending);
        self.handle_line(&String::from_utf8_lossy(&line))
    }

    fn handle_line(&mut self, line: &str) -> bool {
        if self.done {
            return false;
        }
        let Some(payload) = line.trim().strip_prefix("data:") else {
            return false;
        };
        let payload = payload.trim();
        if payload == "[DONE]" {
            self.done = true;
            return false;
        }
        let Ok(event) = serde_json::from_str::<Value>(payload) else {
            tracing::debug!(payload, "Ignoring unparsable stream event");
            return false;
        };
        match event
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
        {
            Some(delta) if !delta.is_empty() => {
                self.text.push_str(delta);
                true
            }
            _ => false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

pub struct HttpGenerationService {
    client: reqwest::Client,
    providers: Vec<ProviderConfig>,
    default_provider: Option<String>,
}

impl HttpGenerationService {
    pub fn new(
        providers: Vec<ProviderConfig>,
        default_provider: Option<String>,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("flashcard-distiller/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build HTTP client");
                e
            })?;
        Ok(Self::with_client(client, providers, default_provider))
    }

    pub fn with_client(
        client: reqwest::Client,
        providers: Vec<ProviderConfig>,
        default_provider: Option<String>,
    ) -> Self {
        tracing::info!(
            providers = providers.len(),
            default_provider = default_provider.as_deref().unwrap_or(""),
            "Initialized HttpGenerationService"
        );
        Self {
            client,
            providers,
            default_provider,
        }
    }

    fn provider(&self, id: &str) -> Result<&ProviderConfig, GenerationError> {
        self.providers
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| format!("unknown provider `{id}`").into())
    }

    async fn read_stream(
        &self,
        response: reqwest::Response,
        progress: Option<&StreamAccumulator>,
    ) -> Result<String, GenerationError> {
        let mut parser = SseAccumulator::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            if parser.push(&chunk) {
                if let Some(progress) = progress {
                    progress.update(parser.text());
                }
            }
            if parser.is_done() {
                break;
            }
        }
        if parser.finish() {
            if let Some(progress) = progress {
                progress.update(parser.text());
            }
        }
        Ok(parser.text().to_string())
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn list_providers(&self) -> Result<Vec<ProviderInfo>, GenerationError> {
        Ok(self
            .providers
            .iter()
            .map(|p| ProviderInfo {
                id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect())
    }

    async fn default_provider_id(&self) -> Option<String> {
        self.default_provider.clone()
    }

    async fn execute(
        &self,
        request: GenerationRequest,
        progress: Option<StreamAccumulator>,
    ) -> Result<GenerationResult, GenerationError> {
        let provider = self.provider(&request.provider_id)?;
        let url = format!(
            "{}/chat/completions",
            provider.base_url.trim_end_matches('/')
        );
        tracing::info!(
            provider_id = %provider.id,
            model = %provider.model,
            url = %url,
            stream = provider.stream,
            "Submitting generation request"
        );

        let body = json!({
            "model": provider.model,
            "messages": [{ "role": "user", "content": request.prompt() }],
            "stream": provider.stream,
        });
        let mut http = self.client.post(&url).json(&body);
        match &provider.api_key {
            ApiKey::Resolved(key) => http = http.bearer_auth(key),
            ApiKey::Missing(var) => {
                tracing::error!(provider_id = %provider.id, var = %var, "Provider API key missing");
                return Err(format!(
                    "{var} environment variable not set (required by provider `{}`)",
                    provider.id
                )
                .into());
            }
            ApiKey::NotRequired => {}
        }

        let response = http.send().await.map_err(|e| {
            tracing::error!(error = ?e, url = %url, "Failed to reach provider");
            e
        })?;
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            tracing::error!(status = %status, url = %url, "Provider returned error. Response body: {text}");
            return Err(format!("provider `{}` returned {status}: {text}", provider.id).into());
        }

        if provider.stream {
            let text = self.read_stream(response, progress.as_ref()).await?;
            tracing::info!(len = text.len(), "Streamed generation complete");
            Ok(GenerationResult::Streamed(text))
        } else {
            let text = response.text().await?;
            tracing::info!(len = text.len(), "Generation complete");
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => Ok(GenerationResult::from(value)),
                Err(_) => {
                    tracing::debug!("Response body is not JSON, using it as plain text");
                    Ok(GenerationResult::Plain(text))
                }
            }
        }
    }
}
