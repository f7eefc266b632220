//! Translation clients: one paragraph in, one completion call, text out.
//!
//! The pipeline only sees the [`TranslationClient`] trait, so tests drive it
//! with a deterministic fake and production picks a backend at start-up via
//! [`build_client`]:
//!
//! * [`GroqClient`] — Groq's OpenAI-compatible chat-completions endpoint over
//!   `reqwest`. The default backend.
//! * [`ProviderClient`] — any `edgequake_llm` provider (OpenAI, Anthropic,
//!   Gemini, Ollama, …).
//!
//! Each call is exactly one request: no retry, no backoff and no timeout
//! beyond the transport default. Any failure of the remote call, whatever
//! its cause, surfaces as [`TranslateError::TranslationService`].

use crate::config::{Credential, TranslatorConfig};
use crate::error::TranslateError;
use crate::prompts::user_message;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// A single text-to-text translation call.
#[async_trait]
pub trait TranslationClient: Send + Sync {
    /// Translate `text` under the system `instruction`.
    ///
    /// Returns the model's reply with surrounding whitespace trimmed. Never
    /// returns partial output.
    async fn translate(&self, text: &str, instruction: &str) -> Result<String, TranslateError>;

    /// Backend name used in logs and error messages.
    fn name(&self) -> &str;
}

/// Build the client selected by `config`.
///
/// 1. A pre-built provider (`config.provider`) is wrapped as-is.
/// 2. Provider `"groq"` builds a [`GroqClient`]. A missing credential does
///    not fail here; it fails every call instead.
/// 3. Any other name goes through `ProviderFactory`, which reads that
///    provider's API key from the environment.
pub fn build_client(config: &TranslatorConfig) -> Result<Arc<dyn TranslationClient>, TranslateError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(ProviderClient::new(
            Arc::clone(provider),
            config.provider_name.clone(),
            config,
        )));
    }

    if config.uses_groq() {
        return Ok(Arc::new(GroqClient::new(config)?));
    }

    let provider = ProviderFactory::create_llm_provider(&config.provider_name, &config.model)
        .map_err(|e| TranslateError::Configuration {
            reason: format!("LLM provider '{}' is not configured: {e}", config.provider_name),
        })?;
    Ok(Arc::new(ProviderClient::new(
        provider,
        config.provider_name.clone(),
        config,
    )))
}

// ── Groq ─────────────────────────────────────────────────────────────────

/// Chat-completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChatTurn<'a> {
    role: &'static str,
    content: std::borrow::Cow<'a, str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// Client for Groq's OpenAI-compatible chat-completions API.
pub struct GroqClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    credential: Credential,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
}

impl GroqClient {
    pub fn new(config: &TranslatorConfig) -> Result<Self, TranslateError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TranslateError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url),
            model: config.model.clone(),
            credential: config.credential.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, text: &'a str, instruction: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatTurn {
                    role: "system",
                    content: instruction.into(),
                },
                ChatTurn {
                    role: "user",
                    content: user_message(text).into(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl TranslationClient for GroqClient {
    async fn translate(&self, text: &str, instruction: &str) -> Result<String, TranslateError> {
        let api_key = self.credential.require()?;
        let start = Instant::now();

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&self.request_body(text, instruction))
            .send()
            .await
            .map_err(|e| {
                warn!("Groq request failed: {}", e);
                TranslateError::service("groq", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            warn!("Groq API error ({}): {}", status, body);
            return Err(TranslateError::service("groq", format!("HTTP {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::service("groq", format!("malformed response: {e}")))?;

        if let Some(ref usage) = parsed.usage {
            debug!(
                "Groq: {} input tokens, {} output tokens, {:?}",
                usage.prompt_tokens,
                usage.completion_tokens,
                start.elapsed()
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| TranslateError::service("groq", "response contained no choices"))
    }

    fn name(&self) -> &str {
        "groq"
    }
}

// ── edgequake-llm providers ──────────────────────────────────────────────

/// Adapter from an `edgequake_llm` provider to [`TranslationClient`].
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    name: String,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, name: String, config: &TranslatorConfig) -> Self {
        Self {
            provider,
            name,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            ..Default::default()
        }
    }
}

#[async_trait]
impl TranslationClient for ProviderClient {
    async fn translate(&self, text: &str, instruction: &str) -> Result<String, TranslateError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(instruction),
            ChatMessage::user(user_message(text)),
        ];

        let response = self
            .provider
            .chat(&messages, Some(&self.options()))
            .await
            .map_err(|e| {
                warn!("{} request failed: {}", self.name, e);
                TranslateError::service(self.name.as_str(), e)
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.name,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content.trim().to_string())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
