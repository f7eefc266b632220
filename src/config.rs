//! Configuration types for document translation.
//!
//! Two layers:
//!
//! * [`FileConfig`] mirrors the on-disk `config.toml` and is read once at
//!   start-up. Every section and field is optional so a partial file still
//!   parses; what is missing falls back to documented defaults.
//! * [`TranslatorConfig`] is the validated in-memory value handed to the
//!   translation client. It is immutable once built and cheap to clone, so
//!   the HTTP service shares one instance across all requests.
//!
//! The credential is resolved when the config is built, never per call. A
//! missing key does not stop the service from starting; it is recorded as
//! [`Credential::Missing`] and every translation attempt then fails with
//! [`TranslateError::Configuration`] before any network I/O.

use crate::error::TranslateError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Default Groq chat model.
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Default Groq OpenAI-compatible API root.
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Backend name that selects the built-in Groq client.
pub const GROQ_PROVIDER: &str = "groq";

const MISSING_KEY_REASON: &str = "Groq API key not found or config.toml is missing.";

// ── Direction ────────────────────────────────────────────────────────────

/// Which language pair governs a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Direction {
    /// Arabic source, English output.
    #[serde(rename = "ar-to-en")]
    #[cfg_attr(feature = "cli", value(name = "ar-to-en"))]
    ArabicToEnglish,
    /// English source, Arabic output.
    #[serde(rename = "en-to-ar")]
    #[cfg_attr(feature = "cli", value(name = "en-to-ar"))]
    EnglishToArabic,
}

impl Direction {
    /// Wire form used by the CLI and the HTTP form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ArabicToEnglish => "ar-to-en",
            Direction::EnglishToArabic => "en-to-ar",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ar-to-en" => Ok(Direction::ArabicToEnglish),
            "en-to-ar" => Ok(Direction::EnglishToArabic),
            other => Err(TranslateError::InvalidRequest(format!(
                "Invalid direction '{other}'. Expected 'ar-to-en' or 'en-to-ar'."
            ))),
        }
    }
}

// ── Credential ───────────────────────────────────────────────────────────

/// The Groq API key, or the reason it could not be found.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Present(String),
    Missing { reason: String },
}

impl Credential {
    /// Build from an optional key; blank keys count as missing.
    pub fn from_option(key: Option<String>) -> Self {
        match key {
            Some(k) if !k.trim().is_empty() => Credential::Present(k.trim().to_string()),
            _ => Credential::Missing {
                reason: MISSING_KEY_REASON.to_string(),
            },
        }
    }

    /// Borrow the key or fail with a configuration error.
    pub fn require(&self) -> Result<&str, TranslateError> {
        match self {
            Credential::Present(k) => Ok(k),
            Credential::Missing { reason } => Err(TranslateError::Configuration {
                reason: reason.clone(),
            }),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Credential::Present(_))
    }
}

impl Default for Credential {
    fn default() -> Self {
        Credential::from_option(None)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Present(_) => f.write_str("Present(<redacted>)"),
            Credential::Missing { reason } => {
                f.debug_struct("Missing").field("reason", reason).finish()
            }
        }
    }
}

// ── File configuration ───────────────────────────────────────────────────

/// On-disk configuration (`config.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub groq: GroqSection,
    pub translation: TranslationSection,
    pub server: ServerSection,
}

/// `[groq]`
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroqSection {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl fmt::Debug for GroqSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqSection")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// `[translation]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TranslationSection {
    /// `"groq"` or any edgequake-llm provider name.
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

/// `[server]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Directory uploads are staged in while they are being translated.
    pub staging_dir: PathBuf,
    pub max_upload_mb: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            staging_dir: PathBuf::from("temp"),
            max_upload_mb: 25,
        }
    }
}

impl FileConfig {
    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TranslateError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| TranslateError::Configuration {
            reason: format!("cannot read '{}': {e}", path.display()),
        })?;
        Self::from_toml_str(&raw).map_err(|e| match e {
            TranslateError::Configuration { reason } => TranslateError::Configuration {
                reason: format!("'{}': {reason}", path.display()),
            },
            other => other,
        })
    }

    /// Parse TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, TranslateError> {
        toml::from_str(raw).map_err(|e| TranslateError::Configuration {
            reason: format!("malformed config: {e}"),
        })
    }

    /// Resolve the Groq credential held by this file.
    pub fn credential(&self) -> Credential {
        Credential::from_option(self.groq.api_key.clone())
    }
}

// ── Translator configuration ─────────────────────────────────────────────

/// Validated configuration for a translation client.
///
/// Built via [`TranslatorConfig::builder()`] or from a [`FileConfig`].
///
/// # Example
/// ```rust
/// use docx_translate::TranslatorConfig;
///
/// let config = TranslatorConfig::builder()
///     .api_key("gsk_test")
///     .temperature(0.2)
///     .build()
///     .unwrap();
/// assert!(config.credential.is_present());
/// ```
#[derive(Clone)]
pub struct TranslatorConfig {
    /// Backend name. `"groq"` selects the built-in Groq client; anything else
    /// is resolved through `edgequake_llm::ProviderFactory`.
    pub provider_name: String,

    /// Model identifier. Default: `llama-3.3-70b-versatile` for Groq.
    pub model: String,

    /// Groq API root. Default: [`DEFAULT_GROQ_BASE_URL`].
    pub base_url: String,

    /// Groq API key, resolved at start-up.
    pub credential: Credential,

    /// Sampling temperature. `None` leaves the provider default.
    pub temperature: Option<f32>,

    /// Maximum output tokens per paragraph. `None` leaves the provider default.
    pub max_tokens: Option<usize>,

    /// Pre-constructed provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Optional per-paragraph progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            provider_name: GROQ_PROVIDER.to_string(),
            model: DEFAULT_GROQ_MODEL.to_string(),
            base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            credential: Credential::default(),
            temperature: None,
            max_tokens: None,
            provider: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for TranslatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatorConfig")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("credential", &self.credential)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl TranslatorConfig {
    /// Create a new builder for `TranslatorConfig`.
    pub fn builder() -> TranslatorConfigBuilder {
        TranslatorConfigBuilder {
            config: Self::default(),
            model_set: false,
        }
    }

    /// Start a builder pre-filled from a parsed config file.
    pub fn builder_from_file(file: &FileConfig) -> TranslatorConfigBuilder {
        let mut builder = Self::builder().credential(file.credential());

        if let Some(ref name) = file.translation.provider {
            builder = builder.provider_name(name.clone());
        }
        if let Some(ref url) = file.groq.base_url {
            builder = builder.base_url(url.clone());
        }
        // [translation].model wins; [groq].model only applies to the groq backend.
        let groq_backend = file
            .translation
            .provider
            .as_deref()
            .map_or(true, |p| p.trim().eq_ignore_ascii_case(GROQ_PROVIDER));
        let model = match (&file.translation.model, &file.groq.model) {
            (Some(m), _) => Some(m.clone()),
            (None, Some(m)) if groq_backend => Some(m.clone()),
            _ => None,
        };
        if let Some(model) = model {
            builder = builder.model(model);
        }
        if let Some(t) = file.translation.temperature {
            builder = builder.temperature(t);
        }
        if let Some(n) = file.translation.max_tokens {
            builder = builder.max_tokens(n);
        }
        builder
    }

    /// True when the built-in Groq client should be used.
    pub fn uses_groq(&self) -> bool {
        self.provider.is_none() && self.provider_name.eq_ignore_ascii_case(GROQ_PROVIDER)
    }
}

/// Builder for [`TranslatorConfig`].
#[derive(Debug)]
pub struct TranslatorConfigBuilder {
    config: TranslatorConfig,
    model_set: bool,
}

impl TranslatorConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into().trim().to_lowercase();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self.model_set = true;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.credential = Credential::from_option(Some(key.into()));
        self
    }

    pub fn credential(mut self, credential: Credential) -> Self {
        self.config.credential = credential;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TranslatorConfig, TranslateError> {
        let c = &self.config;
        if c.provider_name.is_empty() {
            return Err(TranslateError::Configuration {
                reason: "provider name must not be empty".into(),
            });
        }
        if c.model.trim().is_empty() {
            return Err(TranslateError::Configuration {
                reason: "model must not be empty".into(),
            });
        }
        if c.max_tokens == Some(0) {
            return Err(TranslateError::Configuration {
                reason: "max_tokens must be ≥ 1".into(),
            });
        }
        // The Groq default model means nothing to other providers.
        if !self.model_set && !c.provider_name.eq_ignore_ascii_case(GROQ_PROVIDER) {
            return Err(TranslateError::Configuration {
                reason: format!("a model is required for provider '{}'", c.provider_name),
            });
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_round_trips_wire_names() {
        assert_eq!("ar-to-en".parse::<Direction>().unwrap(), Direction::ArabicToEnglish);
        assert_eq!("en-to-ar".parse::<Direction>().unwrap(), Direction::EnglishToArabic);
        assert_eq!(Direction::EnglishToArabic.to_string(), "en-to-ar");
    }

    #[cfg(feature = "cli")]
    #[test]
    fn direction_cli_values_are_wire_names() {
        use clap::ValueEnum;
        for d in Direction::value_variants() {
            let value = d.to_possible_value().unwrap();
            assert_eq!(value.get_name(), d.as_str());
            assert_eq!(<Direction as ValueEnum>::from_str(value.get_name(), false).unwrap(), *d);
        }
    }

    #[test]
    fn unknown_direction_is_invalid_request() {
        let err = "fr-to-en".parse::<Direction>().unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("fr-to-en"));
    }

    #[test]
    fn blank_key_is_missing() {
        assert!(!Credential::from_option(Some("   ".into())).is_present());
        assert!(!Credential::from_option(None).is_present());
        assert_eq!(
            Credential::from_option(Some(" gsk_1 ".into())).require().unwrap(),
            "gsk_1"
        );
    }

    #[test]
    fn missing_credential_requires_configuration_error() {
        let err = Credential::default().require().unwrap_err();
        assert!(matches!(err, TranslateError::Configuration { .. }));
    }

    #[test]
    fn credential_debug_is_redacted() {
        let dbg = format!("{:?}", Credential::Present("gsk_secret".into()));
        assert!(!dbg.contains("gsk_secret"));
    }

    #[test]
    fn file_config_parses_full_example() {
        let file = FileConfig::from_toml_str(
            r#"
[groq]
api_key = "gsk_abc"
model = "llama-3.1-8b-instant"

[translation]
temperature = 0.3

[server]
port = 9000
staging_dir = "/tmp/uploads"
"#,
        )
        .unwrap();
        assert_eq!(file.credential().require().unwrap(), "gsk_abc");
        assert_eq!(file.server.port, 9000);
        assert_eq!(file.server.host, "0.0.0.0");
        assert_eq!(file.server.max_upload_mb, 25);

        let config = TranslatorConfig::builder_from_file(&file).build().unwrap();
        assert!(config.uses_groq());
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert_eq!(config.temperature, Some(0.3));
        assert_eq!(config.base_url, DEFAULT_GROQ_BASE_URL);
    }

    #[test]
    fn file_without_groq_section_has_missing_credential() {
        let file = FileConfig::from_toml_str("[server]\nport = 8000\n").unwrap();
        assert!(!file.credential().is_present());
    }

    #[test]
    fn malformed_toml_is_configuration_error() {
        let err = FileConfig::from_toml_str("[groq\napi_key = ").unwrap_err();
        assert!(matches!(err, TranslateError::Configuration { .. }));
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let err = FileConfig::load("/definitely/not/here/config.toml").unwrap_err();
        assert!(matches!(err, TranslateError::Configuration { .. }));
    }

    #[test]
    fn builder_defaults_to_groq() {
        let config = TranslatorConfig::builder().build().unwrap();
        assert!(config.uses_groq());
        assert_eq!(config.model, DEFAULT_GROQ_MODEL);
        assert!(!config.credential.is_present());
    }

    #[test]
    fn builder_clamps_temperature_and_trims_url() {
        let config = TranslatorConfig::builder()
            .temperature(9.0)
            .base_url("http://localhost:8080/v1/")
            .build()
            .unwrap();
        assert_eq!(config.temperature, Some(2.0));
        assert_eq!(config.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn builder_rejects_zero_max_tokens() {
        assert!(TranslatorConfig::builder().max_tokens(0).build().is_err());
    }

    #[test]
    fn other_provider_requires_model() {
        let err = TranslatorConfig::builder()
            .provider_name("OpenAI")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("openai"));

        let config = TranslatorConfig::builder()
            .provider_name("OpenAI")
            .model("gpt-4.1-nano")
            .build()
            .unwrap();
        assert!(!config.uses_groq());
        assert_eq!(config.provider_name, "openai");
    }

    #[test]
    fn groq_model_section_ignored_for_other_providers() {
        let file = FileConfig::from_toml_str(
            "[groq]\nmodel = \"llama-3.1-8b-instant\"\n[translation]\nprovider = \"anthropic\"\n",
        )
        .unwrap();
        assert!(TranslatorConfig::builder_from_file(&file).build().is_err());
    }
}
