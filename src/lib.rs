//! # docx-translate
//!
//! Translate Word (`.docx`) documents between Arabic and English with a
//! large language model, one paragraph at a time.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .docx
//!  │
//!  ├─ 1. Open       unzip, parse word/document.xml, collect body paragraphs
//!  ├─ 2. Prompt     pick the instruction for the direction (ar-to-en / en-to-ar)
//!  ├─ 3. Translate  one completion call per non-empty paragraph, in order
//!  └─ 4. Save       replace paragraph text, re-zip (other parts untouched)
//! ```
//!
//! The first failed call aborts the document; nothing partial is written.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docx_translate::{build_client, translate_document, Direction, TranslatorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TranslatorConfig::builder()
//!         .api_key(std::env::var("GROQ_API_KEY")?)
//!         .build()?;
//!     let client = build_client(&config)?;
//!
//!     let input = std::fs::read("report.docx")?;
//!     let output = translate_document(&input, Direction::ArabicToEnglish, client.as_ref()).await?;
//!     std::fs::write("translated_report.docx", output)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | `docx-translate` binary (clap + anyhow + indicatif + tracing-subscriber) |
//! | `server` | on      | [`server`] module and `docx-translate-server` binary (axum) |
//!
//! Library-only use:
//! ```toml
//! docx-translate = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;
pub mod translate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    Credential, Direction, FileConfig, TranslatorConfig, TranslatorConfigBuilder,
};
pub use error::TranslateError;
pub use output::{TranslationOutput, TranslationStats};
pub use pipeline::docx::{Document, Paragraph};
pub use pipeline::llm::{build_client, GroqClient, ProviderClient, TranslationClient};
pub use progress::{NoopProgressCallback, ProgressCallback, TranslationProgressCallback};
pub use prompts::select_prompt;
pub use translate::{translate_document, translate_document_with_stats, translate_file};
