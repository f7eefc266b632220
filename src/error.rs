//! Error types for the docx-translate library.
//!
//! Every failure is fatal for the request that hit it: a document is either
//! translated completely or not at all. There is no per-paragraph error type
//! because a single failed paragraph aborts the whole document.
//!
//! The variants mirror the four failure classes callers need to tell apart:
//!
//! * [`TranslateError::Configuration`] — the service credential is missing
//!   or the configuration file is malformed.
//! * [`TranslateError::DocumentFormat`] — the input is not a readable `.docx`.
//! * [`TranslateError::TranslationService`] — the remote completion call
//!   failed (network, auth, quota, malformed response, …).
//! * [`TranslateError::InvalidRequest`] — the caller sent something we refuse
//!   before doing any work (wrong extension, unknown direction).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docx-translate library.
#[derive(Debug, Error)]
pub enum TranslateError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// The API credential could not be located or the config is malformed.
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// The bytes are not a valid `.docx` container.
    #[error("Invalid document: {detail}")]
    DocumentFormat { detail: String },

    /// The request was rejected before translation started.
    #[error("{0}")]
    InvalidRequest(String),

    // ── Translation errors ────────────────────────────────────────────────
    /// The remote completion call failed for any reason.
    #[error("Error calling translation service '{provider}': {detail}")]
    TranslationService { provider: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TranslateError {
    pub(crate) fn document(detail: impl Into<String>) -> Self {
        TranslateError::DocumentFormat {
            detail: detail.into(),
        }
    }

    pub(crate) fn service(provider: impl Into<String>, detail: impl ToString) -> Self {
        TranslateError::TranslationService {
            provider: provider.into(),
            detail: detail.to_string(),
        }
    }

    /// True when the failure was caused by the caller's input rather than by
    /// the service or its dependencies.
    pub fn is_client_error(&self) -> bool {
        matches!(self, TranslateError::InvalidRequest(_))
    }
}
