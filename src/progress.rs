//! Progress-callback trait for per-paragraph translation events.
//!
//! Inject an [`Arc<dyn TranslationProgressCallback>`] via
//! [`crate::config::TranslatorConfigBuilder::progress_callback`] to receive
//! events as the pipeline walks the document. The CLI uses it to drive an
//! indicatif progress bar; the HTTP service leaves it unset.
//!
//! Paragraphs are translated one after another, so callbacks are never
//! invoked concurrently for the same document. The trait is still
//! `Send + Sync` because one config (and its callback) may be shared by
//! several documents translated on different tasks.
//!
//! # Example
//!
//! ```rust
//! use docx_translate::{TranslationProgressCallback, TranslatorConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl TranslationProgressCallback for CountingCallback {
//!     fn on_paragraph_complete(&self, paragraph_num: usize, total: usize, chars: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("paragraph {paragraph_num}/{total}: {chars} chars");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = TranslatorConfig::builder()
//!     .progress_callback(counter as Arc<dyn TranslationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it translates each paragraph.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `paragraph_num` is the 1-indexed position of the
/// paragraph in the document; `total` is the number of paragraphs in the
/// document, including empty ones that will be skipped.
pub trait TranslationProgressCallback: Send + Sync {
    /// Called once after the document is opened.
    ///
    /// # Arguments
    /// * `pending` — number of non-empty paragraphs that will be sent to the model
    fn on_translation_start(&self, pending: usize) {
        let _ = pending;
    }

    /// Called just before the completion request for a paragraph is sent.
    fn on_paragraph_start(&self, paragraph_num: usize, total: usize) {
        let _ = (paragraph_num, total);
    }

    /// Called when a paragraph's text has been replaced.
    ///
    /// `chars` is the character count of the translated text.
    fn on_paragraph_complete(&self, paragraph_num: usize, total: usize, chars: usize) {
        let _ = (paragraph_num, total, chars);
    }

    /// Called when a paragraph's translation fails. The document is abandoned
    /// right after this call.
    fn on_paragraph_error(&self, paragraph_num: usize, total: usize, error: &str) {
        let _ = (paragraph_num, total, error);
    }

    /// Called once after the document has been serialised.
    fn on_translation_complete(&self, pending: usize, translated: usize) {
        let _ = (pending, translated);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl TranslationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::TranslatorConfig`].
pub type ProgressCallback = Arc<dyn TranslationProgressCallback>;
