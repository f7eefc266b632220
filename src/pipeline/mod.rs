//! Building blocks of a document translation.
//!
//! ```text
//! input ──▶ docx::Document ──▶ llm::TranslationClient (per paragraph) ──▶ docx bytes
//! (validate, stage)  (open)      (one call each, in order)               (serialise)
//! ```
//!
//! 1. [`input`] — file-name and container checks; staged temp files for uploads
//! 2. [`docx`]  — unzip, expose top-level body paragraphs, re-zip
//! 3. [`llm`]   — the only stage with network I/O
//!
//! [`crate::translate`] drives the three in sequence.

pub mod docx;
pub mod input;
pub mod llm;
