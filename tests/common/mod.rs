//! Shared fixtures for integration tests: in-memory `.docx` builder and a
//! scripted `TranslationClient`.

#![allow(dead_code)]

use async_trait::async_trait;
use docx_translate::{TranslateError, TranslationClient};
use std::io::{Cursor, Read, Write};
use std::sync::Mutex;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

/// Build a minimal `.docx` with one top-level paragraph per entry.
///
/// Text is written with `xml:space="preserve"` so whitespace-only entries
/// survive parsing. An empty string produces a paragraph with no runs.
pub fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|t| {
            if t.is_empty() {
                "<w:p/>".to_string()
            } else {
                format!(
                    r#"<w:p><w:pPr><w:bidi/></w:pPr><w:r><w:rPr><w:rtl/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                    escape(t)
                )
            }
        })
        .collect();
    docx_from_body(&body)
}

/// Build a `.docx` around raw `w:body` content.
pub fn docx_from_body(body: &str) -> Vec<u8> {
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {NS}><w:body>{body}<w:sectPr/></w:body></w:document>"#
    );
    let mut zout = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default();
    zout.start_file("[Content_Types].xml", opts).unwrap();
    zout.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
    zout.start_file("word/styles.xml", opts).unwrap();
    zout.write_all(b"<?xml version=\"1.0\"?><w:styles/>").unwrap();
    zout.start_file("word/document.xml", opts).unwrap();
    zout.write_all(xml.as_bytes()).unwrap();
    zout.finish().unwrap().into_inner()
}

/// Raw bytes of one zip entry.
pub fn zip_entry(docx: &[u8], name: &str) -> Vec<u8> {
    let mut zip = ZipArchive::new(Cursor::new(docx)).unwrap();
    let mut out = Vec::new();
    zip.by_name(name).unwrap().read_to_end(&mut out).unwrap();
    out
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// How the fake client answers.
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Reply `"[EN] <text>"` to every call.
    Tag,
    /// Fail with a service error on this 1-based call number.
    FailOnCall(usize),
    /// Fail every call with a configuration error, like a missing key.
    MissingKey,
}

/// Deterministic in-process translation client that records every call.
pub struct FakeClient {
    behaviour: Behaviour,
    calls: Mutex<Vec<(String, String)>>,
    succeeded: Mutex<usize>,
}

impl FakeClient {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            calls: Mutex::new(Vec::new()),
            succeeded: Mutex::new(0),
        }
    }

    /// `(text, instruction)` for every call, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn successful_calls(&self) -> usize {
        *self.succeeded.lock().unwrap()
    }
}

#[async_trait]
impl TranslationClient for FakeClient {
    async fn translate(&self, text: &str, instruction: &str) -> Result<String, TranslateError> {
        let call_num = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((text.to_string(), instruction.to_string()));
            calls.len()
        };
        match self.behaviour {
            Behaviour::MissingKey => Err(TranslateError::Configuration {
                reason: "Groq API key not found or config.toml is missing.".into(),
            }),
            Behaviour::FailOnCall(n) if n == call_num => Err(TranslateError::TranslationService {
                provider: "fake".into(),
                detail: format!("injected failure on call {n}"),
            }),
            _ => {
                *self.succeeded.lock().unwrap() += 1;
                Ok(format!("[EN] {text}"))
            }
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}
