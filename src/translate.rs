//! Document translation entry points.
//!
//! A document is translated one paragraph at a time, in document order. The
//! next paragraph is not sent until the previous call has returned, and the
//! first failed call abandons the whole document: the partially translated
//! in-memory copy is dropped and the error is returned unchanged.

use crate::config::Direction;
use crate::error::TranslateError;
use crate::output::{TranslationOutput, TranslationStats};
use crate::pipeline::docx::Document;
use crate::pipeline::llm::TranslationClient;
use crate::progress::ProgressCallback;
use crate::prompts::select_prompt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Translate a `.docx` held in memory and return the translated bytes.
///
/// # Errors
/// - [`TranslateError::DocumentFormat`] if `input` is not a readable `.docx`
/// - whatever the client returns for the first paragraph that fails
pub async fn translate_document(
    input: &[u8],
    direction: Direction,
    client: &dyn TranslationClient,
) -> Result<Vec<u8>, TranslateError> {
    translate_document_with_stats(input, direction, client, None)
        .await
        .map(|out| out.bytes)
}

/// Like [`translate_document`], with run statistics and progress events.
pub async fn translate_document_with_stats(
    input: &[u8],
    direction: Direction,
    client: &dyn TranslationClient,
    progress: Option<&ProgressCallback>,
) -> Result<TranslationOutput, TranslateError> {
    let total_start = Instant::now();
    let mut document = Document::open(input)?;
    let instruction = select_prompt(direction);

    let total = document.paragraph_count();
    let pending = document.paragraphs().filter(|p| !p.is_blank()).count();
    info!(
        "Translating {} of {} paragraphs ({}) via {}",
        pending,
        total,
        direction,
        client.name()
    );
    if let Some(cb) = progress {
        cb.on_translation_start(pending);
    }

    let mut translated = 0usize;
    let mut llm_duration_ms = 0u64;
    for (idx, paragraph) in document.paragraphs_mut().enumerate() {
        let paragraph_num = idx + 1;
        let text = paragraph.text();
        if text.trim().is_empty() {
            debug!("Paragraph {}/{}: blank, skipped", paragraph_num, total);
            continue;
        }

        if let Some(cb) = progress {
            cb.on_paragraph_start(paragraph_num, total);
        }
        let call_start = Instant::now();
        let result = client.translate(&text, instruction).await;
        llm_duration_ms += call_start.elapsed().as_millis() as u64;

        match result {
            Ok(output) => {
                debug!(
                    "Paragraph {}/{}: {} -> {} chars",
                    paragraph_num,
                    total,
                    text.chars().count(),
                    output.chars().count()
                );
                if let Some(cb) = progress {
                    cb.on_paragraph_complete(paragraph_num, total, output.chars().count());
                }
                paragraph.set_text(&output);
                translated += 1;
            }
            Err(e) => {
                warn!("Paragraph {}/{} failed: {}", paragraph_num, total, e);
                if let Some(cb) = progress {
                    cb.on_paragraph_error(paragraph_num, total, &e.to_string());
                }
                return Err(e);
            }
        }
    }

    let bytes = document.to_bytes()?;
    let stats = TranslationStats {
        total_paragraphs: total,
        translated_paragraphs: translated,
        skipped_paragraphs: total - pending,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Translation complete: {}/{} paragraphs, {}ms total",
        translated, total, stats.total_duration_ms
    );
    if let Some(cb) = progress {
        cb.on_translation_complete(pending, translated);
    }

    Ok(TranslationOutput { bytes, stats })
}

/// Translate `input` and write the result to `output`.
///
/// Uses atomic write (temp file + rename), so a failed translation never
/// leaves a partial or stale output file behind.
pub async fn translate_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    direction: Direction,
    client: &dyn TranslationClient,
    progress: Option<&ProgressCallback>,
) -> Result<TranslationStats, TranslateError> {
    let input = input.as_ref();
    let path = output.as_ref();

    let bytes = tokio::fs::read(input).await.map_err(|e| {
        TranslateError::document(format!("cannot read '{}': {e}", input.display()))
    })?;
    let translated = translate_document_with_stats(&bytes, direction, client, progress).await?;

    let write_err = |source| TranslateError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("docx.tmp");
    tokio::fs::write(&tmp_path, &translated.bytes)
        .await
        .map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }

    Ok(translated.stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Mutex;

    struct Upper {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl TranslationClient for Upper {
        async fn translate(&self, text: &str, instruction: &str) -> Result<String, TranslateError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), instruction.to_string()));
            Ok(text.to_uppercase())
        }

        fn name(&self) -> &str {
            "upper"
        }
    }

    fn docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|t| format!("<w:p><w:r><w:t xml:space=\"preserve\">{t}</w:t></w:r></w:p>"))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        );
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let opts = zip::write::SimpleFileOptions::default();
            zip.start_file("[Content_Types].xml", opts).unwrap();
            zip.write_all(b"<Types/>").unwrap();
            zip.start_file("word/document.xml", opts).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[tokio::test]
    async fn stats_count_translated_and_skipped() {
        let client = Upper {
            calls: Mutex::new(Vec::new()),
        };
        let out = translate_document_with_stats(
            &docx(&["one", "", "two", "   "]),
            Direction::EnglishToArabic,
            &client,
            None,
        )
        .await
        .unwrap();
        assert_eq!(out.stats.total_paragraphs, 4);
        assert_eq!(out.stats.translated_paragraphs, 2);
        assert_eq!(out.stats.skipped_paragraphs, 2);

        let texts = Document::open(&out.bytes).unwrap().paragraph_texts();
        assert_eq!(texts, vec!["ONE", "", "TWO", "   "]);
    }

    #[tokio::test]
    async fn instruction_follows_direction() {
        let client = Upper {
            calls: Mutex::new(Vec::new()),
        };
        translate_document(&docx(&["a", "b"]), Direction::ArabicToEnglish, &client)
            .await
            .unwrap();
        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        for (_, instruction) in calls.iter() {
            assert_eq!(instruction, select_prompt(Direction::ArabicToEnglish));
        }
    }

    #[tokio::test]
    async fn garbage_input_is_document_format_error() {
        let client = Upper {
            calls: Mutex::new(Vec::new()),
        };
        let err = translate_document(b"not a zip", Direction::ArabicToEnglish, &client)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::DocumentFormat { .. }));
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn translate_file_writes_output_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.docx");
        let output = dir.path().join("out/translated_in.docx");
        std::fs::write(&input, docx(&["hello"])).unwrap();

        let client = Upper {
            calls: Mutex::new(Vec::new()),
        };
        let stats = translate_file(&input, &output, Direction::EnglishToArabic, &client, None)
            .await
            .unwrap();
        assert_eq!(stats.translated_paragraphs, 1);

        let written = std::fs::read(&output).unwrap();
        assert_eq!(Document::open(&written).unwrap().paragraph_texts(), vec!["HELLO"]);
        assert!(!output.with_extension("docx.tmp").exists());
    }
}
