//! Input validation and staging.
//!
//! Uploaded files are written to a [`StagedInput`] before translation. The
//! staged file is a [`tempfile::NamedTempFile`] inside the configured staging
//! directory, so it is removed when the value is dropped, on the success
//! path, on every error path, and on panic unwinding alike. Its on-disk name
//! is random; the client-supplied file name is only ever used to name the
//! response, never to build a path.

use crate::error::TranslateError;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Required file extension for uploads.
pub const DOCX_EXTENSION: &str = ".docx";

/// Prefix added to the original file name for the translated result.
pub const OUTPUT_PREFIX: &str = "translated_";

/// Zip local-file-header signature every `.docx` starts with.
const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";

/// Check that an uploaded file name ends in `.docx`.
pub fn validate_filename(filename: &str) -> Result<(), TranslateError> {
    if filename.ends_with(DOCX_EXTENSION) {
        Ok(())
    } else {
        Err(TranslateError::InvalidRequest(
            "Invalid file type. Please upload a .docx file.".into(),
        ))
    }
}

/// Name of the translated file: `translated_<basename>`.
///
/// Directory components supplied by the client are stripped.
pub fn output_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("document.docx");
    format!("{OUTPUT_PREFIX}{base}")
}

/// Default output path for the CLI: `translated_<name>` next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.docx".into());
    input.with_file_name(output_filename(&name))
}

/// Reject bytes that cannot possibly be a `.docx` before unzipping them.
pub fn check_magic(bytes: &[u8]) -> Result<(), TranslateError> {
    if bytes.len() >= 4 && bytes[..4] == ZIP_MAGIC {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    Err(TranslateError::DocumentFormat {
        detail: format!("not a .docx (zip) file; first bytes: {magic:?}"),
    })
}

/// An uploaded document staged on disk for the duration of one request.
pub struct StagedInput {
    file: NamedTempFile,
    original_name: String,
}

impl StagedInput {
    /// Write `bytes` to a fresh temp file inside `staging_dir`.
    ///
    /// The directory is created if it does not exist.
    pub async fn stage(
        staging_dir: &Path,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<Self, TranslateError> {
        tokio::fs::create_dir_all(staging_dir).await.map_err(|e| {
            TranslateError::Internal(format!(
                "cannot create staging dir '{}': {e}",
                staging_dir.display()
            ))
        })?;

        let dir = staging_dir.to_path_buf();
        let file = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix("upload-")
                .suffix(DOCX_EXTENSION)
                .tempfile_in(dir)
        })
        .await
        .map_err(|e| TranslateError::Internal(format!("tempfile task: {e}")))?
        .map_err(|e| TranslateError::Internal(format!("tempfile: {e}")))?;

        tokio::fs::write(file.path(), bytes)
            .await
            .map_err(|e| TranslateError::Internal(format!("tempfile write: {e}")))?;

        debug!(
            "Staged '{}' ({} bytes) at {}",
            original_name,
            bytes.len(),
            file.path().display()
        );
        Ok(Self {
            file,
            original_name: original_name.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Read the staged bytes back.
    pub async fn read(&self) -> Result<Vec<u8>, TranslateError> {
        tokio::fs::read(self.path())
            .await
            .map_err(|e| TranslateError::Internal(format!("read staged input: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docx_extension_accepted() {
        assert!(validate_filename("report.docx").is_ok());
        assert!(validate_filename("تقرير.docx").is_ok());
    }

    #[test]
    fn other_extensions_rejected_as_client_errors() {
        for name in ["report.txt", "report.doc", "report.docx.pdf", "report.DOCX", ""] {
            let err = validate_filename(name).unwrap_err();
            assert!(err.is_client_error(), "{name}");
        }
    }

    #[test]
    fn output_name_is_prefixed_basename() {
        assert_eq!(output_filename("report.docx"), "translated_report.docx");
        assert_eq!(output_filename("../../etc/report.docx"), "translated_report.docx");
        assert_eq!(output_filename("C:\\tmp\\a.docx"), "translated_a.docx");
    }

    #[test]
    fn default_output_path_sits_beside_input() {
        let p = default_output_path(Path::new("/data/in/sample.docx"));
        assert_eq!(p, PathBuf::from("/data/in/translated_sample.docx"));
    }

    #[test]
    fn magic_check() {
        assert!(check_magic(b"PK\x03\x04rest").is_ok());
        assert!(matches!(
            check_magic(b"%PDF-1.7"),
            Err(TranslateError::DocumentFormat { .. })
        ));
        assert!(check_magic(b"").is_err());
    }

    #[tokio::test]
    async fn staged_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedInput::stage(dir.path(), "a.docx", b"PK\x03\x04data")
            .await
            .unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.starts_with(dir.path()));
        assert_eq!(staged.read().await.unwrap(), b"PK\x03\x04data");
        assert_eq!(staged.original_name(), "a.docx");
        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn staging_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("uploads/nested");
        let staged = StagedInput::stage(&nested, "a.docx", b"x").await.unwrap();
        assert!(staged.path().starts_with(&nested));
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"x");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn staging_on_current_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedInput::stage(dir.path(), "b.docx", &[7u8; 64 * 1024])
            .await
            .unwrap();
        assert_eq!(staged.read().await.unwrap().len(), 64 * 1024);
    }
}
