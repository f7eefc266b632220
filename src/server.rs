//! HTTP upload endpoint.
//!
//! ```text
//! POST /translate-document/   multipart: file=<.docx>, direction=ar-to-en|en-to-ar
//! GET  /health
//! ```
//!
//! The upload is staged to a temp file in the configured staging directory
//! for the lifetime of the request and removed afterwards on every path. The
//! translated document is returned in the response body as an attachment
//! named `translated_<original name>`.
//!
//! Errors are JSON `{"detail": "..."}`: 400 for bad requests (wrong file
//! extension, missing or invalid fields), 500 for everything else.

use crate::config::Direction;
use crate::error::TranslateError;
use crate::pipeline::input::{check_magic, output_filename, validate_filename, StagedInput};
use crate::pipeline::llm::TranslationClient;
use crate::translate::translate_document_with_stats;
use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// MIME type of a `.docx` response.
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Shared, read-only state for all requests.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn TranslationClient>,
    pub staging_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(client: Arc<dyn TranslationClient>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            staging_dir: staging_dir.into(),
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }

    pub fn with_max_upload_mb(mut self, mb: usize) -> Self {
        self.max_upload_bytes = mb.saturating_mul(1024 * 1024);
        self
    }
}

/// Build the axum router.
pub fn build_router(state: AppState) -> Router {
    let limit = state.max_upload_bytes;
    Router::new()
        .route("/translate-document/", post(translate_upload))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

// ── Errors ───────────────────────────────────────────────────────────────

/// Error response: a status plus a human-readable `detail`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl From<TranslateError> for ApiError {
    fn from(e: TranslateError) -> Self {
        let status = if e.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            detail: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

async fn translate_upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let mut upload: Option<Upload> = None;
    let mut direction: Option<String> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some(Upload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            Some("direction") => {
                direction = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request("Missing 'file' field."))?;
    validate_filename(&upload.filename)?;
    let direction: Direction = direction
        .ok_or_else(|| ApiError::bad_request("Missing 'direction' field."))?
        .trim()
        .parse()?;

    let staged = StagedInput::stage(&state.staging_dir, &upload.filename, &upload.bytes).await?;
    drop(upload);

    let result = translate_staged(&staged, direction, state.client.as_ref()).await;
    // Staged input is removed here whether or not translation succeeded.
    drop(staged);

    let (filename, bytes) = result.map_err(|e| {
        warn!("Translation request failed: {}", e);
        ApiError::from(e)
    })?;
    Ok(attachment(&filename, bytes))
}

async fn translate_staged(
    staged: &StagedInput,
    direction: Direction,
    client: &dyn TranslationClient,
) -> Result<(String, Vec<u8>), TranslateError> {
    let bytes = staged.read().await?;
    check_magic(&bytes)?;
    let output = translate_document_with_stats(&bytes, direction, client, None).await?;
    info!(
        "Translated '{}' ({}): {} paragraphs in {}ms",
        staged.original_name(),
        direction,
        output.stats.translated_paragraphs,
        output.stats.total_duration_ms
    );
    Ok((output_filename(staged.original_name()), output.bytes))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError {
        status: e.status(),
        detail: e.body_text(),
    }
}

fn attachment(filename: &str, bytes: Vec<u8>) -> Response {
    let disposition = content_disposition(filename);
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(DOCX_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

/// `attachment; filename="..."`, or the RFC 5987 `filename*` form for names
/// that are not plain printable ASCII.
fn content_disposition(filename: &str) -> HeaderValue {
    let plain = filename
        .bytes()
        .all(|b| (0x20..0x7f).contains(&b) && b != b'"' && b != b'\\');
    let value = if plain {
        format!("attachment; filename=\"{filename}\"")
    } else {
        format!(
            "attachment; filename*=utf-8''{}",
            urlencoding::encode(filename)
        )
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
