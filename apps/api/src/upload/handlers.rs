//! Axum route handlers for the upload API.

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::analysis::AnalysisResult;
use crate::models::upload::UploadedImage;
use crate::recommendations::{resolve_analysis, ResolvedFurniture};
use crate::state::AppState;
use crate::storage::IMMUTABLE_CACHE_CONTROL;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";
const DEFAULT_UPLOAD_NAME: &str = "upload";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_url: String,
    pub analysis: AnalysisResult,
    pub furniture: Vec<ResolvedFurniture>,
}

/// POST /api/upload
///
/// Full pipeline: read image → load catalog → vision analysis → resolve picks → store
/// image and sidecar. Storage happens last so a failed analysis leaves nothing on disk.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let multipart =
        multipart.map_err(|e| AppError::Validation(format!("Expected multipart form data: {e}")))?;

    let image = read_file_field(multipart)
        .await?
        .ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    if image.bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    info!(
        "Received upload '{}' ({} bytes, {})",
        image.file_name,
        image.bytes.len(),
        image.content_type.as_deref().unwrap_or("no content type")
    );

    let mode = state.config.recommendation_mode;
    let catalog = state.catalog.load().await;
    let analysis = state.analyzer.analyze(&image, &catalog, mode).await?;
    let furniture = resolve_analysis(&analysis, mode, &catalog);

    let stored = state.uploads.store(&image, &analysis).await?;
    debug!(
        "Upload written to {} with sidecar {}",
        stored.image_path.display(),
        stored.sidecar_path.display()
    );
    info!(
        "Analysis complete for {}: room_type='{}', {} furniture matches",
        stored.file_name,
        analysis.room_type,
        furniture.len()
    );

    Ok(Json(UploadResponse {
        image_url: stored.url,
        analysis,
        furniture,
    }))
}

/// Returns the first `file` field of the form, skipping any others.
async fn read_file_field(mut multipart: Multipart) -> Result<Option<UploadedImage>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart field", e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_UPLOAD_NAME)
            .to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read uploaded file", e))?;

        return Ok(Some(UploadedImage {
            file_name,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

/// A body over the upload limit surfaces as 413; every other multipart failure is a 400.
fn multipart_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{context}: upload exceeds the size limit"))
    } else {
        AppError::Validation(format!("{context}: {err}"))
    }
}

/// GET /api/uploads/*path
///
/// Streams a stored image or sidecar back with a long-lived immutable cache header.
pub async fn handle_get_upload(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let stored = state.uploads.open(&path).await?;

    let headers = [
        (header::CONTENT_TYPE, stored.content_type.to_string()),
        (header::CONTENT_LENGTH, stored.len.to_string()),
        (header::CACHE_CONTROL, IMMUTABLE_CACHE_CONTROL.to_string()),
    ];
    let body = Body::from_stream(ReaderStream::new(stored.file));

    Ok((headers, body).into_response())
}
