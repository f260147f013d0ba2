use crate::AppState;
use crate::api::error::AppError;
use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
};

use super::multipart::{single_staged, stage_fields};
use super::types::*;

/// Stores one file under `restaurant_<id>/<type>` or `media/shared/<type>`.
///
/// The `hash` query parameter is required and returned as given. Use `/api/media/hash`
/// for a server-computed fingerprint.
#[utoipa::path(
    post,
    path = "/api/media/upload",
    params(UploadQuery),
    request_body(content = FileUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = MediaUploadResponse),
        (status = 400, description = "Missing file, type or hash", body = MessageResponse),
        (status = 413, description = "File too large", body = MessageResponse),
        (status = 415, description = "File type not allowed", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse)
    ),
    tag = "media"
)]
pub async fn upload_media(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MediaUploadResponse>), AppError> {
    let outcomes = stage_fields(&state, &mut multipart, "file", 1).await?;
    let staged = single_staged(&state, outcomes).await?;

    let stored = state
        .media_service
        .upload(
            staged,
            query.restaurant_id.as_deref(),
            query.media_type.as_deref(),
            query.hash.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(stored.into())))
}

#[utoipa::path(
    post,
    path = "/api/media/upload-multiple",
    params(UploadMultipleQuery),
    request_body(content = MultiFileUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Per-file outcome of the batch", body = BatchUploadResponse),
        (status = 400, description = "No files, too many files or missing type", body = MessageResponse)
    ),
    tag = "media"
)]
pub async fn upload_multiple_media(
    State(state): State<AppState>,
    Query(query): Query<UploadMultipleQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<BatchUploadResponse>), AppError> {
    let max_files = state.config.max_files_per_request;
    let outcomes = stage_fields(&state, &mut multipart, "files", max_files).await?;
    if outcomes.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".to_string()));
    }

    let batch = state
        .media_service
        .upload_many(
            outcomes,
            query.restaurant_id.as_deref(),
            query.media_type.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(batch.into())))
}
