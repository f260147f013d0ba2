use crate::AppState;
use crate::api::error::AppError;
use axum::{
    Json,
    extract::{Multipart, State},
};

use super::multipart::{single_staged, stage_fields};
use super::types::*;

#[utoipa::path(
    post,
    path = "/api/media/hash",
    request_body(content = FileUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Fingerprint of the uploaded file", body = HashResponse),
        (status = 400, description = "No file uploaded", body = MessageResponse),
        (status = 415, description = "File type not allowed", body = MessageResponse)
    ),
    tag = "media"
)]
pub async fn get_media_hash(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<HashResponse>, AppError> {
    let outcomes = stage_fields(&state, &mut multipart, "file", 1).await?;
    let staged = single_staged(&state, outcomes).await?;

    let report = state.media_service.hash_only(staged).await?;
    Ok(Json(report.into()))
}
