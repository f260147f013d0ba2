use crate::AppState;
use crate::api::error::AppError;
use crate::api::handlers::media::multipart::{single_staged, stage_fields};
use crate::api::handlers::media::types::{FileUploadForm, LegacyUploadResponse, MessageResponse};
use axum::{
    Json,
    extract::{Multipart, State},
};

/// Flat upload kept for older clients: the file lands directly under the upload root and the
/// response carries an absolute URL built from `BASE_URL`.
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = FileUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = LegacyUploadResponse),
        (status = 400, description = "No file uploaded", body = MessageResponse)
    ),
    tag = "legacy"
)]
pub async fn legacy_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<LegacyUploadResponse>, AppError> {
    let outcomes = stage_fields(&state, &mut multipart, "file", 1).await?;
    let staged = single_staged(&state, outcomes).await?;

    let url = state.media_service.upload_flat(staged).await?;
    Ok(Json(LegacyUploadResponse { url }))
}
