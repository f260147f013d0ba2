use crate::AppState;
use crate::api::error::AppError;
use axum::{Json, extract::State};
use validator::Validate;

use super::types::*;

pub const DELETE_ACK: &str = "Physical media file deletion request processed.";

/// Idempotent: deleting a file that is already gone is acknowledged the same way.
#[utoipa::path(
    delete,
    path = "/api/media",
    request_body = DeleteMediaRequest,
    responses(
        (status = 200, description = "Deletion processed", body = MessageResponse),
        (status = 400, description = "Missing or invalid URL", body = MessageResponse)
    ),
    tag = "media"
)]
pub async fn delete_media(
    State(state): State<AppState>,
    Json(req): Json<DeleteMediaRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state.media_service.delete_by_url(&req.url).await?;

    Ok(Json(MessageResponse {
        message: DELETE_ACK.to_string(),
    }))
}
