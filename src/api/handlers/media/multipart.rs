use crate::AppState;
use crate::api::error::AppError;
use crate::services::media_service::{StagedFile, StagingOutcome};
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

/// Stages every file field named `field_name`, at most `max_files` of them.
///
/// Other fields are skipped. On error every file staged so far is released and the rest of
/// the body is drained before returning.
pub async fn stage_fields(
    state: &AppState,
    multipart: &mut Multipart,
    field_name: &str,
    max_files: usize,
) -> Result<Vec<StagingOutcome>, AppError> {
    let mut outcomes = Vec::new();

    let result: Result<(), AppError> = async {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some(field_name) {
                continue;
            }
            let Some(original_filename) = field.file_name().map(str::to_string) else {
                continue;
            };

            if outcomes.len() >= max_files {
                return Err(AppError::BadRequest(format!(
                    "Too many files. At most {} allowed in field '{}'",
                    max_files, field_name
                )));
            }

            let content_type = field.content_type().map(str::to_string);
            let reader = StreamReader::new(field.map_err(std::io::Error::other));

            let outcome = state
                .media_service
                .stage(&original_filename, content_type.as_deref(), reader)
                .await?;
            outcomes.push(outcome);
        }
        Ok(())
    }
    .await;

    match result {
        Ok(()) => Ok(outcomes),
        Err(e) => {
            // Consume the remaining stream so the client sees the error instead of a reset
            tracing::warn!("Upload failed early: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            state.media_service.discard_all(outcomes).await;
            Err(e)
        }
    }
}

/// Reduces the outcomes of a single-file route to the one staged file
pub async fn single_staged(
    state: &AppState,
    mut outcomes: Vec<StagingOutcome>,
) -> Result<StagedFile, AppError> {
    let Some(first) = outcomes.pop() else {
        return Err(AppError::BadRequest("No file uploaded".to_string()));
    };
    state.media_service.discard_all(outcomes).await;

    match first {
        StagingOutcome::Staged(staged) => Ok(staged),
        StagingOutcome::Rejected { reason, .. } => Err(AppError::UnsupportedMediaType(reason)),
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(e.body_text())
    }
}
