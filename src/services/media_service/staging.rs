use crate::api::error::AppError;
use crate::utils::validation::{normalize_mime_type, sanitize_filename, validate_mime_type};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use chrono::Utc;
use std::path::PathBuf;
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use super::{MediaService, remove_temp, types::*};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

impl MediaService {
    /// Streams one upload into the temp area.
    ///
    /// The declared type is checked before anything touches disk. Streams larger than
    /// `max_file_size` are cut off and their partial temp file removed.
    pub async fn stage<R>(
        &self,
        original_filename: &str,
        content_type: Option<&str>,
        mut reader: R,
    ) -> Result<StagingOutcome, AppError>
    where
        R: AsyncRead + Unpin,
    {
        let declared = content_type.unwrap_or("application/octet-stream");
        if let Err(e) = validate_mime_type(declared, &self.config.allowed_mime_types) {
            tracing::warn!(
                "Rejected '{}' with declared type '{}'",
                original_filename,
                declared
            );
            return Ok(StagingOutcome::Rejected {
                original_filename: original_filename.to_string(),
                content_type: declared.to_string(),
                reason: e.to_string(),
            });
        }

        let temp_dir = self.config.temp_dir();
        self.storage
            .ensure_dir(&temp_dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to prepare temp dir: {:#}", e)))?;

        let (file, temp_path) = create_temp_file(temp_dir, original_filename).await?;
        let mut file = tokio::fs::File::from_std(file);

        let copied = copy_with_limit(&mut reader, &mut file, self.config.max_file_size).await;
        let flushed = match copied {
            Ok(size) => file.flush().await.map(|_| size).map_err(AppError::from),
            Err(e) => Err(e),
        };
        drop(file);

        match flushed {
            Ok(size) => {
                tracing::info!(
                    "📥 Staged '{}' ({} bytes) at {}",
                    original_filename,
                    size,
                    temp_path.display()
                );
                Ok(StagingOutcome::Staged(StagedFile {
                    temp_path,
                    original_filename: original_filename.to_string(),
                    content_type: normalize_mime_type(declared),
                    size,
                }))
            }
            Err(e) => {
                remove_temp(temp_path).await;
                Err(e)
            }
        }
    }
}

/// `<ms>-<random>-<sanitized name>`, created exclusively so concurrent uploads never share a file.
/// The returned `TempPath` unlinks the file when dropped.
async fn create_temp_file(
    temp_dir: PathBuf,
    original_filename: &str,
) -> Result<(std::fs::File, TempPath), AppError> {
    let prefix = format!("{}-", Utc::now().timestamp_millis());
    let suffix = format!("-{}", sanitize_filename(original_filename));

    tokio::task::spawn_blocking(move || {
        tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .rand_bytes(6)
            .tempfile_in(&temp_dir)
            .map(|file| file.into_parts())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Staging task failed: {}", e)))?
    .map_err(AppError::from)
}

async fn copy_with_limit<R, W>(reader: &mut R, writer: &mut W, limit: usize) -> Result<u64, AppError>
where
    R: AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total: u64 = 0;

    loop {
        let n = reader.read(&mut buffer).await.map_err(read_error)?;
        if n == 0 {
            return Ok(total);
        }

        total += n as u64;
        if total > limit as u64 {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the maximum allowed size of {} MB",
                limit / 1024 / 1024
            )));
        }

        writer.write_all(&buffer[..n]).await?;
    }
}

fn read_error(e: std::io::Error) -> AppError {
    let status = e
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<MultipartError>())
        .map(MultipartError::status);

    if status == Some(StatusCode::PAYLOAD_TOO_LARGE) {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(format!("Failed to read upload: {}", e))
    }
}
