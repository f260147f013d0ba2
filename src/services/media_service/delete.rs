use crate::api::error::AppError;

use super::MediaService;

impl MediaService {
    /// Unlinks a stored file by its public URL.
    ///
    /// Returns whether a file was actually removed. Missing files and unlink failures are
    /// logged, never returned: callers always get an acknowledgement.
    pub async fn delete_by_url(&self, url: &str) -> Result<bool, AppError> {
        if url.trim().is_empty() {
            return Err(AppError::BadRequest("Missing file URL".to_string()));
        }

        let path = self
            .resolver
            .storage_path_for_url(url)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid file URL: {}", url)))?;

        match self.storage.delete_file(&path).await {
            Ok(true) => {
                tracing::info!("🗑️  Deleted {}", path.display());
                Ok(true)
            }
            Ok(false) => {
                tracing::warn!("File not found or could not be deleted: {}", url);
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("File not found or could not be deleted: {} ({:#})", url, e);
                Ok(false)
            }
        }
    }
}
