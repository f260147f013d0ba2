use crate::config::MediaConfig;
use crate::services::{path_resolver::PathResolver, storage::StorageService};
use std::io::ErrorKind;
use std::sync::Arc;
use tempfile::TempPath;

pub mod bulk;
pub mod delete;
pub mod staging;
pub mod types;
pub mod upload;

pub use types::{
    BatchItemResult, BatchOutcome, HashReport, StagedFile, StagingOutcome, StoredMedia,
};

pub struct MediaService {
    storage: Arc<dyn StorageService>,
    resolver: PathResolver,
    config: MediaConfig,
}

impl MediaService {
    pub fn new(storage: Arc<dyn StorageService>, config: MediaConfig) -> Self {
        Self {
            resolver: PathResolver::new(storage.clone()),
            storage,
            config,
        }
    }

    /// Removes a staged temp file. Consumes it so it can only be released once.
    pub async fn discard(&self, staged: StagedFile) {
        remove_temp(staged.temp_path).await;
    }

    /// Releases every staged file in `outcomes`
    pub async fn discard_all(&self, outcomes: Vec<StagingOutcome>) {
        for outcome in outcomes {
            if let StagingOutcome::Staged(staged) = outcome {
                self.discard(staged).await;
            }
        }
    }
}

/// Unlinks a temp file off the async worker threads
pub(crate) async fn remove_temp(temp_path: TempPath) {
    let path_display = temp_path.display().to_string();
    match tokio::task::spawn_blocking(move || temp_path.close()).await {
        Ok(Ok(())) => tracing::debug!("🧹 Removed staged file {}", path_display),
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!("Staged file already gone: {}", path_display)
        }
        Ok(Err(e)) => tracing::error!("Failed to remove staged file {}: {}", path_display, e),
        Err(e) => tracing::error!("Cleanup task for {} failed: {}", path_display, e),
    }
}
