use crate::config::MediaConfig;
use crate::services::storage::{LocalStorageService, StorageService};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Creates the upload root and temp area, then clears staged files left by a previous run
pub async fn setup_storage(config: &MediaConfig) -> Result<Arc<LocalStorageService>> {
    let storage = LocalStorageService::new(&config.upload_root);
    let temp_dir = config.temp_dir();

    storage
        .ensure_dir(&config.upload_root)
        .await
        .context("failed to create upload root")?;
    storage
        .ensure_dir(&temp_dir)
        .await
        .context("failed to create temp directory")?;

    info!("📂 Upload root: {}", config.upload_root.display());

    let swept = sweep_temp_dir(&storage, &temp_dir).await?;
    if swept > 0 {
        info!("🧹 Removed {} stale staged file(s) from {}", swept, temp_dir.display());
    }

    Ok(Arc::new(storage))
}

/// Only safe before the server accepts requests: every file in `temp_dir` is treated as orphaned
pub async fn sweep_temp_dir(storage: &dyn StorageService, temp_dir: &std::path::Path) -> Result<usize> {
    let mut entries = tokio::fs::read_dir(temp_dir)
        .await
        .with_context(|| format!("failed to read {}", temp_dir.display()))?;

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        match storage.delete_file(&entry.path()).await {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!("Could not remove stale staged file: {:#}", e),
        }
    }

    Ok(removed)
}
