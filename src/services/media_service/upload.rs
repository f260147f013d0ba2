use crate::api::error::AppError;
use crate::services::storage::is_already_exists;
use crate::utils::hash::HashEngine;
use crate::utils::validation::{normalize_segment, sanitize_filename};
use chrono::Utc;
use std::path::Path;
use std::time::Duration;

use super::{MediaService, types::*};

/// Fresh names tried before a colliding store gives up
const NAME_ATTEMPTS: usize = 5;

/// `<ms>-<sanitized original name>`
pub fn stored_filename(original_filename: &str) -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        sanitize_filename(original_filename)
    )
}

impl MediaService {
    /// Fingerprints a staged file without persisting it
    pub async fn hash_only(&self, staged: StagedFile) -> Result<HashReport, AppError> {
        let result = self.fingerprint_staged(&staged).await;
        let report = result.map(|fingerprint| HashReport {
            fingerprint,
            content_type: staged.content_type.clone(),
            size: staged.size,
            original_filename: staged.original_filename.clone(),
        });
        self.discard(staged).await;
        report
    }

    /// Persists a staged file under its tenant/type folder.
    ///
    /// `hash` is echoed back as given; it is only compared with the stored bytes when
    /// `verify_client_hash` is enabled. The staged file is released on every path.
    pub async fn upload(
        &self,
        staged: StagedFile,
        tenant_id: Option<&str>,
        media_type: Option<&str>,
        hash: Option<&str>,
    ) -> Result<StoredMedia, AppError> {
        let result = self.store_single(&staged, tenant_id, media_type, hash).await;
        self.discard(staged).await;
        result
    }

    /// Legacy flat store directly under the upload root; returns the absolute public URL
    pub async fn upload_flat(&self, staged: StagedFile) -> Result<String, AppError> {
        let result = self.store_flat(&staged).await;
        self.discard(staged).await;
        result
    }

    async fn store_single(
        &self,
        staged: &StagedFile,
        tenant_id: Option<&str>,
        media_type: Option<&str>,
        hash: Option<&str>,
    ) -> Result<StoredMedia, AppError> {
        let media_type = parse_segment(media_type, "type")?;
        let hash = hash.map(str::trim).filter(|h| !h.is_empty());
        let (Some(media_type), Some(hash)) = (media_type, hash) else {
            return Err(AppError::BadRequest(
                "Missing type or hash in query".to_string(),
            ));
        };
        let tenant_id = parse_segment(tenant_id, "restaurantId")?;

        if self.config.verify_client_hash {
            let actual = self.fingerprint_staged(staged).await?;
            if actual != hash {
                tracing::warn!(
                    "Hash mismatch for '{}': client={}, server={}",
                    staged.original_filename,
                    hash,
                    actual
                );
                return Err(AppError::BadRequest(
                    "Hash does not match uploaded content".to_string(),
                ));
            }
        }

        self.persist(staged, tenant_id.as_deref(), &media_type, hash.to_string())
            .await
            .map_err(|e| AppError::Internal(format!("Upload failed: {:#}", e)))
    }

    /// Resolves the destination and copies the staged bytes there.
    ///
    /// Two files with the same name stored within the same millisecond would share a
    /// destination; the loser of that race picks a fresh timestamp instead of overwriting.
    pub(super) async fn persist(
        &self,
        staged: &StagedFile,
        tenant_id: Option<&str>,
        media_type: &str,
        fingerprint: String,
    ) -> anyhow::Result<StoredMedia> {
        for attempt in 1..=NAME_ATTEMPTS {
            let filename = stored_filename(&staged.original_filename);
            let resolved = self
                .resolver
                .resolve(tenant_id, media_type, &filename)
                .await?;

            if !self
                .copy_staged(staged, &resolved.storage_path, attempt)
                .await?
            {
                continue;
            }

            tracing::info!(
                "✅ Stored '{}' as {} ({} bytes)",
                staged.original_filename,
                resolved.public_url,
                staged.size
            );

            return Ok(StoredMedia {
                public_url: resolved.public_url,
                content_type: staged.content_type.clone(),
                size: staged.size,
                fingerprint,
                stored_filename: filename,
            });
        }

        anyhow::bail!(
            "no free file name for '{}' after {} attempts",
            staged.original_filename,
            NAME_ATTEMPTS
        )
    }

    async fn store_flat(&self, staged: &StagedFile) -> Result<String, AppError> {
        let stored: anyhow::Result<String> = async {
            self.storage.ensure_dir(self.resolver.upload_root()).await?;

            for attempt in 1..=NAME_ATTEMPTS {
                let filename = stored_filename(&staged.original_filename);
                let dest = self.resolver.locate_flat(&filename);
                if self.copy_staged(staged, &dest, attempt).await? {
                    return Ok(filename);
                }
            }
            anyhow::bail!(
                "no free file name for '{}' after {} attempts",
                staged.original_filename,
                NAME_ATTEMPTS
            )
        }
        .await;

        let filename =
            stored.map_err(|e| AppError::Internal(format!("Upload failed: {:#}", e)))?;
        tracing::info!("✅ Stored '{}' as {}", staged.original_filename, filename);

        Ok(format!(
            "{}/{}/{}",
            self.config.base_url,
            crate::services::path_resolver::PUBLIC_PREFIX,
            filename
        ))
    }

    /// Returns `false` when `dest` is already taken, after pausing so the next stored
    /// filename carries a later timestamp
    async fn copy_staged(
        &self,
        staged: &StagedFile,
        dest: &Path,
        attempt: usize,
    ) -> anyhow::Result<bool> {
        match self.storage.copy_file(&staged.temp_path, dest).await {
            Ok(_) => Ok(true),
            Err(e) if is_already_exists(&e) => {
                tracing::debug!(
                    "Destination {} taken (attempt {}), retrying with a new name",
                    dest.display(),
                    attempt
                );
                tokio::time::sleep(Duration::from_millis(1)).await;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub(super) async fn fingerprint_staged(&self, staged: &StagedFile) -> Result<String, AppError> {
        let engine = HashEngine::global()
            .await
            .map_err(|e| AppError::Internal(format!("Hash engine unavailable: {:#}", e)))?;
        engine
            .fingerprint_file(&staged.temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Hashing failed: {}", e)))
    }
}

/// Blank means absent; anything that is not a single path segment is a client error
pub(super) fn parse_segment(value: Option<&str>, field: &str) -> Result<Option<String>, AppError> {
    match value {
        Some(v) => normalize_segment(v, field).map_err(|e| AppError::BadRequest(e.to_string())),
        None => Ok(None),
    }
}
