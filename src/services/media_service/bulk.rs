use crate::api::error::AppError;

use super::{MediaService, types::*, upload::parse_segment};

impl MediaService {
    /// Fingerprints and stores every staged file independently.
    ///
    /// A failure on one file is recorded in its result entry and processing moves on.
    /// Only malformed requests (missing or invalid `type`/tenant) fail as a whole, and
    /// every staged file is released either way.
    pub async fn upload_many(
        &self,
        outcomes: Vec<StagingOutcome>,
        tenant_id: Option<&str>,
        media_type: Option<&str>,
    ) -> Result<BatchOutcome, AppError> {
        let target = parse_segment(media_type, "type").and_then(|media_type| {
            let media_type =
                media_type.ok_or_else(|| AppError::BadRequest("Missing type".to_string()))?;
            Ok((media_type, parse_segment(tenant_id, "restaurantId")?))
        });

        let (media_type, tenant_id) = match target {
            Ok(target) => target,
            Err(e) => {
                self.discard_all(outcomes).await;
                return Err(e);
            }
        };

        let mut batch = BatchOutcome::default();
        for outcome in outcomes {
            let result = match outcome {
                StagingOutcome::Staged(staged) => {
                    let stored = self
                        .store_one(&staged, tenant_id.as_deref(), &media_type)
                        .await;
                    let original_filename = staged.original_filename.clone();
                    self.discard(staged).await;

                    match stored {
                        Ok(media) => BatchItemResult::Stored {
                            media,
                            media_type: media_type.clone(),
                        },
                        Err(error) => {
                            tracing::error!(
                                "Batch item '{}' failed: {}",
                                original_filename,
                                error
                            );
                            BatchItemResult::Failed {
                                original_filename,
                                error,
                            }
                        }
                    }
                }
                StagingOutcome::Rejected {
                    original_filename,
                    reason,
                    ..
                } => BatchItemResult::Failed {
                    original_filename,
                    error: reason,
                },
            };
            batch.push(result);
        }

        tracing::info!("📦 Batch upload: {}", batch.summary());
        Ok(batch)
    }

    async fn store_one(
        &self,
        staged: &StagedFile,
        tenant_id: Option<&str>,
        media_type: &str,
    ) -> Result<StoredMedia, String> {
        let fingerprint = self
            .fingerprint_staged(staged)
            .await
            .map_err(|e| e.to_string())?;

        self.persist(staged, tenant_id, media_type, fingerprint)
            .await
            .map_err(|e| format!("{:#}", e))
    }
}
