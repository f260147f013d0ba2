use tempfile::TempPath;

/// A multipart field written to `<upload_root>/temp`. Owned by one pipeline call, which
/// hands it back to `MediaService::discard`. Dropping it (e.g. when the request future is
/// cancelled) removes the temp file as well.
#[derive(Debug)]
pub struct StagedFile {
    pub temp_path: TempPath,
    pub original_filename: String,
    pub content_type: String,
    pub size: u64,
}

/// Result of feeding one multipart field to the staging step
#[derive(Debug)]
pub enum StagingOutcome {
    Staged(StagedFile),
    /// Declared type failed the allowlist; nothing was written
    Rejected {
        original_filename: String,
        content_type: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub public_url: String,
    pub content_type: String,
    pub size: u64,
    /// On the single upload route this is the caller-asserted hash
    pub fingerprint: String,
    pub stored_filename: String,
}

#[derive(Debug, Clone)]
pub struct HashReport {
    pub fingerprint: String,
    pub content_type: String,
    pub size: u64,
    pub original_filename: String,
}

#[derive(Debug, Clone)]
pub enum BatchItemResult {
    Stored {
        media: StoredMedia,
        media_type: String,
    },
    Failed {
        original_filename: String,
        error: String,
    },
}

impl BatchItemResult {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchItemResult::Stored { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchItemResult>,
}

impl BatchOutcome {
    pub fn push(&mut self, result: BatchItemResult) {
        if result.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    pub fn summary(&self) -> String {
        format!(
            "{} files uploaded, {} failed.",
            self.succeeded, self.failed
        )
    }
}
