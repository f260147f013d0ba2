use crate::services::media_service::{BatchItemResult, BatchOutcome, HashReport, StoredMedia};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Tenant partition; omitted or blank stores under `media/shared`
    pub restaurant_id: Option<String>,
    /// Media type folder, e.g. `logo` or `gallery`
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    /// Caller-computed fingerprint, echoed back unverified
    pub hash: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UploadMultipleQuery {
    pub restaurant_id: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

#[derive(ToSchema)]
pub struct FileUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(ToSchema)]
pub struct MultiFileUploadForm {
    #[schema(value_type = Vec<String>)]
    pub files: Vec<Vec<u8>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LegacyUploadResponse {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HashResponse {
    pub hash: String,
    pub mime_type: String,
    pub size: u64,
    /// Original client filename
    pub filename: String,
}

impl From<HashReport> for HashResponse {
    fn from(report: HashReport) -> Self {
        Self {
            hash: report.fingerprint,
            mime_type: report.content_type,
            size: report.size,
            filename: report.original_filename,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaUploadResponse {
    pub url: String,
    pub mime_type: String,
    pub size: u64,
    /// Caller-asserted unless hash verification is enabled on the server
    pub hash: String,
    /// Stored filename (`<ms>-<name>`)
    pub filename: String,
}

impl From<StoredMedia> for MediaUploadResponse {
    fn from(media: StoredMedia) -> Self {
        Self {
            url: media.public_url,
            mime_type: media.content_type,
            size: media.size,
            hash: media.fingerprint,
            filename: media.stored_filename,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Stored filename on success, original filename on failure
    pub filename: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<BatchItemResult> for BatchItemResponse {
    fn from(result: BatchItemResult) -> Self {
        match result {
            BatchItemResult::Stored { media, media_type } => Self {
                url: Some(media.public_url),
                mime_type: Some(media.content_type),
                size: Some(media.size),
                hash: Some(media.fingerprint),
                filename: media.stored_filename,
                media_type: Some(media_type),
                success: true,
                error: None,
            },
            BatchItemResult::Failed {
                original_filename,
                error,
            } => Self {
                url: None,
                mime_type: None,
                size: None,
                hash: None,
                filename: original_filename,
                media_type: None,
                success: false,
                error: Some(error),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchUploadResponse {
    pub message: String,
    pub succeeded_count: usize,
    pub failed_count: usize,
    pub results: Vec<BatchItemResponse>,
}

impl From<BatchOutcome> for BatchUploadResponse {
    fn from(batch: BatchOutcome) -> Self {
        Self {
            message: batch.summary(),
            succeeded_count: batch.succeeded,
            failed_count: batch.failed,
            results: batch.results.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct DeleteMediaRequest {
    /// Public URL as returned by the upload routes
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing file URL"))]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
