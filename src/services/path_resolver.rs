use crate::config::STAGING_DIR;
use crate::services::storage::StorageService;
use crate::utils::validation::is_contained_relative;
use anyhow::Result;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Prefix of every public URL handed back to clients
pub const PUBLIC_PREFIX: &str = "uploads";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub storage_dir: PathBuf,
    pub storage_path: PathBuf,
    pub public_url: String,
}

/// Maps (tenant, media type, stored filename) onto the upload tree.
///
/// `restaurant_<tenant>/<type>` for tenant uploads, `media/shared/<type>` otherwise.
/// Public URLs mirror the same layout under `uploads/`.
pub struct PathResolver {
    storage: Arc<dyn StorageService>,
}

impl PathResolver {
    pub fn new(storage: Arc<dyn StorageService>) -> Self {
        Self { storage }
    }

    pub fn upload_root(&self) -> &Path {
        self.storage.root()
    }

    /// Computes the destination without touching the filesystem
    pub fn locate(&self, tenant_id: Option<&str>, media_type: &str, filename: &str) -> ResolvedPath {
        let segments = relative_segments(tenant_id, media_type.trim());

        let storage_dir = segments
            .iter()
            .fold(self.upload_root().to_path_buf(), |dir, s| dir.join(s));
        let storage_path = storage_dir.join(filename);
        let public_url = format!("{}/{}/{}", PUBLIC_PREFIX, segments.join("/"), filename);

        ResolvedPath {
            storage_dir,
            storage_path,
            public_url,
        }
    }

    /// Computes the destination and makes sure its directory exists
    pub async fn resolve(
        &self,
        tenant_id: Option<&str>,
        media_type: &str,
        filename: &str,
    ) -> Result<ResolvedPath> {
        let resolved = self.locate(tenant_id, media_type, filename);
        self.storage.ensure_dir(&resolved.storage_dir).await?;
        Ok(resolved)
    }

    /// Flat destination directly under the upload root, used by the legacy route
    pub fn locate_flat(&self, filename: &str) -> PathBuf {
        self.upload_root().join(filename)
    }

    /// Maps a public URL (with or without the `uploads/` prefix) back onto the upload root.
    /// Returns `None` when the path would leave the root or points into the staging area.
    pub fn storage_path_for_url(&self, url: &str) -> Option<PathBuf> {
        let relative = url.trim().trim_start_matches('/');
        let relative = relative
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(relative);
        let relative = Path::new(relative);
        if !is_contained_relative(relative) || is_staging_path(relative) {
            return None;
        }
        Some(self.upload_root().join(relative))
    }
}

fn is_staging_path(relative: &Path) -> bool {
    relative
        .components()
        .find(|c| matches!(c, Component::Normal(_)))
        .is_some_and(|first| first.as_os_str() == STAGING_DIR)
}

fn relative_segments(tenant_id: Option<&str>, media_type: &str) -> Vec<String> {
    match tenant_id {
        Some(tenant) => vec![format!("restaurant_{}", tenant), media_type.to_string()],
        None => vec![
            "media".to_string(),
            "shared".to_string(),
            media_type.to_string(),
        ],
    }
}
