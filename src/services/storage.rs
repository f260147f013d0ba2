use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates `dir` and its parents. Succeeds when it already exists.
    async fn ensure_dir(&self, dir: &Path) -> Result<()>;
    /// Byte-for-byte copy into a new file, returns the number of bytes written.
    /// Fails with `ErrorKind::AlreadyExists` instead of overwriting `dest`.
    async fn copy_file(&self, source: &Path, dest: &Path) -> Result<u64>;
    /// Returns `false` when there was nothing to delete
    async fn delete_file(&self, path: &Path) -> Result<bool>;
    async fn file_exists(&self, path: &Path) -> Result<bool>;
    /// Root every stored path lives under
    fn root(&self) -> &Path;
}

/// Local filesystem backend rooted at the upload directory
pub struct LocalStorageService {
    root: PathBuf,
}

impl LocalStorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn ensure_dir(&self, dir: &Path) -> Result<()> {
        match tokio::fs::create_dir_all(dir).await {
            Ok(()) => Ok(()),
            // Lost a creation race with another request
            Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to create {}", dir.display())),
        }
    }

    async fn copy_file(&self, source: &Path, dest: &Path) -> Result<u64> {
        let mut src = tokio::fs::File::open(source)
            .await
            .with_context(|| format!("failed to open {}", source.display()))?;
        let mut dst = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .await
            .with_context(|| format!("failed to create {}", dest.display()))?;

        let copied = async {
            let written = tokio::io::copy(&mut src, &mut dst).await?;
            dst.flush().await?;
            Ok::<_, std::io::Error>(written)
        }
        .await;

        match copied {
            Ok(written) => Ok(written),
            Err(e) => {
                drop(dst);
                if let Err(cleanup) = tokio::fs::remove_file(dest).await {
                    tracing::warn!(
                        "Failed to remove partial copy {}: {}",
                        dest.display(),
                        cleanup
                    );
                }
                Err(e).with_context(|| {
                    format!(
                        "failed to copy {} to {}",
                        source.display(),
                        dest.display()
                    )
                })
            }
        }
    }

    async fn delete_file(&self, path: &Path) -> Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("failed to delete {}", path.display())),
        }
    }

    async fn file_exists(&self, path: &Path) -> Result<bool> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

/// Whether a storage error was caused by the destination already existing
pub fn is_already_exists(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == ErrorKind::AlreadyExists)
    })
}
