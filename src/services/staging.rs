use crate::models::MediaKind;
use crate::services::provider::MediaError;
use crate::utils::validation::sanitize_filename;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncWriteExt};
use uuid::Uuid;

/// Per-category directory holding inbound files for the lifetime of one request.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

/// A file staged on local disk.
///
/// Owned by the request that created it. Call [`StagedFile::cleanup`] once the
/// remote call is done; if the guard is dropped first (error return, panic,
/// cancelled request) the file is removed in `Drop` instead.
#[derive(Debug)]
pub struct StagedFile {
    local_path: PathBuf,
    original_filename: String,
    created_at: DateTime<Utc>,
    removed: bool,
}

impl StagingArea {
    pub fn new(root: impl AsRef<Path>, kind: MediaKind) -> Self {
        Self {
            dir: root.as_ref().join(kind.dir_name()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `reader` to `<dir>/<YYYYmmddHHMMSSffffff>_<sanitized name>`.
    ///
    /// The name is claimed with create-new semantics; on a clash a random
    /// suffix is inserted, so concurrent requests never share a path.
    pub async fn stage<R>(
        &self,
        original_filename: &str,
        mut reader: R,
    ) -> Result<StagedFile, MediaError>
    where
        R: AsyncRead + Unpin,
    {
        tokio::fs::create_dir_all(&self.dir).await?;

        let created_at = Utc::now();
        let safe_name = sanitize_filename(original_filename);
        let stamp = created_at.format("%Y%m%d%H%M%S%6f");

        let candidate = self.dir.join(format!("{}_{}", stamp, safe_name));
        let (mut file, local_path) = match create_new(&candidate).await {
            Ok(file) => (file, candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let suffix = Uuid::new_v4().simple().to_string();
                let fallback = self
                    .dir
                    .join(format!("{}_{}_{}", stamp, &suffix[..8], safe_name));
                tracing::debug!(
                    "Staging name {} taken, using {}",
                    candidate.display(),
                    fallback.display()
                );
                (create_new(&fallback).await?, fallback)
            }
            Err(e) => return Err(e.into()),
        };

        // From here on the guard owns the path; any failed write removes it.
        let staged = StagedFile {
            local_path,
            original_filename: original_filename.to_string(),
            created_at,
            removed: false,
        };

        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;

        tracing::info!(
            "Staged {} ({} bytes) at {}",
            staged.original_filename,
            written,
            staged.local_path.display()
        );
        Ok(staged)
    }
}

async fn create_new(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.local_path
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Name of the staged file within the staging directory.
    pub fn file_name(&self) -> &str {
        self.local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Removes the staged file. Failures are logged and never returned: the
    /// request outcome is already decided by the time this runs.
    pub async fn cleanup(mut self) {
        self.removed = true;
        match tokio::fs::remove_file(&self.local_path).await {
            Ok(()) => tracing::info!("Cleaned up staged file: {}", self.local_path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove staged file {}: {}",
                self.local_path.display(),
                e
            ),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.local_path) {
            Ok(()) => tracing::info!(
                "Removed staged file on early exit: {}",
                self.local_path.display()
            ),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove staged file {}: {}",
                self.local_path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// Yields a few bytes, then fails.
    struct BrokenReader {
        sent: bool,
    }

    impl AsyncRead for BrokenReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            if self.sent {
                return Poll::Ready(Err(std::io::Error::new(
                    ErrorKind::ConnectionReset,
                    "client went away",
                )));
            }
            self.sent = true;
            buf.put_slice(b"partial");
            Poll::Ready(Ok(()))
        }
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_stage_writes_and_cleanup_removes() {
        let root = tempfile::tempdir().unwrap();
        let area = StagingArea::new(root.path(), MediaKind::Image);

        let staged = area.stage("cat.png", &b"png bytes"[..]).await.unwrap();
        assert!(staged.path().starts_with(root.path().join("images")));
        assert!(staged.file_name().ends_with("_cat.png"));
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"png bytes");
        assert_eq!(staged.original_filename(), "cat.png");

        let path = staged.path().to_path_buf();
        staged.cleanup().await;
        assert!(!path.exists());
        assert_eq!(entries(area.dir()), 0);
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let root = tempfile::tempdir().unwrap();
        let area = StagingArea::new(root.path(), MediaKind::Video);

        let staged = area.stage("clip.mp4", &b"frames"[..]).await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_nothing_behind() {
        let root = tempfile::tempdir().unwrap();
        let area = StagingArea::new(root.path(), MediaKind::Image);

        let err = area
            .stage("cat.png", BrokenReader { sent: false })
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::LocalIo(_)));
        assert_eq!(entries(area.dir()), 0);
    }

    #[tokio::test]
    async fn test_concurrent_same_name_never_collides() {
        let root = tempfile::tempdir().unwrap();
        let area = StagingArea::new(root.path(), MediaKind::Image);

        let (a, b) = tokio::join!(
            area.stage("same.png", &b"first"[..]),
            area.stage("same.png", &b"second"[..])
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.path(), b.path());
        assert_eq!(std::fs::read(a.path()).unwrap(), b"first");
        assert_eq!(std::fs::read(b.path()).unwrap(), b"second");
        assert_eq!(entries(area.dir()), 2);
    }

    #[tokio::test]
    async fn test_name_carries_microsecond_timestamp() {
        let root = tempfile::tempdir().unwrap();
        let area = StagingArea::new(root.path(), MediaKind::Image);

        let staged = area.stage("a.jpg", &b""[..]).await.unwrap();
        let (stamp, rest) = staged.file_name().split_once('_').unwrap();
        assert_eq!(stamp.len(), 20);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(rest, "a.jpg");
        assert_eq!(
            stamp,
            staged.created_at().format("%Y%m%d%H%M%S%6f").to_string()
        );
    }

    #[tokio::test]
    async fn test_zero_byte_file_is_staged() {
        let root = tempfile::tempdir().unwrap();
        let area = StagingArea::new(root.path(), MediaKind::Image);

        let staged = area.stage("empty.png", tokio::io::empty()).await.unwrap();
        assert_eq!(std::fs::metadata(staged.path()).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_traversal_name_stays_inside_staging_dir() {
        let root = tempfile::tempdir().unwrap();
        let area = StagingArea::new(root.path(), MediaKind::Image);

        let staged = area.stage("../../escape.png", &b"x"[..]).await.unwrap();
        assert_eq!(staged.path().parent().unwrap(), area.dir());
        assert_eq!(staged.original_filename(), "../../escape.png");
    }
}
