use crate::models::{MediaKind, MetadataRecord};
use crate::services::provider::MediaError;
use std::path::{Path, PathBuf};
use std::io::ErrorKind;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Writes one JSON sidecar per successful upload under
/// `<metadata root>/<kind dir>/`. Records are never read back or rewritten.
#[derive(Debug, Clone)]
pub struct MetadataRecorder {
    dir: PathBuf,
}

impl MetadataRecorder {
    pub fn new(root: impl AsRef<Path>, kind: MediaKind) -> Self {
        Self {
            dir: root.as_ref().join(kind.dir_name()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sidecar path for a staged file: same stem, `.json` extension.
    pub fn record_path(&self, staged_file_name: &str) -> PathBuf {
        self.dir.join(Path::new(staged_file_name).with_extension("json"))
    }

    /// Used when [`Self::record_path`] is already taken by a staged file that
    /// differs only in extension: the full staged name plus `.json`.
    pub fn fallback_record_path(&self, staged_file_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", staged_file_name))
    }

    /// Writes the sidecar with create-new semantics. Existing records are
    /// never overwritten; a clash on the primary name moves to
    /// [`Self::fallback_record_path`].
    pub async fn record(
        &self,
        staged_file_name: &str,
        record: &MetadataRecord,
    ) -> Result<PathBuf, MediaError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let body = serde_json::to_vec_pretty(record)
            .map_err(|e| MediaError::LocalIo(std::io::Error::other(e)))?;

        let primary = self.record_path(staged_file_name);
        let (mut file, path) = match create_new(&primary).await {
            Ok(file) => (file, primary),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let fallback = self.fallback_record_path(staged_file_name);
                tracing::debug!(
                    "Metadata record {} taken, using {}",
                    primary.display(),
                    fallback.display()
                );
                (create_new(&fallback).await?, fallback)
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&body).await?;
        file.flush().await?;

        tracing::info!("Metadata for {} saved to {}", record.public_id, path.display());
        Ok(path)
    }
}

async fn create_new(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}
