use crate::models::{MediaKind, MetadataRecord, RemoteAsset};
use crate::services::media_client::MediaClient;
use crate::services::metadata::MetadataRecorder;
use crate::services::provider::MediaError;
use crate::services::staging::StagingArea;
use chrono::Utc;
use std::path::PathBuf;
use tokio::io::AsyncRead;

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub asset: RemoteAsset,
    /// Where the file was staged. Already removed when this is returned.
    pub local_path: PathBuf,
    pub metadata_saved: bool,
}

/// Stage, forward, record, clean up: one inbound upload of a single kind.
#[derive(Clone)]
pub struct UploadService {
    staging: StagingArea,
    client: MediaClient,
    recorder: MetadataRecorder,
}

impl UploadService {
    pub fn new(staging: StagingArea, client: MediaClient, recorder: MetadataRecorder) -> Self {
        Self {
            staging,
            client,
            recorder,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.client.kind()
    }

    pub fn client(&self) -> &MediaClient {
        &self.client
    }

    /// Runs one upload request to completion.
    ///
    /// A staging failure ends the request before the provider is contacted.
    /// The staged file is removed on every path out of here; if this future is
    /// dropped mid-flight the staged file's guard removes it instead.
    ///
    /// Metadata is best-effort: when the sidecar cannot be written the remote
    /// asset is kept and `metadata_saved` is false. No compensating delete is
    /// issued.
    pub async fn upload<R>(
        &self,
        original_filename: &str,
        reader: R,
    ) -> Result<UploadOutcome, MediaError>
    where
        R: AsyncRead + Unpin,
    {
        let staged = self.staging.stage(original_filename, reader).await?;
        let local_path = staged.path().to_path_buf();

        let result = match self.client.upload(staged.path()).await {
            Ok(asset) => {
                let record = MetadataRecord {
                    public_id: asset.public_id.clone(),
                    url: asset.secure_url.clone(),
                    upload_time: Utc::now(),
                    original_filename: staged.original_filename().to_string(),
                    resource_kind: asset.resource_kind,
                };
                let metadata_saved = match self.recorder.record(staged.file_name(), &record).await
                {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::warn!(
                            "Remote asset {} has no local metadata record: {}",
                            asset.public_id,
                            e
                        );
                        false
                    }
                };
                Ok(UploadOutcome {
                    asset,
                    local_path,
                    metadata_saved,
                })
            }
            Err(e) => Err(e),
        };

        staged.cleanup().await;
        result
    }
}
