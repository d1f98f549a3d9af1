use crate::models::MediaKind;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

pub mod cloudinary;

/// Largest page the provider serves for tag listings.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Classified failure of a media operation.
#[derive(Error, Debug)]
pub enum MediaError {
    /// The provider answered but rejected the call (auth, quota, bad asset,
    /// or a response we could not make sense of).
    #[error("Provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// The provider could not be reached or the exchange broke off.
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Local I/O error: {0}")]
    LocalIo(#[from] std::io::Error),

    #[error("Deletion of tag '{tag}' was not confirmed")]
    ConfirmationDenied { tag: String },
}

impl MediaError {
    pub fn provider(status: u16, message: impl Into<String>) -> Self {
        MediaError::Provider {
            status,
            message: message.into(),
        }
    }

    /// Short machine-readable name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            MediaError::Provider { .. } => "provider",
            MediaError::Connectivity(_) => "connectivity",
            MediaError::LocalIo(_) => "local_io",
            MediaError::ConfirmationDenied { .. } => "confirmation_denied",
        }
    }
}

impl From<reqwest::Error> for MediaError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => MediaError::provider(status.as_u16(), err.to_string()),
            None => MediaError::Connectivity(err.to_string()),
        }
    }
}

pub struct UploadRequest<'a> {
    pub path: &'a Path,
    pub kind: MediaKind,
    pub folder: &'a str,
    pub tags: &'a [String],
    pub overwrite: bool,
}

/// Fields of an upload response. Anything may be missing in a malformed
/// answer, so validation happens in the media client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadedAsset {
    pub public_id: Option<String>,
    pub secure_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderResource {
    pub public_id: Option<String>,
    pub secure_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourcePage {
    #[serde(default)]
    pub resources: Vec<ProviderResource>,
    pub next_cursor: Option<String>,
}

/// Primitive calls against a hosted-media provider.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Provider identifier used in logs (e.g. "cloudinary")
    fn provider_id(&self) -> &'static str;

    async fn upload(&self, request: UploadRequest<'_>) -> Result<UploadedAsset, MediaError>;

    /// Destroy one asset; returns the provider's outcome string ("ok", "not found", ...)
    async fn destroy(&self, public_id: &str, kind: MediaKind) -> Result<String, MediaError>;

    /// Bulk delete every asset carrying `tag`; returns the deleted-items map
    async fn delete_by_tag(
        &self,
        tag: &str,
        kind: MediaKind,
    ) -> Result<BTreeMap<String, String>, MediaError>;

    /// One page of assets carrying `tag`
    async fn resources_by_tag(
        &self,
        tag: &str,
        kind: MediaKind,
        max_results: u32,
        next_cursor: Option<&str>,
    ) -> Result<ResourcePage, MediaError>;
}
