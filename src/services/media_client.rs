use crate::models::{MediaKind, RemoteAsset, upload_tags};
use crate::services::provider::{MAX_PAGE_SIZE, MediaError, MediaProvider, UploadRequest};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

/// Token that must be given, in any letter case, to run a bulk delete.
pub const CONFIRMATION_TOKEN: &str = "yes";

/// Answer to the "are you sure" question guarding bulk deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Denied,
}

impl Confirmation {
    /// Only an exact case-insensitive `yes` confirms; anything else, including
    /// surrounding whitespace, is a denial.
    pub fn parse(input: &str) -> Self {
        if input.eq_ignore_ascii_case(CONFIRMATION_TOKEN) {
            Confirmation::Confirmed
        } else {
            Confirmation::Denied
        }
    }

    pub fn from_option(input: Option<&str>) -> Self {
        input.map(Self::parse).unwrap_or(Confirmation::Denied)
    }
}

/// Media operations scoped to one [`MediaKind`].
///
/// Every operation reports a classified [`MediaError`] instead of an empty
/// sentinel; failures are logged here so callers can fold them however their
/// contract demands.
#[derive(Clone)]
pub struct MediaClient {
    provider: Arc<dyn MediaProvider>,
    kind: MediaKind,
    campaign_tag: String,
}

impl MediaClient {
    pub fn new(
        provider: Arc<dyn MediaProvider>,
        kind: MediaKind,
        campaign_tag: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            kind,
            campaign_tag: campaign_tag.into(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Uploads a local file as a brand-new asset (no overwrite), tagged with
    /// the campaign tag, the temporary marker and the UTC upload time.
    pub async fn upload(&self, local_path: &Path) -> Result<RemoteAsset, MediaError> {
        let tags = upload_tags(&self.campaign_tag, Utc::now());
        let request = UploadRequest {
            path: local_path,
            kind: self.kind,
            folder: self.kind.folder(),
            tags: &tags,
            overwrite: false,
        };

        let result = self.provider.upload(request).await.and_then(|asset| {
            match (asset.secure_url, asset.public_id) {
                (Some(secure_url), Some(public_id))
                    if !secure_url.is_empty() && !public_id.is_empty() =>
                {
                    Ok(RemoteAsset {
                        public_id,
                        secure_url,
                        resource_kind: self.kind,
                        tags: if asset.tags.is_empty() {
                            tags.clone()
                        } else {
                            asset.tags
                        },
                    })
                }
                _ => Err(MediaError::provider(
                    200,
                    "Upload response is missing secure_url or public_id",
                )),
            }
        });

        match &result {
            Ok(asset) => tracing::info!(
                "Upload successful via {}. Public ID: {}",
                self.provider.provider_id(),
                asset.public_id
            ),
            Err(e) => tracing::error!(
                kind = e.kind(),
                "{} upload failed for {}: {}",
                self.kind,
                local_path.display(),
                e
            ),
        }
        result
    }

    /// Destroys one asset. `Ok(true)` only when the provider reports `ok`;
    /// an unknown id gives `Ok(false)`.
    pub async fn delete(&self, public_id: &str) -> Result<bool, MediaError> {
        match self.provider.destroy(public_id, self.kind).await {
            Ok(outcome) if outcome == "ok" => {
                tracing::info!("Deleted {} '{}'", self.kind, public_id);
                Ok(true)
            }
            Ok(outcome) => {
                tracing::warn!(
                    "Deletion of {} '{}' not performed. Result: {}",
                    self.kind,
                    public_id,
                    outcome
                );
                Ok(false)
            }
            Err(e) => {
                tracing::error!(
                    kind = e.kind(),
                    "Deletion of {} '{}' failed: {}",
                    self.kind,
                    public_id,
                    e
                );
                Err(e)
            }
        }
    }

    /// Irreversibly deletes every asset carrying `tag`. Without an explicit
    /// confirmation the provider is never contacted. `Ok(true)` iff at least
    /// one item was reported deleted.
    pub async fn delete_by_tag(
        &self,
        tag: &str,
        confirmation: Confirmation,
    ) -> Result<bool, MediaError> {
        if confirmation != Confirmation::Confirmed {
            tracing::warn!(
                "Deletion of all {}s tagged '{}' cancelled: not confirmed",
                self.kind,
                tag
            );
            return Err(MediaError::ConfirmationDenied {
                tag: tag.to_string(),
            });
        }

        tracing::warn!("Deleting all {}s tagged '{}'", self.kind, tag);
        match self.provider.delete_by_tag(tag, self.kind).await {
            Ok(deleted) if !deleted.is_empty() => {
                tracing::info!(
                    "Deleted {} {}(s) tagged '{}'",
                    deleted.len(),
                    self.kind,
                    tag
                );
                Ok(true)
            }
            Ok(_) => {
                tracing::warn!("No {}s matched tag '{}'", self.kind, tag);
                Ok(false)
            }
            Err(e) => {
                tracing::error!(kind = e.kind(), "Deletion by tag '{}' failed: {}", tag, e);
                Err(e)
            }
        }
    }

    /// Secure URLs of every asset carrying `tag`, in provider order. Pages are
    /// followed until the provider stops returning a cursor; an error on any
    /// page discards what was gathered so far.
    pub async fn list_by_tag(&self, tag: &str) -> Result<Vec<String>, MediaError> {
        let mut urls = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = match self
                .provider
                .resources_by_tag(tag, self.kind, MAX_PAGE_SIZE, cursor.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!(
                        kind = e.kind(),
                        "Listing {}s tagged '{}' failed: {}",
                        self.kind,
                        tag,
                        e
                    );
                    return Err(e);
                }
            };

            let fetched = page.resources.len();
            urls.extend(page.resources.into_iter().filter_map(|r| r.secure_url));

            cursor = page.next_cursor.filter(|c| !c.is_empty());
            if cursor.is_none() {
                break;
            }
            tracing::debug!(
                "Fetched {} {}s for tag '{}'. Total so far: {}. Fetching next page...",
                fetched,
                self.kind,
                tag,
                urls.len()
            );
        }

        tracing::info!("Found {} {} URL(s) tagged '{}'", urls.len(), self.kind, tag);
        Ok(urls)
    }
}
