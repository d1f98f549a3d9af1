use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Marker tag attached to every upload so short-lived assets can be swept later.
pub const TEMPORARY_TAG: &str = "temporary";

/// Default campaign tag; overridable through `CAMPAIGN_TAG`.
pub const DEFAULT_CAMPAIGN_TAG: &str = "linkedin_content_gen";

/// Category of hosted media. Image and video assets live in separate remote
/// folders and are never matched by each other's operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

impl MediaKind {
    /// Resource-type discriminator understood by the provider.
    pub fn resource_type(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Remote folder uploads of this kind are placed in.
    pub fn folder(self) -> &'static str {
        match self {
            MediaKind::Image => "public_images",
            MediaKind::Video => "public_videos",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image => "Image",
            MediaKind::Video => "Video",
        }
    }

    /// Local sub-directory used for staging and metadata.
    pub fn dir_name(self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_type())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RemoteAsset {
    pub public_id: String,
    pub secure_url: String,
    pub resource_kind: MediaKind,
    pub tags: Vec<String>,
}

/// Sidecar written once per successful upload. Never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MetadataRecord {
    pub public_id: String,
    pub url: String,
    pub upload_time: DateTime<Utc>,
    pub original_filename: String,
    pub resource_kind: MediaKind,
}

/// Label set sent with every upload: campaign tag, the temporary marker and
/// an `upload_time_YYYYMMDD_HHMMSS` tag in UTC.
pub fn upload_tags(campaign_tag: &str, now: DateTime<Utc>) -> Vec<String> {
    vec![
        campaign_tag.to_string(),
        TEMPORARY_TAG.to_string(),
        format!("upload_time_{}", now.format("%Y%m%d_%H%M%S")),
    ]
}
