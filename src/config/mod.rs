use crate::models::DEFAULT_CAMPAIGN_TAG;
use std::env;
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Digest used to sign upload and destroy calls. Must match the account's
/// signature setting on the provider side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl std::str::FromStr for SignatureAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" => Ok(SignatureAlgorithm::Sha256),
            other => Err(format!("expected 'sha1' or 'sha256', got '{}'", other)),
        }
    }
}

/// Account credentials for the media provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: ProviderCredentials,

    /// Provider API root (default: https://api.cloudinary.com)
    pub api_base: Url,

    /// Request signature digest (default: sha1)
    pub signature_algorithm: SignatureAlgorithm,

    /// Root of the per-category staging directories (default: "staging")
    pub staging_dir: PathBuf,

    /// Root of the per-category metadata directories (default: "metadata")
    pub metadata_dir: PathBuf,

    /// Campaign tag attached to every upload
    pub campaign_tag: String,

    /// Maximum request body size in bytes (default: 100 MB)
    pub max_file_size: usize,

    pub host: IpAddr,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables. Fails fast when any
    /// provider credential is absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let credentials = ProviderCredentials {
            cloud_name: required("CLOUD_NAME")?,
            api_key: required("API_KEY")?,
            api_secret: required("API_SECRET")?,
        };

        let api_base_raw =
            lookup("CLOUDINARY_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = Url::parse(&api_base_raw).map_err(|e| ConfigError::Invalid {
            key: "CLOUDINARY_API_BASE",
            reason: e.to_string(),
        })?;
        if api_base.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                key: "CLOUDINARY_API_BASE",
                reason: format!("'{}' cannot be used as a base URL", api_base_raw),
            });
        }

        Ok(Self {
            credentials,
            api_base,
            signature_algorithm: parse_or(
                &lookup,
                "SIGNATURE_ALGORITHM",
                SignatureAlgorithm::default(),
            )?,
            staging_dir: lookup("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("staging")),
            metadata_dir: lookup("METADATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("metadata")),
            campaign_tag: lookup("CAMPAIGN_TAG")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CAMPAIGN_TAG.to_string()),
            max_file_size: parse_or(&lookup, "MAX_FILE_SIZE", 100 * 1024 * 1024)?,
            host: parse_or(&lookup, "HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(&lookup, "PORT", 8998)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
