use super::{MediaError, MediaProvider, ResourcePage, UploadRequest, UploadedAsset};
use crate::config::{ProviderCredentials, SignatureAlgorithm};
use crate::models::MediaKind;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tokio_util::io::ReaderStream;
use url::Url;

/// Cloudinary upload and admin APIs over HTTPS.
///
/// Upload and destroy are signed requests; the tag endpoints belong to the
/// admin API and use basic auth with the key/secret pair.
pub struct CloudinaryProvider {
    client: Client,
    credentials: ProviderCredentials,
    api_base: Url,
    signature_algorithm: SignatureAlgorithm,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: Option<String>,
}

#[derive(Deserialize)]
struct DeleteByTagResponse {
    #[serde(default)]
    deleted: BTreeMap<String, String>,
}

impl CloudinaryProvider {
    pub fn new(
        credentials: ProviderCredentials,
        api_base: Url,
        signature_algorithm: SignatureAlgorithm,
    ) -> Self {
        Self {
            client: Client::new(),
            credentials,
            api_base,
            signature_algorithm,
        }
    }

    /// `{base}/v1_1/{cloud}/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, MediaError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                MediaError::Connectivity(format!("API base '{}' cannot carry a path", self.api_base))
            })?
            .pop_if_empty()
            .push("v1_1")
            .push(&self.credentials.cloud_name)
            .extend(segments);
        Ok(url)
    }

    fn signed(&self, mut params: BTreeMap<&'static str, String>) -> BTreeMap<&'static str, String> {
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = sign(&params, &self.credentials.api_secret, self.signature_algorithm);
        params.insert("api_key", self.credentials.api_key.clone());
        params.insert("signature", signature);
        params
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, MediaError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(MediaError::provider(status.as_u16(), message));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            MediaError::provider(status.as_u16(), format!("Malformed provider response: {}", e))
        })
    }
}

/// Request signature: parameters sorted by name, joined as `k=v&k=v`, secret
/// appended, hex digest with the account's algorithm.
pub fn sign(
    params: &BTreeMap<&str, String>,
    api_secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let to_sign = params
        .iter()
        .filter(|(key, value)| {
            !value.is_empty()
                && !matches!(
                    **key,
                    "file" | "api_key" | "resource_type" | "cloud_name" | "signature"
                )
        })
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    match algorithm {
        SignatureAlgorithm::Sha1 => hex_digest::<Sha1>(&to_sign, api_secret),
        SignatureAlgorithm::Sha256 => hex_digest::<Sha256>(&to_sign, api_secret),
    }
}

fn hex_digest<D: Digest>(to_sign: &str, api_secret: &str) -> String {
    let mut hasher = D::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaProvider for CloudinaryProvider {
    fn provider_id(&self) -> &'static str {
        "cloudinary"
    }

    async fn upload(&self, request: UploadRequest<'_>) -> Result<UploadedAsset, MediaError> {
        let url = self.endpoint(&[request.kind.resource_type(), "upload"])?;

        let mut params = BTreeMap::new();
        params.insert("folder", request.folder.to_string());
        params.insert("overwrite", request.overwrite.to_string());
        params.insert("tags", request.tags.join(","));
        let params = self.signed(params);

        let file = tokio::fs::File::open(request.path).await?;
        let length = file.metadata().await?.len();
        let file_name = request
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
            .file_name(file_name);

        let form = params
            .into_iter()
            .fold(Form::new().part("file", part), |form, (key, value)| {
                form.text(key, value)
            });

        tracing::debug!("Uploading {} ({} bytes) to {}", request.path.display(), length, url);
        let response = self.client.post(url).multipart(form).send().await?;
        Self::read_json(response).await
    }

    async fn destroy(&self, public_id: &str, kind: MediaKind) -> Result<String, MediaError> {
        let url = self.endpoint(&[kind.resource_type(), "destroy"])?;

        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        let params = self.signed(params);

        let response = self.client.post(url).form(&params).send().await?;
        let body: DestroyResponse = Self::read_json(response).await?;
        Ok(body.result.unwrap_or_default())
    }

    async fn delete_by_tag(
        &self,
        tag: &str,
        kind: MediaKind,
    ) -> Result<BTreeMap<String, String>, MediaError> {
        let url = self.endpoint(&["resources", kind.resource_type(), "tags", tag])?;

        let response = self
            .client
            .delete(url)
            .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret))
            .send()
            .await?;
        let body: DeleteByTagResponse = Self::read_json(response).await?;
        Ok(body.deleted)
    }

    async fn resources_by_tag(
        &self,
        tag: &str,
        kind: MediaKind,
        max_results: u32,
        next_cursor: Option<&str>,
    ) -> Result<ResourcePage, MediaError> {
        let mut url = self.endpoint(&["resources", kind.resource_type(), "tags", tag])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("max_results", &max_results.to_string());
            if let Some(cursor) = next_cursor {
                query.append_pair("next_cursor", cursor);
            }
        }

        let response = self
            .client
            .get(url)
            .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret))
            .send()
            .await?;
        Self::read_json(response).await
    }
}
