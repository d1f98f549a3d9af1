#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{Request, Response};
use cloud_media_gateway::models::{DEFAULT_CAMPAIGN_TAG, MediaKind};
use cloud_media_gateway::services::provider::{
    MediaError, MediaProvider, ProviderResource, ResourcePage, UploadRequest, UploadedAsset,
};
use cloud_media_gateway::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadBehavior {
    Succeed,
    Reject,
    Unreachable,
    MissingUrl,
    RejectEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Upload {
        path: PathBuf,
        existed: bool,
        bytes: Vec<u8>,
        kind: MediaKind,
        folder: String,
        tags: Vec<String>,
        overwrite: bool,
    },
    Destroy {
        public_id: String,
        kind: MediaKind,
    },
    DeleteByTag {
        tag: String,
        kind: MediaKind,
    },
    ResourcesByTag {
        tag: String,
        kind: MediaKind,
        max_results: u32,
        cursor: Option<String>,
    },
}

/// In-memory stand-in for the hosted-media provider that records every call.
pub struct MockProvider {
    upload_behavior: UploadBehavior,
    destroy_result: Result<String, u16>,
    tag_deleted: BTreeMap<String, String>,
    pages: Vec<ResourcePage>,
    failing_page: Option<usize>,
    calls: Mutex<Vec<Call>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            upload_behavior: UploadBehavior::Succeed,
            destroy_result: Ok("ok".to_string()),
            tag_deleted: BTreeMap::new(),
            pages: vec![ResourcePage::default()],
            failing_page: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn uploads(mut self, behavior: UploadBehavior) -> Self {
        self.upload_behavior = behavior;
        self
    }

    pub fn destroy_outcome(mut self, outcome: &str) -> Self {
        self.destroy_result = Ok(outcome.to_string());
        self
    }

    pub fn destroy_fails(mut self, status: u16) -> Self {
        self.destroy_result = Err(status);
        self
    }

    pub fn deletes_by_tag(mut self, ids: &[&str]) -> Self {
        self.tag_deleted = ids
            .iter()
            .map(|id| (id.to_string(), "deleted".to_string()))
            .collect();
        self
    }

    /// Pages of the given sizes, chained with `page-N` cursors. URLs are
    /// numbered in overall order: `https://cdn.test/0.png`, `1.png`, ...
    pub fn pages(mut self, sizes: &[usize]) -> Self {
        let mut n = 0;
        self.pages = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                let resources = (0..size)
                    .map(|_| {
                        let resource = ProviderResource {
                            public_id: Some(format!("public_images/{}", n)),
                            secure_url: Some(format!("https://cdn.test/{}.png", n)),
                        };
                        n += 1;
                        resource
                    })
                    .collect();
                ResourcePage {
                    resources,
                    next_cursor: (i + 1 < sizes.len()).then(|| format!("page-{}", i + 1)),
                }
            })
            .collect();
        self
    }

    pub fn failing_page(mut self, index: usize) -> Self {
        self.failing_page = Some(index);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn upload_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Upload { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MediaProvider for MockProvider {
    fn provider_id(&self) -> &'static str {
        "mock"
    }

    async fn upload(&self, request: UploadRequest<'_>) -> Result<UploadedAsset, MediaError> {
        let existed = request.path.exists();
        let bytes = std::fs::read(request.path).unwrap_or_default();
        let empty = bytes.is_empty();
        let stem = request
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        self.record(Call::Upload {
            path: request.path.to_path_buf(),
            existed,
            bytes,
            kind: request.kind,
            folder: request.folder.to_string(),
            tags: request.tags.to_vec(),
            overwrite: request.overwrite,
        });

        match self.upload_behavior {
            UploadBehavior::Reject => Err(MediaError::provider(401, "Invalid Signature")),
            UploadBehavior::Unreachable => {
                Err(MediaError::Connectivity("connection refused".to_string()))
            }
            UploadBehavior::RejectEmpty if empty => {
                Err(MediaError::provider(400, "Empty file"))
            }
            UploadBehavior::MissingUrl => Ok(UploadedAsset {
                public_id: Some(format!("{}/{}", request.folder, stem)),
                secure_url: None,
                tags: Vec::new(),
            }),
            UploadBehavior::Succeed | UploadBehavior::RejectEmpty => Ok(UploadedAsset {
                public_id: Some(format!("{}/{}", request.folder, stem)),
                secure_url: Some(format!(
                    "https://res.cdn.test/{}/{}/{}",
                    request.kind.resource_type(),
                    request.folder,
                    stem
                )),
                tags: request.tags.to_vec(),
            }),
        }
    }

    async fn destroy(&self, public_id: &str, kind: MediaKind) -> Result<String, MediaError> {
        self.record(Call::Destroy {
            public_id: public_id.to_string(),
            kind,
        });
        self.destroy_result
            .clone()
            .map_err(|status| MediaError::provider(status, "destroy failed"))
    }

    async fn delete_by_tag(
        &self,
        tag: &str,
        kind: MediaKind,
    ) -> Result<BTreeMap<String, String>, MediaError> {
        self.record(Call::DeleteByTag {
            tag: tag.to_string(),
            kind,
        });
        Ok(self.tag_deleted.clone())
    }

    async fn resources_by_tag(
        &self,
        tag: &str,
        kind: MediaKind,
        max_results: u32,
        next_cursor: Option<&str>,
    ) -> Result<ResourcePage, MediaError> {
        self.record(Call::ResourcesByTag {
            tag: tag.to_string(),
            kind,
            max_results,
            cursor: next_cursor.map(str::to_string),
        });

        let index = match next_cursor {
            None => 0,
            Some(cursor) => cursor
                .strip_prefix("page-")
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| MediaError::provider(400, "bad cursor"))?,
        };
        if self.failing_page == Some(index) {
            return Err(MediaError::Connectivity("connection reset".to_string()));
        }
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| MediaError::provider(400, "cursor past end"))
    }
}

/// Router plus the temp directories and provider behind it.
pub struct TestApp {
    pub provider: Arc<MockProvider>,
    pub state: AppState,
    pub staging: TempDir,
    pub metadata: TempDir,
}

impl TestApp {
    pub fn new(provider: MockProvider) -> Self {
        let provider = Arc::new(provider);
        let staging = tempfile::tempdir().unwrap();
        let metadata = tempfile::tempdir().unwrap();
        let state = AppState::with_dirs(
            provider.clone(),
            staging.path(),
            metadata.path(),
            DEFAULT_CAMPAIGN_TAG,
        );
        Self {
            provider,
            state,
            staging,
            metadata,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        create_app(self.state.clone()).oneshot(request).await.unwrap()
    }

    /// Same router with a request body cap, as the server binary installs it.
    pub async fn send_limited(&self, limit: usize, request: Request<Body>) -> Response<Body> {
        create_app(self.state.clone())
            .layer(DefaultBodyLimit::max(limit))
            .oneshot(request)
            .await
            .unwrap()
    }

    pub fn staging_dir(&self, kind: MediaKind) -> PathBuf {
        self.staging.path().join(kind.dir_name())
    }

    pub fn metadata_dir(&self, kind: MediaKind) -> PathBuf {
        self.metadata.path().join(kind.dir_name())
    }
}

pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}

pub fn multipart_upload(uri: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
        Content-Type: application/octet-stream\r\n\r\n",
        boundary = BOUNDARY,
        filename = filename
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
