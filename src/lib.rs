pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::models::MediaKind;
use crate::services::media_client::MediaClient;
use crate::services::metadata::MetadataRecorder;
use crate::services::provider::MediaProvider;
use crate::services::staging::StagingArea;
use crate::services::upload_service::UploadService;
use axum::{
    Router,
    middleware::from_fn,
    routing::{delete, get, post},
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::root::welcome,
        api::handlers::root::health_check,
        api::handlers::media::upload_image,
        api::handlers::media::upload_video,
        api::handlers::media::delete_image,
        api::handlers::media::delete_video,
        api::handlers::media::delete_by_tag,
        api::handlers::media::list_by_tag,
    ),
    components(
        schemas(
            api::handlers::root::WelcomeResponse,
            api::handlers::root::HealthResponse,
            api::handlers::media::UploadResponse,
            api::handlers::media::UploadForm,
            api::handlers::media::MessageResponse,
            api::handlers::media::ListByTagResponse,
            models::MediaKind,
            models::RemoteAsset,
            models::MetadataRecord,
        )
    ),
    tags(
        (name = "media", description = "Upload, delete and list hosted media"),
        (name = "system", description = "Liveness endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub images: Arc<UploadService>,
    pub videos: Arc<UploadService>,
    pub provider_id: &'static str,
}

impl AppState {
    pub fn new(provider: Arc<dyn MediaProvider>, config: &AppConfig) -> Self {
        Self::with_dirs(
            provider,
            &config.staging_dir,
            &config.metadata_dir,
            &config.campaign_tag,
        )
    }

    /// Builds both kinds' services over explicit staging and metadata roots.
    pub fn with_dirs(
        provider: Arc<dyn MediaProvider>,
        staging_root: &Path,
        metadata_root: &Path,
        campaign_tag: &str,
    ) -> Self {
        let service = |kind: MediaKind| {
            Arc::new(UploadService::new(
                StagingArea::new(staging_root, kind),
                MediaClient::new(provider.clone(), kind, campaign_tag),
                MetadataRecorder::new(metadata_root, kind),
            ))
        };

        Self {
            images: service(MediaKind::Image),
            videos: service(MediaKind::Video),
            provider_id: provider.provider_id(),
        }
    }

    pub fn service(&self, kind: MediaKind) -> &UploadService {
        match kind {
            MediaKind::Image => self.images.as_ref(),
            MediaKind::Video => self.videos.as_ref(),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::root::welcome))
        .route("/health", get(api::handlers::root::health_check))
        .route("/upload-image/", post(api::handlers::media::upload_image))
        .route("/upload-video/", post(api::handlers::media::upload_video))
        .route(
            "/delete-image/*public_id",
            delete(api::handlers::media::delete_image),
        )
        .route(
            "/delete-video/*public_id",
            delete(api::handlers::media::delete_video),
        )
        .route(
            "/delete-by-tag/:tag",
            delete(api::handlers::media::delete_by_tag),
        )
        .route("/list-by-tag/:tag", get(api::handlers::media::list_by_tag))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors)
        .with_state(state)
}
