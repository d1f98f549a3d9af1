use crate::AppState;
use crate::api::error::AppError;
use crate::models::MediaKind;
use crate::services::media_client::{Confirmation, MediaClient};
use crate::services::provider::MediaError;
use crate::services::upload_service::UploadService;
use crate::utils::validation::FALLBACK_FILENAME;
use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartError,
    },
    http::StatusCode,
};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::io::StreamReader;
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub url: String,
    pub public_id: String,
    pub local_path: String,
    pub metadata_saved: bool,
}

/// Multipart body of the upload endpoints.
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ListByTagResponse {
    pub tag: String,
    pub image_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct KindQuery {
    /// `image` (default) or `video`
    pub kind: Option<MediaKind>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteByTagQuery {
    /// Must be `yes` (any case) for the deletion to run
    pub confirm: Option<String>,
    /// `image` (default) or `video`
    pub kind: Option<MediaKind>,
}

#[utoipa::path(
    post,
    path = "/upload-image/",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image uploaded", body = UploadResponse),
        (status = 400, description = "No file field in the request"),
        (status = 413, description = "Request body exceeds the configured limit"),
        (status = 500, description = "Staging or remote upload failed")
    ),
    tag = "media"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    upload_media(state.service(MediaKind::Image), multipart).await
}

#[utoipa::path(
    post,
    path = "/upload-video/",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video uploaded", body = UploadResponse),
        (status = 400, description = "No file field in the request"),
        (status = 413, description = "Request body exceeds the configured limit"),
        (status = 500, description = "Staging or remote upload failed")
    ),
    tag = "media"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    upload_media(state.service(MediaKind::Video), multipart).await
}

async fn upload_media(
    service: &UploadService,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_filename = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or(FALLBACK_FILENAME)
            .to_string();
        let reader = StreamReader::new(field.map_err(std::io::Error::other));

        let outcome = service
            .upload(&original_filename, reader)
            .await
            .map_err(|e| match e {
                MediaError::LocalIo(err) => match err
                    .get_ref()
                    .and_then(|inner| inner.downcast_ref::<MultipartError>())
                {
                    Some(cause) => multipart_error(cause),
                    None => AppError::Internal(format!(
                        "An unexpected error occurred during upload: {}",
                        err
                    )),
                },
                _ => AppError::Upstream(
                    "Remote upload failed: check server logs for details.".to_string(),
                ),
            })?;

        return Ok(Json(UploadResponse {
            message: format!("{} uploaded successfully", service.kind().label()),
            url: outcome.asset.secure_url,
            public_id: outcome.asset.public_id,
            local_path: outcome.local_path.display().to_string(),
            metadata_saved: outcome.metadata_saved,
        }));
    }

    Err(AppError::BadRequest(
        "Multipart field 'file' is required".to_string(),
    ))
}

/// Body errors surface either from `next_field` or from the field stream
/// while staging; both keep the status axum assigned to them.
fn multipart_error(err: &MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

#[utoipa::path(
    delete,
    path = "/delete-image/{public_id}",
    params(
        ("public_id" = String, Path, description = "Provider public ID, may contain '/'")
    ),
    responses(
        (status = 200, description = "Image deleted", body = MessageResponse),
        (status = 404, description = "Image not found or could not be deleted")
    ),
    tag = "media"
)]
pub async fn delete_image(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    delete_media(state.service(MediaKind::Image).client(), &public_id).await
}

#[utoipa::path(
    delete,
    path = "/delete-video/{public_id}",
    params(
        ("public_id" = String, Path, description = "Provider public ID, may contain '/'")
    ),
    responses(
        (status = 200, description = "Video deleted", body = MessageResponse),
        (status = 404, description = "Video not found or could not be deleted")
    ),
    tag = "media"
)]
pub async fn delete_video(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    delete_media(state.service(MediaKind::Video).client(), &public_id).await
}

async fn delete_media(
    client: &MediaClient,
    public_id: &str,
) -> Result<Json<MessageResponse>, AppError> {
    let label = client.kind().label();
    match client.delete(public_id).await {
        Ok(true) => Ok(Json(MessageResponse {
            message: format!("{} '{}' deleted successfully.", label, public_id),
        })),
        Ok(false) | Err(_) => Err(AppError::NotFound(format!(
            "{} '{}' not found or could not be deleted.",
            label, public_id
        ))),
    }
}

#[utoipa::path(
    delete,
    path = "/delete-by-tag/{tag}",
    params(
        ("tag" = String, Path, description = "Tag whose assets are deleted"),
        DeleteByTagQuery
    ),
    responses(
        (status = 200, description = "Deletion command accepted", body = MessageResponse),
        (status = 500, description = "Not confirmed, nothing matched, or the provider failed")
    ),
    tag = "media"
)]
pub async fn delete_by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    Query(query): Query<DeleteByTagQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let kind = query.kind.unwrap_or_default();
    let confirmation = Confirmation::from_option(query.confirm.as_deref());

    match state.service(kind).client().delete_by_tag(&tag, confirmation).await {
        Ok(true) => Ok(Json(MessageResponse {
            message: format!("Deletion command sent for {}s tagged '{}'.", kind, tag),
        })),
        Err(MediaError::ConfirmationDenied { .. }) => Err(AppError::Upstream(format!(
            "Deletion of {}s tagged '{}' requires confirm=yes.",
            kind, tag
        ))),
        Ok(false) | Err(_) => Err(AppError::Upstream(format!(
            "Failed to initiate deletion for tag '{}'.",
            tag
        ))),
    }
}

#[utoipa::path(
    get,
    path = "/list-by-tag/{tag}",
    params(
        ("tag" = String, Path, description = "Tag to list"),
        KindQuery
    ),
    responses(
        (status = 200, description = "Asset URLs carrying the tag", body = ListByTagResponse)
    ),
    tag = "media"
)]
pub async fn list_by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    Query(query): Query<KindQuery>,
) -> Json<ListByTagResponse> {
    let kind = query.kind.unwrap_or_default();
    // Failures are logged by the client; the listing contract is "empty on error".
    let urls = state
        .service(kind)
        .client()
        .list_by_tag(&tag)
        .await
        .unwrap_or_default();

    if urls.is_empty() {
        Json(ListByTagResponse {
            tag,
            image_urls: urls,
            count: None,
            message: Some(format!("No {}s found with this tag.", kind)),
        })
    } else {
        Json(ListByTagResponse {
            tag,
            count: Some(urls.len()),
            image_urls: urls,
            message: None,
        })
    }
}
