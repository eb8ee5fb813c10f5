// Videos API routes

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use vidora_storage::StorageBackend;

use super::extract::{ApiJson, ApiPath};
use super::common::{ApiResponse, Empty, ErrorResponse};
use crate::auth::middleware::{AuthState, AuthUser, FromRef};
use crate::error::ApiError;
use crate::services::video::Video;
use crate::services::VideoService;

/// App state for video routes
#[derive(Clone)]
pub struct VideosState {
    pub service: VideoService,
    pub auth: AuthState,
}

impl VideosState {
    pub fn new(db: StorageBackend, auth: AuthState) -> Self {
        Self {
            service: VideoService::new(db),
            auth,
        }
    }
}

impl FromRef<VideosState> for AuthState {
    fn from_ref(input: &VideosState) -> Self {
        input.auth.clone()
    }
}

/// Publish request; URLs come from the media-upload service
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Seconds, as reported by the media service
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Create video routes
pub fn routes(state: VideosState) -> Router {
    Router::new()
        .route("/v1/videos/upload-video", post(publish_video))
        .route("/v1/videos/:video_id", get(get_video))
        .route("/v1/videos/:video_id/update-details", patch(update_video))
        .route("/v1/videos/:video_id/delete-video", delete(delete_video))
        .route(
            "/v1/videos/:video_id/toggle-publish-status",
            post(toggle_publish_status),
        )
        .with_state(state)
}

/// POST /v1/videos/upload-video - Publish a video
#[utoipa::path(
    post,
    path = "/v1/videos/upload-video",
    request_body = PublishVideoRequest,
    responses(
        (status = 201, description = "Video published", body = ApiResponse<Video>),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "videos"
)]
pub async fn publish_video(
    State(state): State<VideosState>,
    user: AuthUser,
    ApiJson(req): ApiJson<PublishVideoRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Video>>), ApiError> {
    let video = state.service.publish(user.id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            StatusCode::CREATED,
            video,
            "Video published successfully",
        )),
    ))
}

/// GET /v1/videos/{video_id} - Fetch a video and record the view
#[utoipa::path(
    get,
    path = "/v1/videos/{video_id}",
    params(("video_id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video", body = ApiResponse<Video>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    tag = "videos"
)]
pub async fn get_video(
    State(state): State<VideosState>,
    user: AuthUser,
    ApiPath(video_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Video>>, ApiError> {
    let video = state.service.get(video_id, user.id).await?;
    Ok(Json(ApiResponse::ok(video, "Video fetched successfully")))
}

/// PATCH /v1/videos/{video_id}/update-details - Owner updates title, description or thumbnail
#[utoipa::path(
    patch,
    path = "/v1/videos/{video_id}/update-details",
    params(("video_id" = Uuid, Path, description = "Video ID")),
    request_body = UpdateVideoRequest,
    responses(
        (status = 200, description = "Video updated", body = ApiResponse<Video>),
        (status = 400, description = "Nothing to update", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    tag = "videos"
)]
pub async fn update_video(
    State(state): State<VideosState>,
    user: AuthUser,
    ApiPath(video_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateVideoRequest>,
) -> Result<Json<ApiResponse<Video>>, ApiError> {
    let video = state.service.update(video_id, user.id, req).await?;
    Ok(Json(ApiResponse::ok(video, "Video updated successfully")))
}

/// DELETE /v1/videos/{video_id}/delete-video - Owner deletes a video
#[utoipa::path(
    delete,
    path = "/v1/videos/{video_id}/delete-video",
    params(("video_id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video deleted", body = ApiResponse<Empty>),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    tag = "videos"
)]
pub async fn delete_video(
    State(state): State<VideosState>,
    user: AuthUser,
    ApiPath(video_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.service.delete(video_id, user.id).await?;
    Ok(Json(ApiResponse::ok(
        Empty::default(),
        "Video deleted successfully",
    )))
}

/// POST /v1/videos/{video_id}/toggle-publish-status - Owner flips publish status
#[utoipa::path(
    post,
    path = "/v1/videos/{video_id}/toggle-publish-status",
    params(("video_id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Publish status toggled", body = ApiResponse<Video>),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    tag = "videos"
)]
pub async fn toggle_publish_status(
    State(state): State<VideosState>,
    user: AuthUser,
    ApiPath(video_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Video>>, ApiError> {
    let video = state.service.toggle_publish_status(video_id, user.id).await?;
    Ok(Json(ApiResponse::ok(
        video,
        "Publish status toggled successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_request_deserialize() {
        let req: PublishVideoRequest = serde_json::from_str(
            r#"{"title": "t", "description": "d", "videoUrl": "https://cdn.example.com/v.mp4", "duration": 12.5}"#,
        )
        .unwrap();
        assert_eq!(req.video_url.as_deref(), Some("https://cdn.example.com/v.mp4"));
        assert_eq!(req.duration, Some(12.5));
        assert!(req.thumbnail_url.is_none());
    }
}
