// Users API routes
// Decision: Registration and profile updates accept media URLs; the upload
// collaborator that produces them sits outside this service

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vidora_storage::StorageBackend;

use super::extract::{ApiJson, ApiPath};
use super::common::{ApiResponse, ErrorResponse};
use crate::auth::credentials::AccountView;
use crate::auth::middleware::{AuthState, AuthUser, FromRef};
use crate::error::ApiError;
use crate::services::graph::{ChannelProfile, WatchHistoryEntry};
use crate::services::{AccountService, GraphAggregator};

/// App state for users routes
#[derive(Clone)]
pub struct UsersState {
    pub accounts: AccountService,
    pub graph: GraphAggregator,
    pub auth: AuthState,
}

impl UsersState {
    pub fn new(db: StorageBackend, auth: AuthState) -> Self {
        Self {
            accounts: AccountService::new(db.clone(), auth.credentials.clone()),
            graph: GraphAggregator::new(db),
            auth,
        }
    }
}

impl FromRef<UsersState> for AuthState {
    fn from_ref(input: &UsersState) -> Self {
        input.auth.clone()
    }
}

/// Register request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    /// URL returned by the media-upload service
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
}

/// Both fields are required
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAvatarRequest {
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCoverImageRequest {
    pub cover_image_url: Option<String>,
}

/// Create users routes
pub fn routes(state: UsersState) -> Router {
    Router::new()
        .route("/v1/users/register", post(register))
        .route("/v1/users/current-user", get(current_user))
        .route("/v1/users/update-account", patch(update_account))
        .route("/v1/users/change-avatar", patch(change_avatar))
        .route("/v1/users/change-cover-image", patch(change_cover_image))
        .route("/v1/users/c/:username", get(channel_profile))
        .route("/v1/users/watch-history", get(watch_history))
        .with_state(state)
}

/// POST /v1/users/register - Create an account
#[utoipa::path(
    post,
    path = "/v1/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AccountView>),
        (status = 400, description = "Missing or malformed fields", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn register(
    State(state): State<UsersState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountView>>), ApiError> {
    let account = state.accounts.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            StatusCode::CREATED,
            account,
            "User registered successfully",
        )),
    ))
}

/// GET /v1/users/current-user - The caller's account
#[utoipa::path(
    get,
    path = "/v1/users/current-user",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<AccountView>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn current_user(user: AuthUser) -> Json<ApiResponse<AccountView>> {
    Json(ApiResponse::ok(
        user.account,
        "Current user fetched successfully",
    ))
}

/// PATCH /v1/users/update-account - Update full name and email
#[utoipa::path(
    patch,
    path = "/v1/users/update-account",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = ApiResponse<AccountView>),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "Email already taken", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_account(
    State(state): State<UsersState>,
    user: AuthUser,
    ApiJson(req): ApiJson<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let account = state.accounts.update_details(user.id, req).await?;
    Ok(Json(ApiResponse::ok(
        account,
        "Account details updated successfully",
    )))
}

/// PATCH /v1/users/change-avatar - Replace the avatar URL
#[utoipa::path(
    patch,
    path = "/v1/users/change-avatar",
    request_body = UpdateAvatarRequest,
    responses(
        (status = 200, description = "Avatar updated", body = ApiResponse<AccountView>),
        (status = 400, description = "Missing URL", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn change_avatar(
    State(state): State<UsersState>,
    user: AuthUser,
    ApiJson(req): ApiJson<UpdateAvatarRequest>,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let account = state
        .accounts
        .update_avatar(user.id, req.avatar_url.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok(account, "Avatar updated successfully")))
}

/// PATCH /v1/users/change-cover-image - Replace the cover image URL
#[utoipa::path(
    patch,
    path = "/v1/users/change-cover-image",
    request_body = UpdateCoverImageRequest,
    responses(
        (status = 200, description = "Cover image updated", body = ApiResponse<AccountView>),
        (status = 400, description = "Missing URL", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn change_cover_image(
    State(state): State<UsersState>,
    user: AuthUser,
    ApiJson(req): ApiJson<UpdateCoverImageRequest>,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let account = state
        .accounts
        .update_cover_image(user.id, req.cover_image_url.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok(
        account,
        "Cover image updated successfully",
    )))
}

/// GET /v1/users/c/{username} - Channel profile as seen by the caller
#[utoipa::path(
    get,
    path = "/v1/users/c/{username}",
    params(
        ("username" = String, Path, description = "Channel username")
    ),
    responses(
        (status = 200, description = "Channel profile", body = ApiResponse<ChannelProfile>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Channel does not exist", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn channel_profile(
    State(state): State<UsersState>,
    user: AuthUser,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<ApiResponse<ChannelProfile>>, ApiError> {
    let profile = state.graph.channel_profile(&username, user.id).await?;
    Ok(Json(ApiResponse::ok(
        profile,
        "User channel fetched successfully",
    )))
}

/// GET /v1/users/watch-history - The caller's watch history, in watch order
#[utoipa::path(
    get,
    path = "/v1/users/watch-history",
    responses(
        (status = 200, description = "Watch history", body = ApiResponse<Vec<WatchHistoryEntry>>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn watch_history(
    State(state): State<UsersState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<WatchHistoryEntry>>>, ApiError> {
    let history = state.graph.watch_history(user.id).await?;
    Ok(Json(ApiResponse::ok(
        history,
        "Watch history fetched successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_deserialize() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"username": "alice", "email": "a@example.com", "fullName": "Alice", "password": "pw"}"#,
        )
        .unwrap();
        assert_eq!(req.full_name.as_deref(), Some("Alice"));
        assert_eq!(req.avatar_url, None);

        let empty: RegisterRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.username.is_none());
    }

    #[test]
    fn test_update_requests_deserialize() {
        let avatar: UpdateAvatarRequest =
            serde_json::from_str(r#"{"avatarUrl": "https://cdn.example.com/a.png"}"#).unwrap();
        assert!(avatar.avatar_url.is_some());

        let cover: UpdateCoverImageRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert!(cover.cover_image_url.is_none());
    }
}
