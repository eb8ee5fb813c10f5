// OpenAPI specification generation
//
// Served by the API server through Swagger UI.

use crate::api;
use crate::api::common::{ApiResponse, Empty, ErrorResponse};
use crate::auth;
use crate::auth::credentials::AccountView;
use crate::services::graph::{ChannelProfile, VideoOwner, WatchHistoryEntry};
use crate::services::video::Video;
use utoipa::OpenApi;

/// OpenAPI documentation for the Vidora API
#[derive(OpenApi)]
#[openapi(
    paths(
        api::users::register,
        auth::routes::login,
        auth::routes::logout,
        auth::routes::refresh_token,
        auth::routes::change_password,
        api::users::current_user,
        api::users::update_account,
        api::users::change_avatar,
        api::users::change_cover_image,
        api::users::channel_profile,
        api::users::watch_history,
        api::videos::publish_video,
        api::videos::get_video,
        api::videos::update_video,
        api::videos::delete_video,
        api::videos::toggle_publish_status,
        api::subscriptions::toggle_subscription,
    ),
    components(
        schemas(
            ErrorResponse,
            Empty,
            AccountView,
            ChannelProfile,
            VideoOwner,
            WatchHistoryEntry,
            Video,
            ApiResponse<AccountView>,
            ApiResponse<ChannelProfile>,
            ApiResponse<Video>,
            api::users::RegisterRequest,
            api::users::UpdateAccountRequest,
            api::users::UpdateAvatarRequest,
            api::users::UpdateCoverImageRequest,
            api::videos::PublishVideoRequest,
            api::videos::UpdateVideoRequest,
            api::subscriptions::SubscriptionStatus,
            auth::routes::LoginRequest,
            auth::routes::RefreshTokenRequest,
            auth::routes::ChangePasswordRequest,
            auth::routes::SessionResponse,
            auth::routes::TokenResponse,
        )
    ),
    tags(
        (name = "users", description = "Accounts, sessions and channel views"),
        (name = "videos", description = "Video publishing endpoints"),
        (name = "subscriptions", description = "Channel subscription endpoints")
    ),
    info(
        title = "Vidora API",
        version = "0.1.0",
        description = "API for accounts, sessions, videos and subscriptions",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;
