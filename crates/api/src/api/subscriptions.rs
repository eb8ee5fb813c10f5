// Subscriptions API routes

use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use vidora_storage::StorageBackend;

use super::extract::ApiPath;
use super::common::{ApiResponse, ErrorResponse};
use crate::auth::middleware::{AuthState, AuthUser, FromRef};
use crate::error::ApiError;
use crate::services::SubscriptionService;

/// App state for subscription routes
#[derive(Clone)]
pub struct SubscriptionsState {
    pub service: SubscriptionService,
    pub auth: AuthState,
}

impl SubscriptionsState {
    pub fn new(db: StorageBackend, auth: AuthState) -> Self {
        Self {
            service: SubscriptionService::new(db),
            auth,
        }
    }
}

impl FromRef<SubscriptionsState> for AuthState {
    fn from_ref(input: &SubscriptionsState) -> Self {
        input.auth.clone()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionStatus {
    /// Whether the caller is subscribed after the toggle
    pub subscribed: bool,
}

/// Create subscription routes
pub fn routes(state: SubscriptionsState) -> Router {
    Router::new()
        .route("/v1/subscriptions/c/:channel_id", post(toggle_subscription))
        .with_state(state)
}

/// POST /v1/subscriptions/c/{channel_id} - Subscribe to or unsubscribe from a channel
#[utoipa::path(
    post,
    path = "/v1/subscriptions/c/{channel_id}",
    params(("channel_id" = Uuid, Path, description = "Channel account ID")),
    responses(
        (status = 200, description = "Subscription toggled", body = ApiResponse<SubscriptionStatus>),
        (status = 400, description = "Cannot subscribe to yourself", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Channel does not exist", body = ErrorResponse)
    ),
    tag = "subscriptions"
)]
pub async fn toggle_subscription(
    State(state): State<SubscriptionsState>,
    user: AuthUser,
    ApiPath(channel_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<SubscriptionStatus>>, ApiError> {
    let subscribed = state.service.toggle(user.id, channel_id).await?;
    let message = if subscribed {
        "Subscribed successfully"
    } else {
        "Unsubscribed successfully"
    };
    Ok(Json(ApiResponse::ok(SubscriptionStatus { subscribed }, message)))
}
