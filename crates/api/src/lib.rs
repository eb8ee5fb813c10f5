// Vidora API library
// Decision: Router assembly lives here so the binary and HTTP tests share it

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod openapi;
pub mod services;
pub mod telemetry;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use vidora_storage::StorageBackend;

pub use error::ApiError;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    storage: &'static str,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    storage: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage,
    })
}

/// Build the application router: health (unprefixed) plus all API routes under `api_prefix`
pub fn build_app(auth_config: auth::AuthConfig, db: StorageBackend, api_prefix: &str) -> Router {
    let auth_state = auth::AuthState::new(auth_config, db.clone());

    let users_state = api::users::UsersState::new(db.clone(), auth_state.clone());
    let videos_state = api::videos::VideosState::new(db.clone(), auth_state.clone());
    let subscriptions_state =
        api::subscriptions::SubscriptionsState::new(db.clone(), auth_state.clone());
    let health_state = HealthState {
        storage: if db.is_dev_mode() { "memory" } else { "postgres" },
    };

    let api_routes = Router::new()
        .merge(auth::routes::routes(auth_state))
        .merge(api::users::routes(users_state))
        .merge(api::videos::routes(videos_state))
        .merge(api::subscriptions::routes(subscriptions_state));

    Router::new()
        .route("/health", get(health).with_state(health_state))
        .merge(build_router_with_prefix(api_routes, api_prefix))
}

/// Build router with optional API prefix
pub fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}
