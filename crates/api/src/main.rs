// Vidora API server
// Decision: PostgreSQL when DATABASE_URL is set, in-memory dev mode otherwise

use anyhow::{Context, Result};
use axum::http::{header, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use vidora_api::{
    auth::AuthConfig,
    build_app,
    config::ServerConfig,
    openapi::ApiDoc,
    telemetry::{init_telemetry, TelemetryConfig},
};
use vidora_storage::StorageBackend;

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine; real deployments set the environment directly
    let _ = dotenvy::dotenv();

    init_telemetry(TelemetryConfig::from_env());
    tracing::info!("vidora-api starting...");

    let server_config = ServerConfig::from_env();

    let db = match &server_config.database_url {
        Some(url) => {
            let db = StorageBackend::postgres(
                url,
                server_config.database_max_connections,
                server_config.storage_timeout,
            )
            .await
            .context("Failed to connect to database")?;
            tracing::info!("Connected to database");
            db
        }
        None => {
            tracing::warn!("DATABASE_URL not set, running in dev mode with in-memory storage");
            StorageBackend::in_memory().with_timeout(server_config.storage_timeout)
        }
    };

    let auth_config = AuthConfig::from_env();
    tracing::info!(
        access_ttl_secs = auth_config.jwt.access_token_lifetime.as_secs(),
        refresh_ttl_secs = auth_config.jwt.refresh_token_lifetime.as_secs(),
        cookie_secure = auth_config.cookie_secure,
        revoke_on_password_change = auth_config.revoke_on_password_change,
        "Authentication configured"
    );

    if !server_config.api_prefix.is_empty() {
        tracing::info!(prefix = %server_config.api_prefix, "API prefix configured");
    }

    let app = build_app(auth_config, db, &server_config.api_prefix);

    // Add Swagger UI
    let app =
        app.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let cors_origins = server_config.cors_allowed_origins.clone();
    let app = if !cors_origins.is_empty() {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                ])
                .allow_credentials(true),
        )
    } else {
        tracing::info!("CORS not configured (same-origin requests only)");
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(server_config.bind_addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", server_config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
