// Authorization gate: access-token extraction and caller resolution
// Decision: Support both cookie-based (browser) and header-based (API) auth
// Decision: Every verification failure is the same 401; the cause is only logged
// Decision: Store failures surface as 503, never as 401

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use uuid::Uuid;
use vidora_storage::StorageBackend;

use super::{
    config::AuthConfig,
    credentials::{AccountView, CredentialStore},
    jwt::{JwtService, TokenKind},
    session::SessionManager,
};
use crate::error::ApiError;

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Authenticated caller resolved from the access token
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Account ID (token subject)
    pub id: Uuid,
    /// Public view of the account at request time
    pub account: AccountView,
}

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub jwt_service: Arc<JwtService>,
    pub credentials: CredentialStore,
    pub sessions: SessionManager,
}

impl AuthState {
    pub fn new(config: AuthConfig, db: StorageBackend) -> Self {
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        let credentials = CredentialStore::new(db);
        let sessions = SessionManager::new(
            credentials.clone(),
            jwt_service.clone(),
            config.revoke_on_password_change,
        );
        Self {
            config,
            jwt_service,
            credentials,
            sessions,
        }
    }

    /// Resolve the caller behind an access token
    pub async fn authorize(&self, token: &str) -> Result<AuthUser, ApiError> {
        let verified = self
            .jwt_service
            .verify(token, TokenKind::Access)
            .map_err(|e| {
                tracing::debug!("Access token rejected: {}", e);
                ApiError::Unauthenticated
            })?;

        let account = self
            .credentials
            .get(verified.account_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(account_id = %verified.account_id, "Access token subject not found");
                ApiError::Unauthenticated
            })?;

        Ok(AuthUser {
            id: account.id,
            account: account.into(),
        })
    }
}

/// Extractor for authenticated user
/// This is required - returns 401 if not authenticated
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        let token = extract_access_token(parts).ok_or(ApiError::Unauthenticated)?;
        auth_state.authorize(&token).await
    }
}

/// Helper trait for extracting AuthState from application state
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl FromRef<AuthState> for AuthState {
    fn from_ref(input: &AuthState) -> Self {
        input.clone()
    }
}

/// Find the access token in the `accessToken` cookie or the `Authorization: Bearer` header
fn extract_access_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    let auth_header = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
