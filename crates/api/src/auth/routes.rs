// Session HTTP routes
// Decision: Session endpoints live under /v1/users/* next to the account routes
// Decision: Tokens travel both as httpOnly cookies and in the JSON body

use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    credentials::AccountView,
    jwt::TokenPair,
    middleware::{AuthState, AuthUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
    session::Session,
};
use crate::api::common::{ApiResponse, Empty};
use crate::api::extract::ApiJson;
use crate::api::validation::{max_len, required_secret, MAX_PASSWORD_BYTES};
use crate::error::ApiError;

/// Login request; at least one of username or email is required
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Refresh request; the cookie takes precedence over this field
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

/// Login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: AccountView,
    pub access_token: String,
    pub refresh_token: String,
}

/// Refresh response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Create session routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/v1/users/login", post(login))
        .route("/v1/users/logout", post(logout))
        .route("/v1/users/refresh-token", post(refresh_token))
        .route("/v1/users/change-password", post(change_password))
        .with_state(state)
}

/// POST /v1/users/login - Login with username or email and password
#[utoipa::path(
    post,
    path = "/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<SessionResponse>),
        (status = 400, description = "Missing fields", body = crate::api::common::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::api::common::ErrorResponse),
        (status = 404, description = "User does not exist", body = crate::api::common::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>), ApiError> {
    let identifier = req
        .username
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .or(req.email.as_deref())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::validation("username or email is required"))?;
    let password = required_secret("password", req.password.as_deref())?;

    let Session { account, tokens } = state.sessions.login(identifier, password).await?;
    let jar = set_session_cookies(&state, jar, &tokens);

    Ok((
        jar,
        Json(ApiResponse::ok(
            SessionResponse {
                user: account,
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "User logged in successfully",
        )),
    ))
}

/// POST /v1/users/logout - End the current session
#[utoipa::path(
    post,
    path = "/v1/users/logout",
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<Empty>),
        (status = 401, description = "Unauthorized", body = crate::api::common::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn logout(
    State(state): State<AuthState>,
    user: AuthUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<Empty>>), ApiError> {
    state.sessions.logout(user.id).await?;

    // Clear both cookies even when the caller authenticated with a bearer header
    let secure = state.config.cookie_secure;
    let jar = jar
        .add(cleared_cookie(ACCESS_TOKEN_COOKIE, secure))
        .add(cleared_cookie(REFRESH_TOKEN_COOKIE, secure));

    Ok((jar, Json(ApiResponse::ok(Empty::default(), "User logged out"))))
}

/// POST /v1/users/refresh-token - Rotate the refresh token
#[utoipa::path(
    post,
    path = "/v1/users/refresh-token",
    request_body(content = RefreshTokenRequest, description = "Optional when the refreshToken cookie is set"),
    responses(
        (status = 200, description = "Access token refreshed", body = ApiResponse<TokenResponse>),
        (status = 401, description = "Missing, invalid or reused refresh token", body = crate::api::common::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn refresh_token(
    State(state): State<AuthState>,
    jar: CookieJar,
    body: Option<Json<RefreshTokenRequest>>,
) -> Result<(CookieJar, Json<ApiResponse<TokenResponse>>), ApiError> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| body.and_then(|Json(req)| req.refresh_token));

    let Session { tokens, .. } = state.sessions.refresh(presented.as_deref()).await?;
    let jar = set_session_cookies(&state, jar, &tokens);

    Ok((
        jar,
        Json(ApiResponse::ok(
            TokenResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "Access token refreshed",
        )),
    ))
}

/// POST /v1/users/change-password - Replace the password
#[utoipa::path(
    post,
    path = "/v1/users/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<Empty>),
        (status = 400, description = "Missing fields", body = crate::api::common::ErrorResponse),
        (status = 401, description = "Wrong old password or unauthorized", body = crate::api::common::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn change_password(
    State(state): State<AuthState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let old = required_secret("oldPassword", req.old_password.as_deref())?;
    let new = required_secret("newPassword", req.new_password.as_deref())?;
    max_len("newPassword", new, MAX_PASSWORD_BYTES)?;

    state.sessions.change_secret(user.id, old, new).await?;

    Ok(Json(ApiResponse::ok(
        Empty::default(),
        "Password changed successfully",
    )))
}

fn set_session_cookies(state: &AuthState, jar: CookieJar, tokens: &TokenPair) -> CookieJar {
    let secure = state.config.cookie_secure;

    let access_cookie = Cookie::build((ACCESS_TOKEN_COOKIE, tokens.access_token.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(
            state.jwt_service.access_token_lifetime_secs(),
        ))
        .build();

    let refresh_cookie = Cookie::build((REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(
            state.jwt_service.refresh_token_lifetime_secs(),
        ))
        .build();

    jar.add(access_cookie).add(refresh_cookie)
}

/// Empty, already-expired cookie that makes the browser drop `name`
fn cleared_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .build();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleared_cookie_expires_immediately() {
        let rendered = cleared_cookie(REFRESH_TOKEN_COOKIE, true).to_string();

        assert!(rendered.starts_with("refreshToken=;"));
        assert!(rendered.contains("Max-Age=0"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
    }
}
