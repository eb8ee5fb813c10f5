// Authentication configuration loaded from environment variables.
// Decision: AUTH_ prefix for all auth config
// Decision: Access and refresh tokens are signed with different secrets so one
// can never be substituted for the other

use std::time::Duration;

use rand::Rng;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing access tokens
    pub access_secret: String,
    /// Secret key for signing refresh tokens
    pub refresh_secret: String,
    /// Access token lifetime
    pub access_token_lifetime: Duration,
    /// Refresh token lifetime
    pub refresh_token_lifetime: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: random_secret(),
            refresh_secret: random_secret(),
            access_token_lifetime: Duration::from_secs(15 * 60), // 15 minutes
            refresh_token_lifetime: Duration::from_secs(10 * 24 * 60 * 60), // 10 days
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Set the `Secure` attribute on session cookies
    pub cookie_secure: bool,
    /// Clear the stored refresh token when the password changes
    pub revoke_on_password_change: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            cookie_secure: true,
            revoke_on_password_change: false,
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secret = |key: &str| {
            lookup(key).filter(|s| !s.is_empty()).unwrap_or_else(|| {
                tracing::warn!(
                    variable = key,
                    "Token secret not set, using a random per-process secret"
                );
                random_secret()
            })
        };
        let seconds = |key: &str, default: u64| {
            lookup(key)
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or_else(|| Duration::from_secs(default))
        };
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|s| s.to_lowercase() == "true" || s == "1")
                .unwrap_or(default)
        };

        let jwt = JwtConfig {
            access_secret: secret("AUTH_ACCESS_TOKEN_SECRET"),
            refresh_secret: secret("AUTH_REFRESH_TOKEN_SECRET"),
            access_token_lifetime: seconds("AUTH_ACCESS_TOKEN_LIFETIME", 15 * 60),
            refresh_token_lifetime: seconds("AUTH_REFRESH_TOKEN_LIFETIME", 10 * 24 * 60 * 60),
        };

        Self {
            jwt,
            cookie_secure: flag("AUTH_COOKIE_SECURE", true),
            revoke_on_password_change: flag("AUTH_REVOKE_ON_PASSWORD_CHANGE", false),
        }
    }
}

fn random_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
