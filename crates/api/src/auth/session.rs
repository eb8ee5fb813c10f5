// Session manager: login, refresh rotation, logout, password change
// Decision: An account is Anonymous (no live refresh token) or Active (exactly one)
// Decision: Rotation is a single compare-and-swap in the store; the loser of a
// race sees TokenReuseDetected
// Decision: Tokens are minted before any write, so a failed call never mutates
// the stored refresh token

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;
use vidora_storage::StorageError;

use super::credentials::{AccountView, CredentialStore};
use super::jwt::{JwtService, TokenError, TokenKind, TokenPair};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("account not found")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredential,

    /// No refresh token was presented
    #[error("refresh token missing")]
    Unauthenticated,

    /// Signature, expiry or kind check failed, or the subject is gone
    #[error("refresh token invalid")]
    InvalidToken,

    /// Signature is valid but the token is not the account's live token
    #[error("refresh token is not the current token")]
    TokenReuseDetected,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// A freshly issued session: both tokens plus the public account view
#[derive(Debug, Clone)]
pub struct Session {
    pub account: AccountView,
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct SessionManager {
    credentials: CredentialStore,
    jwt: Arc<JwtService>,
    revoke_on_password_change: bool,
}

impl SessionManager {
    pub fn new(
        credentials: CredentialStore,
        jwt: Arc<JwtService>,
        revoke_on_password_change: bool,
    ) -> Self {
        Self {
            credentials,
            jwt,
            revoke_on_password_change,
        }
    }

    /// Verify credentials and start a new session, superseding any previous one
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<Session, SessionError> {
        let account = self
            .credentials
            .find_by_username_or_email(identifier)
            .await?
            .ok_or(SessionError::NotFound)?;

        if !self.credentials.verify_secret(&account, secret).await? {
            tracing::debug!(account_id = %account.id, "Login rejected: wrong password");
            return Err(SessionError::InvalidCredential);
        }

        let tokens = self.jwt.issue_pair(account.id)?;

        // Overwrites any prior token: a new login ends the previous session
        if !self
            .credentials
            .set_refresh_token(account.id, Some(&tokens.refresh_token))
            .await?
        {
            return Err(SessionError::NotFound);
        }

        tracing::info!(account_id = %account.id, "Account logged in");
        Ok(Session {
            account: account.into(),
            tokens,
        })
    }

    /// Exchange a live refresh token for a new pair; the presented token is spent
    pub async fn refresh(&self, presented: Option<&str>) -> Result<Session, SessionError> {
        let presented = presented
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::Unauthenticated)?;

        let verified = self
            .jwt
            .verify(presented, TokenKind::Refresh)
            .map_err(|e| {
                tracing::debug!("Refresh token verification failed: {}", e);
                SessionError::InvalidToken
            })?;

        let account = self
            .credentials
            .get(verified.account_id)
            .await?
            .ok_or(SessionError::InvalidToken)?;

        let tokens = self.jwt.issue_pair(account.id)?;

        let rotated = self
            .credentials
            .rotate_refresh_token(account.id, presented, &tokens.refresh_token)
            .await?;
        if !rotated {
            tracing::warn!(
                account_id = %account.id,
                "Refresh token reuse detected: presented token is not current"
            );
            return Err(SessionError::TokenReuseDetected);
        }

        tracing::debug!(account_id = %account.id, "Refresh token rotated");
        Ok(Session {
            account: account.into(),
            tokens,
        })
    }

    /// Clear the live refresh token; later refresh calls fail until the next login
    pub async fn logout(&self, account_id: Uuid) -> Result<(), SessionError> {
        self.credentials.set_refresh_token(account_id, None).await?;
        tracing::info!(account_id = %account_id, "Account logged out");
        Ok(())
    }

    /// Replace the password after re-verifying the old one
    ///
    /// Access tokens already issued stay valid until they expire. The refresh
    /// token is cleared only when revocation on password change is enabled.
    pub async fn change_secret(
        &self,
        account_id: Uuid,
        old: &str,
        new: &str,
    ) -> Result<(), SessionError> {
        let account = self
            .credentials
            .get(account_id)
            .await?
            .ok_or(SessionError::NotFound)?;

        if !self.credentials.verify_secret(&account, old).await? {
            return Err(SessionError::InvalidCredential);
        }

        if !self.credentials.set_password(account_id, new).await? {
            return Err(SessionError::NotFound);
        }

        if self.revoke_on_password_change {
            self.credentials.set_refresh_token(account_id, None).await?;
        }

        tracing::info!(
            account_id = %account_id,
            revoked = self.revoke_on_password_change,
            "Password changed"
        );
        Ok(())
    }
}
