// JWT token codec for authentication
// Decision: HS256 (symmetric), one key per token kind plus a `kind` claim
// Decision: Stateless; refresh-token replay is handled by the session manager

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::config::JwtConfig;

/// Which of the two credentials a token is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims shared by both token kinds
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (account ID)
    pub sub: String,
    pub kind: TokenKind,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Random token ID, keeps two tokens minted in the same second distinct
    pub jti: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is malformed")]
    Malformed,

    #[error("token kind mismatch")]
    WrongKind,

    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

/// Result of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub account_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Token pair returned after successful authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// JWT service for token generation and validation
pub struct JwtService {
    config: JwtConfig,
    access_keys: KeyPair,
    refresh_keys: KeyPair,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let access_keys = KeyPair::from_secret(&config.access_secret);
        let refresh_keys = KeyPair::from_secret(&config.refresh_secret);

        Self {
            config,
            access_keys,
            refresh_keys,
        }
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access_keys,
            TokenKind::Refresh => &self.refresh_keys,
        }
    }

    fn lifetime(&self, kind: TokenKind) -> std::time::Duration {
        match kind {
            TokenKind::Access => self.config.access_token_lifetime,
            TokenKind::Refresh => self.config.refresh_token_lifetime,
        }
    }

    fn issue(&self, account_id: Uuid, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime(kind).as_secs() as i64);

        let claims = TokenClaims {
            sub: account_id.to_string(),
            kind,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: generate_token_id(),
        };

        encode(&Header::default(), &claims, &self.keys(kind).encoding).map_err(TokenError::Encode)
    }

    /// Generate a short-lived access token
    pub fn issue_access_token(&self, account_id: Uuid) -> Result<String, TokenError> {
        self.issue(account_id, TokenKind::Access)
    }

    /// Generate a long-lived refresh token
    pub fn issue_refresh_token(&self, account_id: Uuid) -> Result<String, TokenError> {
        self.issue(account_id, TokenKind::Refresh)
    }

    /// Generate both access and refresh tokens
    pub fn issue_pair(&self, account_id: Uuid) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(account_id)?,
            refresh_token: self.issue_refresh_token(account_id)?,
        })
    }

    /// Validate a token of the expected kind (signature, expiry, kind tag)
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<VerifiedToken, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let data = decode::<TokenClaims>(token, &self.keys(expected).decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })?;
        let claims = data.claims;

        if claims.kind != expected {
            return Err(TokenError::WrongKind);
        }

        let account_id = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::Malformed)?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(TokenError::Malformed)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)?;

        Ok(VerifiedToken {
            account_id,
            issued_at,
            expires_at,
        })
    }

    /// Get access token lifetime in seconds
    pub fn access_token_lifetime_secs(&self) -> i64 {
        self.config.access_token_lifetime.as_secs() as i64
    }

    /// Get refresh token lifetime in seconds
    pub fn refresh_token_lifetime_secs(&self) -> i64 {
        self.config.refresh_token_lifetime.as_secs() as i64
    }
}

/// Generate a random identifier string (32 hex characters)
fn generate_token_id() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn test_config() -> JwtConfig {
        JwtConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_token_lifetime: StdDuration::from_secs(900),
            refresh_token_lifetime: StdDuration::from_secs(86400),
        }
    }

    fn sign_with(secret: &str, claims: &TokenClaims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(kind: TokenKind, exp_offset_secs: i64) -> TokenClaims {
        let now = Utc::now().timestamp();
        TokenClaims {
            sub: Uuid::nil().to_string(),
            kind,
            iat: now,
            exp: now + exp_offset_secs,
            jti: generate_token_id(),
        }
    }

    #[test]
    fn test_access_token_roundtrip() {
        let service = JwtService::new(test_config());
        let account_id = Uuid::now_v7();

        let token = service.issue_access_token(account_id).unwrap();
        let verified = service.verify(&token, TokenKind::Access).unwrap();

        assert_eq!(verified.account_id, account_id);
        assert_eq!(
            (verified.expires_at - verified.issued_at).num_seconds(),
            900
        );
    }

    #[test]
    fn test_pair_tokens_are_distinct() {
        let service = JwtService::new(test_config());
        let account_id = Uuid::now_v7();

        let first = service.issue_pair(account_id).unwrap();
        let second = service.issue_pair(account_id).unwrap();

        assert_ne!(first.access_token, first.refresh_token);
        assert_ne!(first.refresh_token, second.refresh_token);
        assert!(service
            .verify(&first.refresh_token, TokenKind::Refresh)
            .is_ok());
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let service = JwtService::new(test_config());
        let refresh = service.issue_refresh_token(Uuid::now_v7()).unwrap();

        let result = service.verify(&refresh, TokenKind::Access);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_access_claims_signed_with_refresh_key_rejected() {
        let service = JwtService::new(test_config());
        let forged = sign_with("test-refresh-secret", &claims(TokenKind::Access, 600));

        let result = service.verify(&forged, TokenKind::Access);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_kind_tag_checked_even_with_shared_secret() {
        let mut config = test_config();
        config.refresh_secret = config.access_secret.clone();
        let service = JwtService::new(config);
        let refresh = service.issue_refresh_token(Uuid::now_v7()).unwrap();

        let result = service.verify(&refresh, TokenKind::Access);
        assert!(matches!(result, Err(TokenError::WrongKind)));
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::new(test_config());
        let expired = sign_with("test-access-secret", &claims(TokenKind::Access, -3600));

        let result = service.verify(&expired, TokenKind::Access);
        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_malformed_token() {
        let service = JwtService::new(test_config());
        let result = service.verify("not-a-jwt", TokenKind::Access);
        assert!(matches!(result, Err(TokenError::Malformed)));
    }

    #[test]
    fn test_non_uuid_subject_is_malformed() {
        let service = JwtService::new(test_config());
        let mut bad = claims(TokenKind::Access, 600);
        bad.sub = "alice".to_string();
        let token = sign_with("test-access-secret", &bad);

        let result = service.verify(&token, TokenKind::Access);
        assert!(matches!(result, Err(TokenError::Malformed)));
    }
}
