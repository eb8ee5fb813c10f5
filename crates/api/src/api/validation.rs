// Input validation for account and video APIs
//
// Field presence, email shape, and last-resort size limits. Values are hard
// limits, not configurable.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ApiError;

// =============================================================================
// Input Size Limits
// =============================================================================

/// Maximum username length (bytes).
pub const MAX_USERNAME_BYTES: usize = 64;

/// Maximum full name length (bytes).
pub const MAX_FULL_NAME_BYTES: usize = 256;

/// Maximum email length per RFC 5321.
pub const MAX_EMAIL_BYTES: usize = 254;

/// Argon2 accepts longer input, but nothing legitimate needs more.
pub const MAX_PASSWORD_BYTES: usize = 1024;

pub const MAX_URL_BYTES: usize = 2048;

pub const MAX_VIDEO_TITLE_BYTES: usize = 512;

/// 10 KB allows for detailed descriptions with formatting.
pub const MAX_VIDEO_DESCRIPTION_BYTES: usize = 10 * 1024;

// =============================================================================
// Validation Functions
// =============================================================================

/// Require a non-blank value and return it trimmed
pub fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ApiError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::validation(format!("{} is required", field))),
    }
}

/// Require a non-blank secret and return it unchanged; whitespace is part of a password
pub fn required_secret<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::validation(format!("{} is required", field))),
    }
}

/// Reject values over a byte limit
pub fn max_len(field: &str, value: &str, limit: usize) -> Result<(), ApiError> {
    if value.len() > limit {
        tracing::warn!(
            "{} exceeds limit: {} bytes (max: {})",
            field,
            value.len(),
            limit
        );
        return Err(ApiError::validation(format!("{} is too long", field)));
    }
    Ok(())
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"))
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    max_len("email", email, MAX_EMAIL_BYTES)?;
    if !email_regex().is_match(email) {
        return Err(ApiError::validation("email is not a valid address"));
    }
    Ok(())
}

/// Usernames are stored lowercase; allowed characters are ASCII letters,
/// digits, `_`, `.` and `-`
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    max_len("username", username, MAX_USERNAME_BYTES)?;
    let ok = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !ok {
        return Err(ApiError::validation(
            "username may only contain letters, digits, '_', '.' and '-'",
        ));
    }
    Ok(())
}

pub fn validate_url(field: &str, url: &str) -> Result<(), ApiError> {
    max_len(field, url, MAX_URL_BYTES)
}
