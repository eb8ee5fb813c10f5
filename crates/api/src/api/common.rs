// Response envelope for the public API
//
// Every success is `{statusCode, data, message, success: true}`; every
// failure is `{statusCode, message, success: false}` (see crate::error).

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard success envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// HTTP status code, repeated in the body.
    #[schema(example = 200)]
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: status.as_u16() < 400,
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }
}

/// Standard error envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[schema(example = 401)]
    pub status_code: u16,
    /// Error message describing what went wrong.
    pub message: String,
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            success: false,
        }
    }
}

/// Placeholder payload for responses that carry no data
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Empty {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_shape() {
        let body = ApiResponse::new(StatusCode::CREATED, json!({"id": 1}), "Created");
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["statusCode"], 201);
        assert_eq!(value["data"]["id"], 1);
        assert_eq!(value["message"], "Created");
        assert_eq!(value["success"], true);
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = ErrorResponse::new(StatusCode::CONFLICT, "User already exists");
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value, json!({
            "statusCode": 409,
            "message": "User already exists",
            "success": false
        }));
    }

    #[test]
    fn test_empty_serializes_as_object() {
        let body = ApiResponse::ok(Empty::default(), "Logged out");
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["data"], json!({}));
    }
}
