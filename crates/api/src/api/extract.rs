// Request extractors whose rejections render as the error envelope
// Decision: Malformed bodies and path segments are ValidationFailed (400)

use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    FromRequest, FromRequestParts,
};

use crate::error::ApiError;

/// JSON body extractor
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameter extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        ApiError::validation("Request body is not valid JSON for this endpoint")
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Rejected path parameter: {}", rejection.body_text());
        ApiError::validation("Invalid path parameter")
    }
}
