// HTTP API routes
//
// This module contains all HTTP route handlers for the public API.
// Each submodule handles a specific resource type with its own state.

pub mod common;
pub mod extract;
pub mod subscriptions;
pub mod users;
pub mod validation;
pub mod videos;

// Re-export common types
pub use common::{ApiResponse, ErrorResponse};
