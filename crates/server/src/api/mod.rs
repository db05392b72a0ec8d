//! HTTP endpoint modules.
//!
//! Shared error payload and rejection mapping live here in mod.rs.

pub mod dialogue;
pub mod doc;
mod health;
pub mod types;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::warn;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a body that failed to decode to `400 {"error": "Invalid request"}`.
pub(crate) fn invalid_request(rejection: JsonRejection) -> ApiError {
    warn!(reason = %rejection.body_text(), "rejecting malformed request body");
    error_response(StatusCode::BAD_REQUEST, "Invalid request")
}

// ── Re-exports ───────────────────────────────────────────────────

pub use dialogue::{continue_dialogue, start_dialogue};
pub use health::health;
