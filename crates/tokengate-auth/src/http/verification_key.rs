//! Verification key endpoint.
//!
//! Services that trust this authority fetch the public key once from
//! `GET /auth/verification-key` and verify access tokens locally from then
//! on (see [`crate::client::RemoteVerifier`]).

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use serde_json::json;

use super::AuthHandlerState;

pub const PEM_CONTENT_TYPE: &str = "application/x-pem-file";

/// Handler for `GET /auth/verification-key`.
///
/// Returns the Ed25519 public key as a PEM `PUBLIC KEY` block.
pub async fn verification_key_handler(State(state): State<AuthHandlerState>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, PEM_CONTENT_TYPE),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        state.coordinator.tokens().public_key_pem().to_string(),
    )
}

/// Handler for `GET /healthz`.
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
