//! Error response handling for the auth handlers and policy middleware.
//!
//! `AuthError` renders as a small JSON body:
//! `{"error": "<code>", "error_description": "<message>"}`. Server-side
//! failures are logged here and replaced with a generic description.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let code = self.error_code();

        let description = if status.is_server_error() {
            tracing::error!(
                error = %self,
                category = %self.category(),
                "Auth request failed"
            );
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, category = %self.category(), "Auth request rejected");
            self.to_string()
        };

        let mut headers = HeaderMap::new();
        if status == StatusCode::UNAUTHORIZED {
            let www_auth = build_www_authenticate_header(code, &description);
            if let Ok(value) = HeaderValue::from_str(&www_auth) {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
        }

        let body = json!({
            "error": code,
            "error_description": description,
        });

        (status, headers, Json(body)).into_response()
    }
}

/// Maps an error to its HTTP status.
fn status_for(error: &AuthError) -> StatusCode {
    match error {
        AuthError::TokenInvalid
        | AuthError::TokenMalformed
        | AuthError::NoStateCookie
        | AuthError::InvalidStateCookie
        | AuthError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AuthError::UnknownProvider { .. }
        | AuthError::MissingCode
        | AuthError::MissingReturnTo
        | AuthError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AuthError::ExchangeFailed { .. } => StatusCode::BAD_GATEWAY,
        AuthError::Storage { .. } | AuthError::Configuration { .. } | AuthError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Builds the WWW-Authenticate header value for 401 responses.
///
/// Format: `Bearer realm="tokengate", error="invalid_token", error_description="..."`
fn build_www_authenticate_header(error: &str, description: &str) -> String {
    let escaped_desc = description.replace('"', "\\\"");
    format!(
        "Bearer realm=\"tokengate\", error=\"{}\", error_description=\"{}\"",
        error, escaped_desc
    )
}

// =============================================================================
// Tests
// =============================================================================
