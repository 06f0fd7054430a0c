//! Refresh and logout handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;

use super::AuthHandlerState;
use crate::AuthError;

/// Handler for `POST /auth/refresh`.
///
/// Responds `204 No Content` with a new `access_token` cookie, or `401`
/// when the `refresh_token` cookie is missing or no longer valid.
pub async fn refresh_handler(
    State(state): State<AuthHandlerState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), AuthError> {
    let jar = state.coordinator.refresh_access_token(jar).await?;
    Ok((jar, StatusCode::NO_CONTENT))
}

/// Handler for `POST /auth/refresh/logout`.
///
/// Lives under the refresh path so the browser sends the `refresh_token`
/// cookie along.
pub async fn logout_handler(
    State(state): State<AuthHandlerState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), AuthError> {
    let jar = state.coordinator.logout(jar).await?;
    Ok((jar, StatusCode::NO_CONTENT))
}
