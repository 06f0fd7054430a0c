//! Login and callback handlers.
//!
//! - `GET /auth/login/{provider}?return_to=<url>` redirects (307) to the
//!   provider's consent page.
//! - `POST /auth/callback/{provider}` (form) and
//!   `GET /auth/callback/{provider}` (query) finish the login and redirect
//!   (303) to the stored return-to URL.

use axum::Form;
use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::AuthHandlerState;
use crate::AuthError;
use crate::oauth::{CallbackParams, CallbackRejection};

/// Query parameters of the login endpoint.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub return_to: Option<String>,
}

/// Handler for `GET /auth/login/{provider}`.
pub async fn login_handler(
    State(state): State<AuthHandlerState>,
    Path(provider): Path<String>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    let (jar, url) = state
        .coordinator
        .begin_login(jar, &provider, query.return_to.as_deref())?;
    Ok((jar, Redirect::temporary(url.as_str())))
}

/// Handler for `POST /auth/callback/{provider}`.
pub async fn callback_form_handler(
    State(state): State<AuthHandlerState>,
    Path(provider): Path<String>,
    jar: CookieJar,
    Form(params): Form<CallbackParams>,
) -> Result<(CookieJar, Redirect), CallbackRejection> {
    complete_login(&state, &provider, jar, &params).await
}

/// Handler for `GET /auth/callback/{provider}`.
pub async fn callback_query_handler(
    State(state): State<AuthHandlerState>,
    Path(provider): Path<String>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect), CallbackRejection> {
    complete_login(&state, &provider, jar, &params).await
}

async fn complete_login(
    state: &AuthHandlerState,
    provider: &str,
    jar: CookieJar,
    params: &CallbackParams,
) -> Result<(CookieJar, Redirect), CallbackRejection> {
    let (jar, return_to) = state
        .coordinator
        .handle_callback(jar, provider, params)
        .await?;
    Ok((jar, Redirect::to(&return_to)))
}
