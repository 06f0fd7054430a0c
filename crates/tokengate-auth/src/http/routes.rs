//! Auth router.

use axum::Router;
use axum::routing::{get, post};

use super::{
    AuthHandlerState, callback_form_handler, callback_query_handler, health_handler,
    login_handler, logout_handler, refresh_handler, verification_key_handler,
};
use crate::paths;

/// Builds the router serving every auth endpoint.
pub fn auth_routes(state: AuthHandlerState) -> Router {
    Router::new()
        .route(&format!("{}/{{provider}}", paths::LOGIN), get(login_handler))
        .route(
            &format!("{}/{{provider}}", paths::CALLBACK),
            post(callback_form_handler).get(callback_query_handler),
        )
        .route(paths::REFRESH, post(refresh_handler))
        .route(paths::LOGOUT, post(logout_handler))
        .route(paths::VERIFICATION_KEY, get(verification_key_handler))
        .route(paths::HEALTH, get(health_handler))
        .with_state(state)
}
