//! Axum HTTP handlers for the auth endpoints.
//!
//! # Available Handlers
//!
//! - [`login`] - login redirect and provider callback
//! - [`refresh`] - access token refresh and logout
//! - [`verification_key`] - public key distribution and health probe
//! - [`routes`] - the assembled router

pub mod login;
pub mod refresh;
pub mod routes;
pub mod verification_key;

use std::sync::Arc;

use crate::oauth::LoginCoordinator;

pub use login::{callback_form_handler, callback_query_handler, login_handler};
pub use refresh::{logout_handler, refresh_handler};
pub use routes::auth_routes;
pub use verification_key::{health_handler, verification_key_handler};

/// Shared state for the auth handlers.
#[derive(Clone)]
pub struct AuthHandlerState {
    pub coordinator: Arc<LoginCoordinator>,
}

impl AuthHandlerState {
    pub fn new(coordinator: Arc<LoginCoordinator>) -> Self {
        Self { coordinator }
    }
}
