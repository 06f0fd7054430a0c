//! OAuth Flow Coordinator.
//!
//! Drives the login handshake:
//!
//! ```text
//! Start --begin_login--> AwaitingCallback --handle_callback--> Authenticated
//!                              |                                  
//!                              +---- CSRF / exchange failure ---> Failed
//! ```
//!
//! All per-flow state lives in browser cookies (`state`, `return_to`), so
//! the coordinator itself is stateless and shared by every request.
//!
//! - [`cookies`] - cookie names and attributes
//! - [`state`] - anti-CSRF state value generation and verification
//! - [`coordinator`] - the flow operations

pub mod cookies;
pub mod coordinator;
pub mod state;

pub use cookies::CookieSettings;
pub use coordinator::{CallbackParams, CallbackRejection, LoginCoordinator};
