//! HTTP middleware for protected services.
//!
//! - [`authorizer`] - the policy-decision capability supplied by the application
//! - [`policy`] - `AllowOnly` / `AllowPathVal` guards built on the Remote Verifier
//! - [`error`] - JSON error responses for [`AuthError`](crate::AuthError)

pub mod authorizer;
pub mod error;
pub mod policy;

pub use authorizer::{Authorizer, StaticAuthorizer};
pub use policy::{AuthService, Policy, PolicyGuard, enforce};
