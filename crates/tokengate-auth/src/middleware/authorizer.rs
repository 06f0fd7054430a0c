//! Authorizer capability.
//!
//! The application protecting its routes decides what a verified identity
//! may do. Most implementations look the email up in a user table.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{AuthError, AuthResult};

/// Maps a verified email to policy inputs.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Security level of the user, such as `admin` or `user`.
    async fn get_level(&self, email: &str) -> AuthResult<String>;

    /// An arbitrary attribute of the user (user ID, username, ...).
    async fn get_attribute(&self, name: &str, email: &str) -> AuthResult<String>;
}

/// Authorizer backed by fixed maps.
///
/// Unknown users are rejected with `Forbidden`.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizer {
    levels: HashMap<String, String>,
    attributes: HashMap<(String, String), String>,
}

impl StaticAuthorizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_level(mut self, email: impl Into<String>, level: impl Into<String>) -> Self {
        self.levels.insert(email.into(), level.into());
        self
    }

    #[must_use]
    pub fn with_attribute(
        mut self,
        email: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.attributes
            .insert((name.into(), email.into()), value.into());
        self
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn get_level(&self, email: &str) -> AuthResult<String> {
        self.levels
            .get(email)
            .cloned()
            .ok_or_else(|| AuthError::forbidden("user has no security level"))
    }

    async fn get_attribute(&self, name: &str, email: &str) -> AuthResult<String> {
        self.attributes
            .get(&(name.to_string(), email.to_string()))
            .cloned()
            .ok_or_else(|| AuthError::forbidden(format!("user has no {name} attribute")))
    }
}
