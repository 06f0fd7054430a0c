//! User identity bound to tokens.

use serde::{Deserialize, Serialize};

/// A user as identified by an external identity provider.
///
/// `user_id` is the provider's stable subject identifier; `email` is what
/// authorization policies key on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

impl Identity {
    #[must_use]
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }
}
