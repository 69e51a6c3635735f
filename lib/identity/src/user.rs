//! User shapes returned by the identity provider.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A user as described by the identity provider.
///
/// Only `id` and `email` are interpreted by the gateway. Everything else the
/// provider returns (role, metadata, identities, timestamps) is kept in
/// `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderUser {
    /// Provider-assigned user id.
    pub id: String,
    /// Email address, if the provider has one for this user.
    #[serde(default)]
    pub email: Option<String>,
    /// Remaining provider fields.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl ProviderUser {
    /// Creates a user with no extra fields.
    #[must_use]
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
            extra: Map::new(),
        }
    }

    /// Adds a provider field that the gateway does not interpret.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// The public identity exposed to callers: exactly `{id, email}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub email: Option<String>,
}

impl From<&ProviderUser> for UserIdentity {
    fn from(user: &ProviderUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
        }
    }
}
