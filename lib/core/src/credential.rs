//! Request-scoped bearer credential.
//!
//! A `BearerCredential` is the opaque value of an inbound `Authorization`
//! header. The gateway never parses or validates it; it is only forwarded
//! to the identity provider, which decides whether it identifies a user.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque `Authorization` header value, forwarded verbatim.
///
/// The `Debug` and `Display` implementations never print the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerCredential(String);

impl BearerCredential {
    /// Wraps a raw `Authorization` header value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Builds a credential from a bare access token, as stored in a session cookie.
    #[must_use]
    pub fn from_access_token(token: &str) -> Self {
        Self(format!("Bearer {token}"))
    }

    /// Returns the header value exactly as it was received.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerCredential").field(&"<redacted>").finish()
    }
}

impl fmt::Display for BearerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted>")
    }
}
