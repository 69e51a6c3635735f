//! Session shapes produced by the OAuth flow.

use crate::user::ProviderUser;
use serde::{Deserialize, Serialize};

/// Result of starting an OAuth flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthInitiation {
    /// Authorization URL the browser should be sent to.
    pub url: String,
    /// PKCE verifier that must accompany the code exchange, if the flow uses PKCE.
    pub code_verifier: Option<String>,
}

/// A session issued by the provider after a successful code exchange.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<ProviderUser>,
}

impl std::fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSession")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("user", &self.user.as_ref().map(|u| &u.id))
            .finish()
    }
}
