//! Identity provider abstraction.
//!
//! Provides the interface the gateway uses to talk to its identity
//! provider, so handlers can run against the real HTTP client or a test
//! double.

use crate::error::ProviderError;
use crate::session::{OAuthInitiation, ProviderSession};
use crate::user::ProviderUser;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use taskgate_core::BearerCredential;

/// A request-scoped client for the identity provider.
///
/// A client either carries the caller's bearer credential or is anonymous;
/// every call made through it uses that same credential.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Starts an OAuth flow with the named external provider.
    ///
    /// `redirect_to` is where the provider sends the browser back with a code.
    async fn begin_oauth(
        &self,
        provider: &str,
        redirect_to: &str,
    ) -> Result<OAuthInitiation, ProviderError>;

    /// Exchanges an authorization code for a session.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<ProviderSession, ProviderError>;

    /// Resolves the user identified by this client's credential.
    ///
    /// `Ok(None)` means the provider answered but named no user.
    async fn current_user(&self) -> Result<Option<ProviderUser>, ProviderError>;

    /// Ends the session identified by this client's credential.
    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Invokes a remote function with a JSON payload and returns its result.
    async fn invoke_function(
        &self,
        name: &str,
        payload: &JsonValue,
    ) -> Result<JsonValue, ProviderError>;
}

/// Builds request-scoped identity provider clients.
///
/// Implementations hold the process-wide provider configuration; the
/// credential is supplied per call and lives only as long as the returned
/// client.
pub trait ProviderConnector: Send + Sync {
    /// Returns a fresh client, credentialed when `credential` is present.
    fn connect(&self, credential: Option<BearerCredential>) -> Box<dyn IdentityProvider>;
}
