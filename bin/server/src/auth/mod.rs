//! Authentication module for the taskgate server.
//!
//! This module provides:
//! - The session-forwarding routes (login, callback, current user, logout)
//! - Credential extractors for Axum routes
//! - The Supabase HTTP implementation of the identity provider traits
//!
//! # Credential Forwarding
//!
//! The gateway keeps no sessions of its own. Each request's `Authorization`
//! header (or, failing that, the access-token cookie set by the OAuth
//! callback) is handed to [`AppState::client`], which asks the configured
//! [`ProviderConnector`] for a fresh client carrying that credential. The
//! client is dropped with the request.

pub mod middleware;
pub mod routes;
pub mod supabase;

use crate::config::GatewayConfig;
use std::sync::Arc;
use taskgate_core::BearerCredential;
use taskgate_identity::{IdentityProvider, ProviderConnector};

pub use middleware::{Credential, RequireUser};
pub use routes::{callback, login, logout, me};
pub use supabase::{SupabaseClient, SupabaseConnector};

/// Cookie holding the access token issued on the OAuth callback.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

/// Cookie holding the refresh token issued on the OAuth callback.
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

/// Cookie holding the PKCE verifier between login and callback.
pub const CODE_VERIFIER_COOKIE: &str = "sb-code-verifier";

/// Shared application state.
pub struct AppState {
    /// Factory for request-scoped identity provider clients.
    pub connector: Arc<dyn ProviderConnector>,
    /// Gateway configuration.
    pub gateway: GatewayConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(connector: Arc<dyn ProviderConnector>, gateway: GatewayConfig) -> Self {
        Self { connector, gateway }
    }

    /// Builds a provider client for one request, credentialed when `credential` is present.
    pub fn client(&self, credential: Option<BearerCredential>) -> Box<dyn IdentityProvider> {
        self.connector.connect(credential)
    }
}
