//! Credential extractors for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::CookieJar;
use std::{convert::Infallible, sync::Arc};
use taskgate_core::BearerCredential;
use taskgate_identity::{IdentityProvider, ProviderUser};

use super::{ACCESS_TOKEN_COOKIE, AppState};
use crate::error::ApiError;

/// Body sent when a protected route cannot resolve a user.
const UNAUTHORIZED: &str = "Unauthorized";

/// Body sent when a protected route fails unexpectedly.
const UNEXPECTED: &str = "An unexpected server error occurred.";

/// Extractor for the caller's credential, if any.
///
/// The `Authorization` header is taken verbatim. Without one, the access
/// token cookie is used as a bearer token. Never rejects.
pub struct Credential(pub Option<BearerCredential>);

impl<S> FromRequestParts<S> for Credential
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Credential(credential_from_headers(&parts.headers)))
    }
}

fn credential_from_headers(headers: &HeaderMap) -> Option<BearerCredential> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        return match value.to_str() {
            Ok(value) => Some(BearerCredential::new(value)),
            Err(_) => {
                tracing::debug!("ignoring non-visible-ASCII Authorization header");
                None
            }
        };
    }

    CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| BearerCredential::from_access_token(cookie.value()))
}

/// Extractor for requiring a user resolved by the identity provider.
///
/// Carries the credentialed client that resolved the user so the handler
/// makes its follow-up calls with the same credential.
pub struct RequireUser {
    pub user: ProviderUser,
    pub client: Box<dyn IdentityProvider>,
}

impl<S> FromRequestParts<S> for RequireUser
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let client = app_state.client(credential_from_headers(&parts.headers));

        match client.current_user().await {
            Ok(Some(user)) => Ok(RequireUser { user, client }),
            Ok(None) => {
                tracing::debug!("identity provider resolved no user");
                Err(ApiError::Unauthorized(UNAUTHORIZED))
            }
            Err(e) if e.is_rejection() => {
                tracing::debug!(error = %e, "identity provider rejected credential");
                Err(ApiError::Unauthorized(UNAUTHORIZED))
            }
            Err(e) => Err(ApiError::Unexpected {
                message: UNEXPECTED,
                details: e.to_string(),
            }),
        }
    }
}
