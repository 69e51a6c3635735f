//! Authentication routes for login, callback, current user, and logout.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{
        HeaderMap, StatusCode, Uri,
        header::{HOST, LOCATION},
    },
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskgate_identity::{ProviderError, UserIdentity};
use time::Duration as TimeDuration;

use super::{
    ACCESS_TOKEN_COOKIE, AppState, CODE_VERIFIER_COOKIE, REFRESH_TOKEN_COOKIE,
    middleware::Credential,
};
use crate::config::{GatewayConfig, SessionConfig};
use crate::error::ApiError;

/// Path the identity provider redirects back to.
pub const CALLBACK_PATH: &str = "/api/auth/callback";

/// Generic failure bodies, one per route.
pub const LOGIN_UNEXPECTED: &str = "An unexpected server error occurred";
pub const CALLBACK_UNEXPECTED: &str = "An unexpected server error occurred";
pub const ME_UNEXPECTED: &str = "An unexpected server error occurred";
pub const LOGOUT_UNEXPECTED: &str = "An unexpected error occurred";

const NO_CODE: &str = "No code provided";
const INVALID_TOKEN: &str = "Unauthorized or invalid token";
const SIGN_OUT_FAILED: &str = "Failed to sign out";
const SIGNED_OUT: &str = "Successfully logged out";

/// Query parameters for the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
}

/// A 302 redirect. Axum's `Redirect` only offers 303/307/308.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// Maps a provider failure: rejections surface the provider's message.
fn provider_failure(error: ProviderError, unexpected: &'static str) -> ApiError {
    match error {
        ProviderError::Rejected { message, .. } => {
            tracing::warn!(%message, "identity provider rejected request");
            ApiError::Provider { message }
        }
        other => ApiError::Unexpected {
            message: unexpected,
            details: other.to_string(),
        },
    }
}

fn first_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Returns the origin (scheme and authority) this request was addressed to.
fn request_origin(gateway: &GatewayConfig, uri: &Uri, headers: &HeaderMap) -> String {
    if let Some(origin) = &gateway.public_origin {
        return origin.trim_end_matches('/').to_string();
    }

    if let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) {
        return format!("{scheme}://{authority}");
    }

    let scheme = first_header_value(headers, "x-forwarded-proto").unwrap_or("http");
    let host = first_header_value(headers, "x-forwarded-host")
        .or_else(|| first_header_value(headers, HOST.as_str()))
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}

fn session_cookie(
    name: &'static str,
    value: String,
    max_age: TimeDuration,
    session: &SessionConfig,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(session.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}

/// Initiates the OAuth flow by redirecting to the identity provider.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let redirect_to = format!(
        "{}{CALLBACK_PATH}",
        request_origin(&state.gateway, &uri, &headers)
    );
    tracing::debug!(%provider, %redirect_to, "starting OAuth flow");

    let initiation = state
        .client(None)
        .begin_oauth(&provider, &redirect_to)
        .await
        .map_err(|e| provider_failure(e, LOGIN_UNEXPECTED))?;

    let session = &state.gateway.session;
    let jar = match initiation.code_verifier {
        Some(verifier) => jar.add(session_cookie(
            CODE_VERIFIER_COOKIE,
            verifier,
            TimeDuration::minutes(session.verifier_ttl_minutes),
            session,
        )),
        None => jar,
    };

    Ok((jar, found(&initiation.url)).into_response())
}

/// Handles the OAuth callback: exchanges the code and delivers the session as cookies.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let Some(code) = query.code.filter(|code| !code.is_empty()) else {
        return Err(ApiError::BadRequest(NO_CODE));
    };

    let verifier = jar
        .get(CODE_VERIFIER_COOKIE)
        .map(|cookie| cookie.value().to_string());

    let session = state
        .client(None)
        .exchange_code(&code, verifier.as_deref())
        .await
        .map_err(|e| provider_failure(e, CALLBACK_UNEXPECTED))?;

    let config = &state.gateway.session;
    let access_max_age = session
        .expires_in
        .and_then(|secs| i64::try_from(secs).ok())
        .unwrap_or(config.access_token_ttl_seconds);

    let mut jar = jar
        .add(session_cookie(
            ACCESS_TOKEN_COOKIE,
            session.access_token,
            TimeDuration::seconds(access_max_age),
            config,
        ))
        .add(removal_cookie(CODE_VERIFIER_COOKIE));
    if let Some(refresh_token) = session.refresh_token {
        jar = jar.add(session_cookie(
            REFRESH_TOKEN_COOKIE,
            refresh_token,
            TimeDuration::days(config.refresh_token_ttl_days),
            config,
        ));
    }

    tracing::info!(
        user_id = session.user.as_ref().map(|u| u.id.as_str()),
        "OAuth session established"
    );

    Ok((jar, found(&state.gateway.dashboard_url)).into_response())
}

/// Returns the caller's identity as `{id, email}`.
pub async fn me(
    State(state): State<Arc<AppState>>,
    Credential(credential): Credential,
) -> Result<Json<UserIdentity>, ApiError> {
    match state.client(credential).current_user().await {
        Ok(Some(user)) => Ok(Json(UserIdentity::from(&user))),
        Ok(None) => {
            tracing::debug!("identity provider resolved no user");
            Err(ApiError::Unauthorized(INVALID_TOKEN))
        }
        Err(e) if e.is_rejection() => {
            tracing::warn!(error = %e, "identity provider rejected credential");
            Err(ApiError::Unauthorized(INVALID_TOKEN))
        }
        Err(e) => Err(ApiError::Unexpected {
            message: ME_UNEXPECTED,
            details: e.to_string(),
        }),
    }
}

/// Ends the caller's provider session and clears the session cookies.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Credential(credential): Credential,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    state
        .client(credential)
        .sign_out()
        .await
        .map_err(|e| match e {
            ProviderError::Rejected { message, .. } => {
                tracing::error!(%message, "identity provider sign-out failed");
                ApiError::ProviderDetailed {
                    summary: SIGN_OUT_FAILED,
                    message,
                }
            }
            other => ApiError::Unexpected {
                message: LOGOUT_UNEXPECTED,
                details: other.to_string(),
            },
        })?;

    let jar = jar
        .add(removal_cookie(ACCESS_TOKEN_COOKIE))
        .add(removal_cookie(REFRESH_TOKEN_COOKIE));

    Ok((jar, Json(MessageBody { message: SIGNED_OUT })).into_response())
}
