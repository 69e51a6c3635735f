//! taskgate HTTP gateway.
//!
//! A stateless front door for the task app: it forwards each caller's
//! credential to the identity provider for login, callback, identity
//! lookup, and logout, and delegates exercise recording to a remote
//! function on the caller's behalf.

pub mod auth;
pub mod config;
pub mod error;
pub mod exercise;

#[cfg(test)]
pub(crate) mod testing;

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use ulid::Ulid;

use crate::auth::{
    AppState,
    routes::{CALLBACK_UNEXPECTED, LOGIN_UNEXPECTED, LOGOUT_UNEXPECTED, ME_UNEXPECTED},
};
use crate::config::GatewayConfig;
use crate::error::catch_unexpected;
use crate::exercise::EXERCISE_UNEXPECTED;

/// Builds the gateway router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.gateway);

    Router::new()
        .route(
            "/api/auth/login/{provider}",
            get(auth::login).layer(catch_unexpected(LOGIN_UNEXPECTED)),
        )
        .route(
            "/api/auth/callback",
            get(auth::callback).layer(catch_unexpected(CALLBACK_UNEXPECTED)),
        )
        .route(
            "/api/me",
            get(auth::me).layer(catch_unexpected(ME_UNEXPECTED)),
        )
        .route(
            "/api/auth/logout",
            post(auth::logout).layer(catch_unexpected(LOGOUT_UNEXPECTED)),
        )
        .route(
            "/api/exercise",
            post(exercise::record_exercise).layer(catch_unexpected(EXERCISE_UNEXPECTED)),
        )
        .route("/healthz", get(|| async { "ok" }))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %Ulid::new(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(state)
}

fn cors_layer(gateway: &GatewayConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = gateway
        .allowed_origins()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%origin, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
