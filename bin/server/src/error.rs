//! Error types and response mapping for the gateway.
//!
//! Every handler returns `Result<Response, ApiError>`; `ApiError` is the
//! one place where failures become HTTP status codes and JSON bodies. A
//! handler that panics is caught by [`catch_unexpected`] and answered with
//! the same generic body its `ApiError::Unexpected` would produce.

use axum::{
    Json,
    body::Body,
    http::{Response as HttpResponse, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::{any::Any, fmt};
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

/// JSON error body: `{error}` or `{error, details}`.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

/// Failures a handler can answer with.
#[derive(Debug)]
pub enum ApiError {
    /// The request is missing required input. No provider call was made.
    BadRequest(&'static str),
    /// The provider did not resolve a user.
    Unauthorized(&'static str),
    /// The provider reported a failure; `{error: message}`.
    Provider { message: String },
    /// The provider reported a failure; `{error: summary, details: message}`.
    ProviderDetailed {
        summary: &'static str,
        message: String,
    },
    /// Anything else. `details` is logged and never sent to the caller.
    Unexpected {
        message: &'static str,
        details: String,
    },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(message) => write!(f, "bad request: {message}"),
            Self::Unauthorized(message) => write!(f, "unauthorized: {message}"),
            Self::Provider { message } => write!(f, "provider failure: {message}"),
            Self::ProviderDetailed { summary, message } => {
                write!(f, "{summary} {message}")
            }
            Self::Unexpected { details, .. } => write!(f, "unexpected failure: {details}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Provider { .. } | Self::ProviderDetailed { .. } | Self::Unexpected { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::BadRequest(message) | Self::Unauthorized(message) => ErrorBody {
                error: message,
                details: None,
            },
            Self::Provider { message } => ErrorBody {
                error: message,
                details: None,
            },
            Self::ProviderDetailed { summary, message } => ErrorBody {
                error: summary,
                details: Some(message.as_str()),
            },
            Self::Unexpected { message, details } => {
                tracing::error!(error = %details, "{}", message);
                ErrorBody {
                    error: message,
                    details: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Answers a panicking handler with a generic 500 JSON body.
#[derive(Debug, Clone, Copy)]
pub struct PanicResponse {
    message: &'static str,
}

impl ResponseForPanic for PanicResponse {
    type ResponseBody = Body;

    fn response_for_panic(
        &mut self,
        err: Box<dyn Any + Send + 'static>,
    ) -> HttpResponse<Self::ResponseBody> {
        let details = if let Some(s) = err.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            (*s).to_string()
        } else {
            "unknown panic payload".to_string()
        };

        ApiError::Unexpected {
            message: self.message,
            details: format!("handler panicked: {details}"),
        }
        .into_response()
    }
}

/// Layer that turns a panic inside a route into that route's generic 500 body.
#[must_use]
pub fn catch_unexpected(message: &'static str) -> CatchPanicLayer<PanicResponse> {
    CatchPanicLayer::custom(PanicResponse { message })
}

/// Errors that stop the server from starting.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration is missing or invalid.
    Configuration { details: String },
    /// The identity provider client could not be built.
    Provider { details: String },
    /// The listen address could not be bound.
    Bind { addr: String, details: String },
    /// The server stopped with an error.
    Serve { details: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { details } => {
                write!(f, "failed to load configuration: {details}")
            }
            Self::Provider { details } => {
                write!(f, "failed to create identity provider client: {details}")
            }
            Self::Bind { addr, details } => {
                write!(f, "failed to bind to {addr}: {details}")
            }
            Self::Serve { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for StartupError {}
