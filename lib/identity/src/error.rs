//! Error types for the identity crate.
//!
//! `ProviderError` separates two kinds of failure that the HTTP layer maps
//! differently:
//! - `Rejected`: the provider answered and reported a failure. Its message
//!   is meant to be surfaced to the caller.
//! - everything else: the call itself went wrong (network, unreadable
//!   response, bad configuration). These are logged, never surfaced.

use std::fmt;

/// Errors from identity provider operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider reported a failure.
    Rejected {
        /// HTTP status returned by the provider, if the failure came from a response.
        status: Option<u16>,
        /// Provider-supplied failure message.
        message: String,
    },
    /// The provider could not be reached.
    Transport { details: String },
    /// The provider answered with something that could not be understood.
    MalformedResponse { details: String },
    /// The client could not be configured for the call.
    Configuration { details: String },
}

impl ProviderError {
    /// Creates a rejection that did not come from an HTTP response.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a rejection carrying the provider's HTTP status.
    #[must_use]
    pub fn rejected_with_status(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Returns true if the provider itself reported the failure.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Returns the provider's message for rejections.
    #[must_use]
    pub fn rejection_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected {
                status: Some(status),
                message,
            } => write!(f, "provider rejected the request ({status}): {message}"),
            Self::Rejected {
                status: None,
                message,
            } => write!(f, "provider rejected the request: {message}"),
            Self::Transport { details } => {
                write!(f, "failed to reach identity provider: {details}")
            }
            Self::MalformedResponse { details } => {
                write!(f, "malformed identity provider response: {details}")
            }
            Self::Configuration { details } => {
                write!(f, "identity provider client configuration error: {details}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_exposes_message() {
        let err = ProviderError::rejected_with_status(401, "invalid JWT");
        assert!(err.is_rejection());
        assert_eq!(err.rejection_message(), Some("invalid JWT"));
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid JWT"));
    }

    #[test]
    fn transport_error_is_not_a_rejection() {
        let err = ProviderError::Transport {
            details: "connection refused".to_string(),
        };
        assert!(!err.is_rejection());
        assert_eq!(err.rejection_message(), None);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn malformed_response_display() {
        let err = ProviderError::MalformedResponse {
            details: "expected value at line 1".to_string(),
        };
        assert!(err.to_string().contains("malformed"));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn rejection_without_status_display() {
        let err = ProviderError::rejected("Auth session missing!");
        assert_eq!(
            err.to_string(),
            "provider rejected the request: Auth session missing!"
        );
    }
}
