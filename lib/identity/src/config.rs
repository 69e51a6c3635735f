//! Identity provider configuration.
//!
//! This module provides configuration types for connecting to an external
//! Supabase-compatible identity provider: a GoTrue auth API plus an edge
//! functions endpoint, both rooted at the same project URL.

use serde::{Deserialize, Serialize};

/// Configuration for the identity provider.
///
/// The base URL and public API key are process-wide constants supplied at
/// startup. Fields with defaults can be omitted when loading from
/// environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The project base URL (e.g., "https://abc.supabase.co").
    url: String,
    /// The public (anon) API key sent as the `apikey` header on every call.
    anon_key: String,
    /// Path of the auth API below the base URL.
    /// Default: "/auth/v1"
    #[serde(default = "default_auth_path")]
    auth_path: String,
    /// Path of the edge functions API below the base URL.
    /// Default: "/functions/v1"
    #[serde(default = "default_functions_path")]
    functions_path: String,
}

fn default_auth_path() -> String {
    "/auth/v1".to_string()
}

fn default_functions_path() -> String {
    "/functions/v1".to_string()
}

/// Joins a base URL and path segments with exactly one slash between them.
fn join(base: &str, segments: &[&str]) -> String {
    let mut joined = base.trim_end_matches('/').to_string();
    for segment in segments {
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            continue;
        }
        joined.push('/');
        joined.push_str(segment);
    }
    joined
}

impl ProviderConfig {
    /// Creates a new provider configuration with defaults for optional fields.
    #[must_use]
    pub fn new(url: String, anon_key: String) -> Self {
        Self {
            url,
            anon_key,
            auth_path: default_auth_path(),
            functions_path: default_functions_path(),
        }
    }

    /// Returns the project base URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the public API key.
    #[must_use]
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Returns the auth API path.
    #[must_use]
    pub fn auth_path(&self) -> &str {
        &self.auth_path
    }

    /// Returns the functions API path.
    #[must_use]
    pub fn functions_path(&self) -> &str {
        &self.functions_path
    }

    /// Returns the absolute URL of an auth API endpoint.
    #[must_use]
    pub fn auth_endpoint(&self, endpoint: &str) -> String {
        join(&self.url, &[&self.auth_path, endpoint])
    }

    /// Returns the absolute URL of a named edge function.
    #[must_use]
    pub fn function_endpoint(&self, name: &str) -> String {
        join(&self.url, &[&self.functions_path, name])
    }
}
