//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys
//! use a double underscore, e.g. `SUPABASE__ANON_KEY` or
//! `GATEWAY__SESSION__SECURE_COOKIES`.
//!
//! See [`ProviderConfig`](taskgate_identity::ProviderConfig) for the
//! identity provider connection settings.

use serde::Deserialize;
use taskgate_identity::ProviderConfig;

const WILDCARD_ORIGIN: &str = "*";

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Identity provider connection settings.
    pub supabase: ProviderConfig,

    /// Gateway behavior.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Gateway-level behavior that is not specific to the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Where the browser lands after a successful OAuth callback.
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,

    /// Externally visible origin of this gateway (e.g. "https://api.example.com").
    /// When unset, the origin is derived from each request.
    #[serde(default)]
    pub public_origin: Option<String>,

    /// Comma-separated origins allowed to call the API from a browser.
    /// When empty, the origin of `dashboard_url` is allowed.
    #[serde(default)]
    pub cors_origins: String,

    /// Session cookie settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// Access token cookie lifetime, used when the provider omits `expires_in`.
    #[serde(default = "default_access_token_ttl_seconds")]
    pub access_token_ttl_seconds: i64,

    /// Refresh token cookie lifetime in days.
    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: i64,

    /// Lifetime of the PKCE verifier cookie in minutes.
    #[serde(default = "default_verifier_ttl_minutes")]
    pub verifier_ttl_minutes: i64,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8787".to_string()
}

fn default_dashboard_url() -> String {
    "https://our-task-app.pages.dev/dashboard".to_string()
}

fn default_secure_cookies() -> bool {
    true
}

fn default_access_token_ttl_seconds() -> i64 {
    3600
}

fn default_refresh_token_ttl_days() -> i64 {
    30
}

fn default_verifier_ttl_minutes() -> i64 {
    10
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            dashboard_url: default_dashboard_url(),
            public_origin: None,
            cors_origins: String::new(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secure_cookies: default_secure_cookies(),
            access_token_ttl_seconds: default_access_token_ttl_seconds(),
            refresh_token_ttl_days: default_refresh_token_ttl_days(),
            verifier_ttl_minutes: default_verifier_ttl_minutes(),
        }
    }
}

impl GatewayConfig {
    /// Checks settings that deserialization alone cannot.
    ///
    /// # Errors
    ///
    /// Returns an error if `cors_origins` contains the `*` wildcard, which
    /// cannot be combined with credentialed CORS responses.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.configured_origins().any(|origin| origin == WILDCARD_ORIGIN) {
            return Err(config::ConfigError::Message(
                "gateway.cors_origins cannot contain '*' when credentials are allowed".to_string(),
            ));
        }
        Ok(())
    }

    fn configured_origins(&self) -> impl Iterator<Item = &str> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| origin.trim_end_matches('/'))
    }

    /// Returns the browser origins allowed by CORS.
    ///
    /// A `*` entry is never returned; see [`GatewayConfig::validate`].
    #[must_use]
    pub fn allowed_origins(&self) -> Vec<String> {
        let configured: Vec<String> = self
            .configured_origins()
            .filter(|origin| *origin != WILDCARD_ORIGIN)
            .map(str::to_string)
            .collect();
        if !configured.is_empty() {
            return configured;
        }

        url::Url::parse(&self.dashboard_url)
            .ok()
            .map(|url| url.origin())
            .filter(url::Origin::is_tuple)
            .map(|origin| vec![origin.ascii_serialization()])
            .unwrap_or_default()
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(
            config::Environment::default()
                .separator("__")
                .try_parsing(true),
        )
    }

    fn load<S>(source: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config: Self = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        config.gateway.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert!(config.secure_cookies);
        assert_eq!(config.access_token_ttl_seconds, 3600);
        assert_eq!(config.refresh_token_ttl_days, 30);
        assert_eq!(config.verifier_ttl_minutes, 10);
    }

    #[test]
    fn gateway_defaults_to_dashboard_origin_for_cors() {
        let config = GatewayConfig::default();
        assert_eq!(config.dashboard_url, "https://our-task-app.pages.dev/dashboard");
        assert_eq!(
            config.allowed_origins(),
            vec!["https://our-task-app.pages.dev".to_string()]
        );
    }

    #[test]
    fn explicit_cors_origins_are_split_and_trimmed() {
        let config = GatewayConfig {
            cors_origins: " http://localhost:5173/ , https://app.example.com ,".to_string(),
            ..GatewayConfig::default()
        };
        assert_eq!(
            config.allowed_origins(),
            vec![
                "http://localhost:5173".to_string(),
                "https://app.example.com".to_string()
            ]
        );
    }

    #[test]
    fn wildcard_cors_origin_is_rejected() {
        for origins in ["*", "https://app.example.com, *"] {
            let config = GatewayConfig {
                cors_origins: origins.to_string(),
                ..GatewayConfig::default()
            };
            assert!(config.validate().is_err(), "{origins}");
            assert!(
                !config.allowed_origins().iter().any(|o| o == "*"),
                "{origins}"
            );
        }

        assert!(GatewayConfig::default().validate().is_ok());
    }

    #[test]
    fn loading_fails_on_wildcard_cors_origin() {
        let source = config::Config::builder()
            .set_override("supabase.url", "https://abc.supabase.co")
            .and_then(|b| b.set_override("supabase.anon_key", "anon"))
            .and_then(|b| b.set_override("gateway.cors_origins", "*"))
            .expect("overrides")
            .build()
            .expect("build");

        let err = ServerConfig::load(source).expect_err("wildcard should be rejected");
        assert!(err.to_string().contains("cors_origins"));
    }

    #[test]
    fn server_config_deserializes_nested_sections() {
        let source = config::Config::builder()
            .set_override("supabase.url", "https://abc.supabase.co")
            .and_then(|b| b.set_override("supabase.anon_key", "anon"))
            .and_then(|b| b.set_override("gateway.session.secure_cookies", false))
            .expect("overrides")
            .build()
            .expect("build");

        let config: ServerConfig = source.try_deserialize().expect("deserialize");

        assert_eq!(config.listen_addr, "0.0.0.0:8787");
        assert_eq!(config.supabase.url(), "https://abc.supabase.co");
        assert_eq!(config.supabase.anon_key(), "anon");
        assert!(!config.gateway.session.secure_cookies);
        assert_eq!(config.gateway.session.access_token_ttl_seconds, 3600);
    }
}
