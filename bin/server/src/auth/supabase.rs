//! Supabase-compatible identity provider client.
//!
//! Talks to a GoTrue auth API and an edge functions endpoint over HTTP.
//! Every request carries the public `apikey` header and an `Authorization`
//! header: the caller's credential when the client has one, otherwise the
//! public key as a bearer token.

use async_trait::async_trait;
use oauth2::PkceCodeChallenge;
use reqwest::{
    Client, Method, RequestBuilder, Response, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue},
};
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use taskgate_core::BearerCredential;
use taskgate_identity::{
    IdentityProvider, OAuthInitiation, ProviderConfig, ProviderConnector, ProviderError,
    ProviderSession, ProviderUser,
};
use tracing::{debug, instrument, warn};
use url::Url;

/// Header carrying the public API key.
const API_KEY_HEADER: &str = "apikey";

/// Header identifying this client to the provider.
const CLIENT_INFO_HEADER: &str = "x-client-info";

/// Set by the functions relay when it failed before reaching the function.
const RELAY_ERROR_HEADER: &str = "x-relay-error";

const CLIENT_INFO: &str = concat!("taskgate-server/", env!("CARGO_PKG_VERSION"));

/// Body keys the auth API uses for failure messages, in order of preference.
const ERROR_MESSAGE_KEYS: &[&str] = &["msg", "message", "error_description", "error"];

/// Builds request-scoped [`SupabaseClient`]s.
///
/// The HTTP connection pool is shared between clients; the credential is not.
#[derive(Clone)]
pub struct SupabaseConnector {
    http: Client,
    config: Arc<ProviderConfig>,
}

impl SupabaseConnector {
    /// Creates a connector for the configured project.
    ///
    /// # Errors
    ///
    /// Returns an error if the project URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        Url::parse(config.url()).map_err(|e| ProviderError::Configuration {
            details: format!("invalid provider URL '{}': {}", config.url(), e),
        })?;

        let http = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ProviderError::Configuration {
                details: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }
}

impl ProviderConnector for SupabaseConnector {
    fn connect(&self, credential: Option<BearerCredential>) -> Box<dyn IdentityProvider> {
        Box::new(SupabaseClient {
            http: self.http.clone(),
            config: Arc::clone(&self.config),
            credential,
        })
    }
}

/// A Supabase client bound to at most one caller credential.
pub struct SupabaseClient {
    http: Client,
    config: Arc<ProviderConfig>,
    credential: Option<BearerCredential>,
}

impl SupabaseClient {
    /// Starts a request with the provider headers attached.
    fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, ProviderError> {
        let authorization = match &self.credential {
            Some(credential) => HeaderValue::from_str(credential.as_str())
                .map_err(|_| ProviderError::rejected("Invalid authorization header"))?,
            None => HeaderValue::from_str(&format!("Bearer {}", self.config.anon_key())).map_err(
                |e| ProviderError::Configuration {
                    details: format!("invalid API key: {e}"),
                },
            )?,
        };

        Ok(self
            .http
            .request(method, url)
            .header(API_KEY_HEADER, self.config.anon_key())
            .header(AUTHORIZATION, authorization)
            .header(CLIENT_INFO_HEADER, CLIENT_INFO))
    }
}

async fn send(request: RequestBuilder) -> Result<Response, ProviderError> {
    request.send().await.map_err(|e| ProviderError::Transport {
        details: e.to_string(),
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let bytes = response.bytes().await.map_err(|e| ProviderError::Transport {
        details: format!("failed to read response body: {e}"),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::MalformedResponse {
        details: e.to_string(),
    })
}

/// Turns a failed auth API response into a rejection with the provider's message.
async fn rejection(response: Response) -> ProviderError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return ProviderError::Transport {
                details: format!("failed to read error body: {e}"),
            };
        }
    };

    let message = error_message(&body).unwrap_or_else(|| fallback_message(status));
    ProviderError::rejected_with_status(status.as_u16(), message)
}

fn error_message(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    ERROR_MESSAGE_KEYS
        .iter()
        .find_map(|key| value.get(key).and_then(JsonValue::as_str))
        .map(str::to_string)
}

fn fallback_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string)
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
    #[instrument(skip(self))]
    async fn begin_oauth(
        &self,
        provider: &str,
        redirect_to: &str,
    ) -> Result<OAuthInitiation, ProviderError> {
        let mut url = Url::parse(&self.config.auth_endpoint("authorize")).map_err(|e| {
            ProviderError::Configuration {
                details: format!("invalid authorize URL: {e}"),
            }
        })?;

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", pkce_challenge.as_str())
            .append_pair("code_challenge_method", "s256");

        debug!("authorization URL built");

        Ok(OAuthInitiation {
            url: url.to_string(),
            code_verifier: Some(pkce_verifier.secret().clone()),
        })
    }

    #[instrument(skip_all)]
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<ProviderSession, ProviderError> {
        let request = self
            .request(Method::POST, &self.config.auth_endpoint("token"))?
            .query(&[("grant_type", "pkce")])
            .json(&json!({
                "auth_code": code,
                "code_verifier": code_verifier.unwrap_or_default(),
            }));

        let response = send(request).await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let session: ProviderSession = read_json(response).await?;
        debug!(
            user_id = session.user.as_ref().map(|u| u.id.as_str()),
            "code exchanged for session"
        );
        Ok(session)
    }

    #[instrument(skip_all)]
    async fn current_user(&self) -> Result<Option<ProviderUser>, ProviderError> {
        if self.credential.is_none() {
            return Err(ProviderError::rejected("Auth session missing!"));
        }

        let response = send(self.request(Method::GET, &self.config.auth_endpoint("user"))?).await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        read_json(response).await
    }

    #[instrument(skip_all)]
    async fn sign_out(&self) -> Result<(), ProviderError> {
        if self.credential.is_none() {
            debug!("no credential, nothing to revoke");
            return Ok(());
        }

        let request = self
            .request(Method::POST, &self.config.auth_endpoint("logout"))?
            .query(&[("scope", "global")]);

        let response = send(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // The session is already gone as far as the provider is concerned.
        if matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        ) {
            debug!(status = status.as_u16(), "session already invalid");
            return Ok(());
        }

        Err(rejection(response).await)
    }

    #[instrument(skip(self, payload))]
    async fn invoke_function(
        &self,
        name: &str,
        payload: &JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let request = self
            .request(Method::POST, &self.config.function_endpoint(name))?
            .json(payload);

        let response = send(request).await?;
        let status = response.status();

        let relay_error = response
            .headers()
            .get(RELAY_ERROR_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        if relay_error {
            return Err(ProviderError::rejected_with_status(
                status.as_u16(),
                "Relay Error invoking the Edge Function",
            ));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "edge function failed");
            return Err(ProviderError::rejected_with_status(
                status.as_u16(),
                "Edge Function returned a non-2xx status code",
            ));
        }

        if is_json(&response) {
            let bytes = response.bytes().await.map_err(|e| ProviderError::Transport {
                details: format!("failed to read function response: {e}"),
            })?;
            if bytes.is_empty() {
                return Ok(JsonValue::Null);
            }
            return serde_json::from_slice(&bytes).map_err(|e| ProviderError::MalformedResponse {
                details: e.to_string(),
            });
        }

        let text = response.text().await.map_err(|e| ProviderError::Transport {
            details: format!("failed to read function response: {e}"),
        })?;
        Ok(JsonValue::String(text))
    }
}
