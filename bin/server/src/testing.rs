//! Scripted identity provider and request helpers for router tests.

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, header::SET_COOKIE},
    response::Response,
};
use serde_json::{Value as JsonValue, json};
use std::sync::{Arc, Mutex};
use taskgate_core::BearerCredential;
use taskgate_identity::{
    IdentityProvider, OAuthInitiation, ProviderConnector, ProviderError, ProviderSession,
    ProviderUser,
};
use tower::ServiceExt;

use crate::auth::AppState;
use crate::config::GatewayConfig;

/// The only credential the scripted provider accepts.
pub const VALID_CREDENTIAL: &str = "Bearer good-token";

pub fn alice() -> ProviderUser {
    ProviderUser::new("user-alice", Some("alice@example.com".to_string()))
}

/// What a scripted provider operation does when called.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    Succeed(T),
    /// The provider reports a failure with this message.
    Reject(&'static str),
    /// The provider cannot be reached.
    Fail,
    Panic,
}

impl<T: Clone> Outcome<T> {
    fn resolve(&self) -> Result<T, ProviderError> {
        match self {
            Self::Succeed(value) => Ok(value.clone()),
            Self::Reject(message) => Err(ProviderError::rejected_with_status(400, *message)),
            Self::Fail => Err(ProviderError::Transport {
                details: "connection refused".to_string(),
            }),
            Self::Panic => panic!("scripted provider panic"),
        }
    }
}

/// A provider call as observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect {
        credential: Option<String>,
    },
    BeginOAuth {
        provider: String,
        redirect_to: String,
    },
    ExchangeCode {
        code: String,
        code_verifier: Option<String>,
    },
    CurrentUser,
    SignOut,
    InvokeFunction {
        name: String,
        payload: JsonValue,
    },
}

/// Per-operation outcomes for the scripted provider.
#[derive(Debug, Clone)]
pub struct Script {
    pub begin_oauth: Outcome<OAuthInitiation>,
    pub exchange_code: Outcome<ProviderSession>,
    pub current_user: Outcome<Option<ProviderUser>>,
    pub sign_out: Outcome<()>,
    pub invoke_function: Outcome<JsonValue>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            begin_oauth: Outcome::Succeed(OAuthInitiation {
                url: "https://auth.example.com/authorize".to_string(),
                code_verifier: Some("verifier".to_string()),
            }),
            exchange_code: Outcome::Succeed(ProviderSession {
                access_token: "access".to_string(),
                refresh_token: None,
                expires_in: None,
                token_type: Some("bearer".to_string()),
                user: Some(alice()),
            }),
            current_user: Outcome::Succeed(Some(alice())),
            sign_out: Outcome::Succeed(()),
            invoke_function: Outcome::Succeed(json!({ "ok": true })),
        }
    }
}

/// Connector handing out scripted clients and recording every call.
#[derive(Clone)]
pub struct MockConnector {
    script: Arc<Script>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockConnector {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(script),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn router(&self) -> Router {
        self.router_with(GatewayConfig::default())
    }

    pub fn router_with(&self, gateway: GatewayConfig) -> Router {
        let state = AppState::new(Arc::new(self.clone()), gateway);
        crate::router(Arc::new(state))
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

impl ProviderConnector for MockConnector {
    fn connect(&self, credential: Option<BearerCredential>) -> Box<dyn IdentityProvider> {
        let credential = credential.map(|c| c.as_str().to_string());
        self.record(Call::Connect {
            credential: credential.clone(),
        });
        Box::new(MockClient {
            credential,
            connector: self.clone(),
        })
    }
}

struct MockClient {
    credential: Option<String>,
    connector: MockConnector,
}

#[async_trait]
impl IdentityProvider for MockClient {
    async fn begin_oauth(
        &self,
        provider: &str,
        redirect_to: &str,
    ) -> Result<OAuthInitiation, ProviderError> {
        self.connector.record(Call::BeginOAuth {
            provider: provider.to_string(),
            redirect_to: redirect_to.to_string(),
        });
        self.connector.script.begin_oauth.resolve()
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<ProviderSession, ProviderError> {
        self.connector.record(Call::ExchangeCode {
            code: code.to_string(),
            code_verifier: code_verifier.map(str::to_string),
        });
        self.connector.script.exchange_code.resolve()
    }

    async fn current_user(&self) -> Result<Option<ProviderUser>, ProviderError> {
        self.connector.record(Call::CurrentUser);
        match self.credential.as_deref() {
            None => Err(ProviderError::rejected("Auth session missing!")),
            Some(VALID_CREDENTIAL) => self.connector.script.current_user.resolve(),
            Some(_) => Err(ProviderError::rejected_with_status(401, "invalid JWT")),
        }
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.connector.record(Call::SignOut);
        self.connector.script.sign_out.resolve()
    }

    async fn invoke_function(
        &self,
        name: &str,
        payload: &JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        self.connector.record(Call::InvokeFunction {
            name: name.to_string(),
            payload: payload.clone(),
        });
        self.connector.script.invoke_function.resolve()
    }
}

pub async fn send(router: Router, request: Request<Body>) -> Response {
    router.oneshot(request).await.expect("infallible router")
}

pub async fn json_body(response: Response) -> JsonValue {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}
