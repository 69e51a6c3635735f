//! Identity provider abstraction for taskgate.
//!
//! This crate provides:
//! - Provider configuration (`ProviderConfig`)
//! - Provider data shapes (`ProviderUser`, `UserIdentity`, `ProviderSession`)
//! - The provider error taxonomy (`ProviderError`)
//! - The `IdentityProvider` trait and the `ProviderConnector` factory that
//!   builds one request-scoped provider client per inbound request
//!
//! # Credential Model
//!
//! The gateway never validates a bearer credential itself. A connector is
//! asked for a fresh client carrying the caller's credential (or none), and
//! the provider's answer is the only source of truth about identity. No
//! client outlives the request that created it, so a credential can never
//! be observed by another request.
//!
//! # Example
//!
//! ```
//! use taskgate_identity::{ProviderConfig, ProviderUser, UserIdentity};
//!
//! let config = ProviderConfig::new(
//!     "https://project.supabase.co".to_string(),
//!     "public-anon-key".to_string(),
//! );
//! assert_eq!(
//!     config.auth_endpoint("user"),
//!     "https://project.supabase.co/auth/v1/user"
//! );
//!
//! let user: ProviderUser = serde_json::from_str(
//!     r#"{"id":"u-1","email":"alice@example.com","role":"authenticated"}"#,
//! )
//! .unwrap();
//! let identity = UserIdentity::from(&user);
//! assert_eq!(identity.id, "u-1");
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod session;
pub mod user;

// Re-export main types at crate root
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use provider::{IdentityProvider, ProviderConnector};
pub use session::{OAuthInitiation, ProviderSession};
pub use user::{ProviderUser, UserIdentity};
