//! Identity provider bridge for IdGate.
//!
//! Wraps the external identity provider's directory and token operations
//! behind one trait seam, models user attributes as a typed bag, keeps all
//! pool settings in a startup-built registry, and resolves which identity
//! pool a federated login belongs to.
//!
//! # Structure
//!
//! - [`provider`] - the [`IdentityProvider`] trait every handler codes against
//! - [`http`] - production bridge speaking the directory JSON action protocol
//!   and the OAuth2 token endpoints
//! - [`pool`] - pool registry, priority order, confidential-client hashing
//! - [`attributes`] - typed attribute bag with raw passthrough
//! - [`jwks`] - identity-token verification against published keys
//! - [`resolver`] - multi-pool account resolution for social logins
//! - [`mock`] - in-memory provider for tests

pub mod attributes;
pub mod error;
pub mod http;
pub mod jwks;
pub mod mock;
pub mod pool;
pub mod provider;
pub mod resolver;
pub mod sigv4;

pub use attributes::{UserAttributes, format_phone_e164};
pub use error::{IdpError, IdpResult};
pub use http::HttpIdentityProvider;
pub use jwks::{IdTokenClaims, IdentityTokenVerifier, JwksTokenVerifier};
pub use pool::{PoolConfig, PoolKind, PoolRegistry};
pub use provider::{IdentityProvider, IdpTokens};
pub use resolver::{ResolveOutcome, resolve};
pub use sigv4::SigningCredentials;
