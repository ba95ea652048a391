//! Shared application state.
//!
//! Everything here is initialized once at startup and cloned cheaply per
//! request. No other mutable state is shared between requests.

use std::sync::Arc;

use idgate_idp::{IdentityProvider, IdentityTokenVerifier, PoolRegistry};
use idgate_session::{CookiePolicy, SessionMinter};
use idgate_store::PrincipalEnricher;

/// Social-login settings the handlers need at request time.
#[derive(Debug, Clone)]
pub struct SocialSettings {
    /// Redirect URL the frontend used when obtaining the authorization code.
    pub redirect_url: String,
}

/// Process-wide shared state.
#[derive(Clone)]
pub struct AppState {
    /// Bridge to the identity provider.
    pub provider: Arc<dyn IdentityProvider>,

    /// Identity-token verifier (JWKS-backed in production).
    pub verifier: Arc<dyn IdentityTokenVerifier>,

    /// Pool registry, in resolution priority order.
    pub registry: Arc<PoolRegistry>,

    /// Session token minter.
    pub minter: Arc<SessionMinter>,

    /// Cookie builder for the three session carriers.
    pub cookies: Arc<CookiePolicy>,

    /// Principal enrichment over the relational store.
    pub enricher: Arc<dyn PrincipalEnricher>,

    /// Social-login settings.
    pub social: SocialSettings,
}
