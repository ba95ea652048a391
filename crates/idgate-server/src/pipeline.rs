//! The session-establishment pipeline.
//!
//! Every endpoint that ends in a live session — password signup and signin,
//! seller registration, social login, social completion, refresh — runs the
//! same sequence: enrich the verified attributes into a principal, mint a
//! session token, and build the three cookies. What differs between flows
//! (pool, social provider tag, which refresh token to persist) is passed in
//! as parameters, not encoded in duplicated variants.

use cookie::Cookie;

use idgate_idp::{PoolKind, UserAttributes};
use idgate_session::{Principal, encode_refresh};
use idgate_store::EnrichmentContext;

use crate::error::ApiError;
use crate::state::AppState;

/// A fully established session, ready to attach to a response.
pub struct EstablishedSession {
    /// The enriched principal.
    pub principal: Principal,
    /// The minted session token.
    pub token: String,
    /// Session, mirror and refresh cookies.
    pub cookies: [Cookie<'static>; 3],
}

/// Runs the enrichment → mint → cookie pipeline.
///
/// `refresh_token` is whatever refresh credential this session should
/// persist; for refresh flows that is the rotated token when the IdP
/// returned one, otherwise the token the client presented.
///
/// # Errors
///
/// Propagates enrichment and minting failures; no cookies are produced in
/// that case (no partial session ever leaves this function).
pub async fn establish_session(
    state: &AppState,
    pool: PoolKind,
    attributes: &UserAttributes,
    provider_tag: Option<String>,
    refresh_token: &str,
) -> Result<EstablishedSession, ApiError> {
    let context = EnrichmentContext {
        pool: pool.as_str().to_string(),
        provider: provider_tag,
    };
    let principal = state.enricher.enrich(attributes, &context).await?;
    let token = state
        .minter
        .mint(&principal, state.cookies.session_ttl())?;
    let cookies = state
        .cookies
        .issue(&token, &encode_refresh(pool.as_str(), refresh_token));

    tracing::info!(
        subject = %principal.subject,
        pool = %pool,
        "session established"
    );

    Ok(EstablishedSession {
        principal,
        token,
        cookies,
    })
}
