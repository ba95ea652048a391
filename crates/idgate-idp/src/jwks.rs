//! Identity-token verification against a pool's published keys.
//!
//! Each pool issuer publishes its signing keys at
//! `{issuer}/.well-known/jwks.json`. Keys are cached by `(issuer, kid)` and
//! refetched once when a token references an unknown kid, which covers
//! provider-side key rotation without a background refresher.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;

use crate::error::{IdpError, IdpResult};
use crate::pool::PoolConfig;

/// Claims extracted from a verified identity token.
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    /// Federated subject id.
    pub sub: String,

    /// Email asserted by the upstream provider.
    #[serde(default)]
    pub email: Option<String>,

    /// Full name, if the upstream provider supplied one.
    #[serde(default)]
    pub name: Option<String>,

    /// Given name.
    #[serde(default)]
    pub given_name: Option<String>,

    /// Family name.
    #[serde(default)]
    pub family_name: Option<String>,

    /// Linked federated identities (present for social logins).
    #[serde(default)]
    pub identities: Vec<FederatedIdentity>,
}

/// One federated identity link inside an identity token.
#[derive(Debug, Clone, Deserialize)]
pub struct FederatedIdentity {
    /// Upstream provider name (e.g. `"Google"`).
    #[serde(rename = "providerName", default)]
    pub provider_name: Option<String>,
}

impl IdTokenClaims {
    /// The social provider tag, when the token stems from a federated login.
    #[must_use]
    pub fn provider_tag(&self) -> Option<&str> {
        self.identities
            .iter()
            .find_map(|identity| identity.provider_name.as_deref())
    }
}

/// Verification seam for identity tokens.
///
/// The production implementation checks signatures against the issuer's
/// published keys; tests substitute an offline implementation.
#[async_trait]
pub trait IdentityTokenVerifier: Send + Sync {
    /// Verifies `token` as issued by `pool` and returns its claims.
    async fn verify(&self, pool: &PoolConfig, token: &str) -> IdpResult<IdTokenClaims>;
}

/// JWKS-backed verifier with a process-wide key cache.
pub struct JwksTokenVerifier {
    http: reqwest::Client,
    keys: RwLock<HashMap<(String, String), Jwk>>,
}

impl JwksTokenVerifier {
    /// Creates an empty verifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Verifies `token` against `pool`'s published keys, checking the
    /// signature, expiry, audience (pool client id) and issuer.
    ///
    /// # Errors
    ///
    /// Returns [`IdpError::InvalidGrant`] for any verification failure and
    /// [`IdpError::Upstream`] when the key set cannot be fetched.
    async fn verify_against_jwks(&self, pool: &PoolConfig, token: &str) -> IdpResult<IdTokenClaims> {
        let header = decode_header(token)
            .map_err(|e| IdpError::invalid_grant(format!("unreadable identity token: {e}")))?;
        let kid = header
            .kid
            .ok_or_else(|| IdpError::invalid_grant("identity token has no key id"))?;

        let jwk = match self.cached_key(&pool.issuer, &kid) {
            Some(jwk) => jwk,
            None => {
                self.refresh_keys(pool).await?;
                self.cached_key(&pool.issuer, &kid).ok_or_else(|| {
                    IdpError::invalid_grant("identity token signed by an unknown key")
                })?
            }
        };

        let decoding_key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| IdpError::upstream(format!("unusable published key: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[pool.client_id.as_str()]);
        validation.set_issuer(&[pool.issuer.as_str()]);

        decode::<IdTokenClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| IdpError::invalid_grant(format!("identity token rejected: {e}")))
    }

    fn cached_key(&self, issuer: &str, kid: &str) -> Option<Jwk> {
        self.keys
            .read()
            .ok()?
            .get(&(issuer.to_string(), kid.to_string()))
            .cloned()
    }

    async fn refresh_keys(&self, pool: &PoolConfig) -> IdpResult<()> {
        let url = pool.jwks_url();
        tracing::debug!(%url, "fetching published key set");
        let set: JwkSet = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| IdpError::upstream(format!("key set fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| IdpError::upstream(format!("malformed key set: {e}")))?;

        if let Ok(mut keys) = self.keys.write() {
            for jwk in set.keys {
                if let Some(kid) = jwk.common.key_id.clone() {
                    keys.insert((pool.issuer.clone(), kid), jwk);
                }
            }
        }
        Ok(())
    }
}

impl Default for JwksTokenVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityTokenVerifier for JwksTokenVerifier {
    async fn verify(&self, pool: &PoolConfig, token: &str) -> IdpResult<IdTokenClaims> {
        self.verify_against_jwks(pool, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_tag_comes_from_first_linked_identity() {
        let claims: IdTokenClaims = serde_json::from_value(serde_json::json!({
            "sub": "u-1",
            "email": "a@b.c",
            "identities": [{ "providerName": "Google" }],
        }))
        .unwrap();
        assert_eq!(claims.provider_tag(), Some("Google"));
    }

    #[test]
    fn provider_tag_absent_for_native_accounts() {
        let claims: IdTokenClaims =
            serde_json::from_value(serde_json::json!({ "sub": "u-2" })).unwrap();
        assert_eq!(claims.provider_tag(), None);
    }
}
