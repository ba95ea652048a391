//! Identity pool registry.
//!
//! The provider partitions accounts into pools, one per account type. Every
//! pool the gateway talks to is described once at startup and looked up by
//! [`PoolKind`] per request; nothing constructs clients or reads pool
//! settings ad hoc inside a handler.
//!
//! Resolution priority: when a federated identity matches more than one
//! pool, the **Customer** pool wins over the **Seller** pool. The registry's
//! iteration order encodes this and is the single source of truth for it.

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{IdpError, IdpResult};

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Pool Kind
// =============================================================================

/// The identity partitions the gateway knows about, in resolution priority
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    /// End-customer accounts.
    Customer,
    /// Seller / merchant accounts.
    Seller,
}

impl PoolKind {
    /// All kinds, highest resolution priority first.
    pub const PRIORITY: [PoolKind; 2] = [PoolKind::Customer, PoolKind::Seller];

    /// Stable lowercase tag, used in cookies and principal pool tags.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Seller => "seller",
        }
    }

    /// Parses a lowercase tag back into a kind.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "customer" => Some(Self::Customer),
            "seller" => Some(Self::Seller),
            _ => None,
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Pool Configuration
// =============================================================================

/// Settings for one identity pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Pool identifier at the provider (e.g. `"us-east-1_AbCdEfG"`).
    pub pool_id: String,

    /// Issuer URL for tokens signed by this pool. Also the base for the
    /// pool's published JWKS and OAuth2 token endpoint.
    pub issuer: String,

    /// App client id registered with the pool.
    pub client_id: String,

    /// App client secret. Required when `confidential` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Whether the app client is a confidential client. Confidential
    /// clients must attach a per-request secret hash and must have a
    /// `client_secret` configured.
    #[serde(default)]
    pub confidential: bool,

    /// Provider-side group that members of this pool's account type join.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl PoolConfig {
    /// URL of the pool's published signing keys.
    #[must_use]
    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.issuer.trim_end_matches('/'))
    }

    /// URL of the pool's OAuth2 token endpoint (refresh grant).
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/oauth2/token", self.issuer.trim_end_matches('/'))
    }

    /// Computes the confidential-client secret hash for `username`:
    /// `Base64(HMAC-SHA256(client_secret, username || client_id))`.
    ///
    /// Returns `None` for public clients.
    #[must_use]
    pub fn secret_hash(&self, username: &str) -> Option<String> {
        let secret = self.client_secret.as_deref()?;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(username.as_bytes());
        mac.update(self.client_id.as_bytes());
        Some(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

// =============================================================================
// Pool Registry
// =============================================================================

/// All configured pools, built once at startup.
///
/// Iteration order is [`PoolKind::PRIORITY`] order; the multi-pool resolver
/// relies on this when disambiguating a federated identity.
#[derive(Debug, Clone)]
pub struct PoolRegistry {
    pools: Vec<(PoolKind, PoolConfig)>,
}

impl PoolRegistry {
    /// Builds and validates the registry.
    ///
    /// # Errors
    ///
    /// Returns [`IdpError::Configuration`] when a pool marked confidential
    /// has no client secret, or when no pools are configured at all. Both
    /// are startup-fatal; per-request code never sees them.
    pub fn new(pools: Vec<(PoolKind, PoolConfig)>) -> IdpResult<Self> {
        if pools.is_empty() {
            return Err(IdpError::configuration("no identity pools configured"));
        }
        for (kind, pool) in &pools {
            if pool.confidential && pool.client_secret.is_none() {
                return Err(IdpError::configuration(format!(
                    "pool '{kind}' is a confidential client but has no client secret"
                )));
            }
        }
        let mut ordered = Vec::with_capacity(pools.len());
        for kind in PoolKind::PRIORITY {
            if let Some(entry) = pools.iter().find(|(k, _)| *k == kind) {
                ordered.push(entry.clone());
            }
        }
        Ok(Self { pools: ordered })
    }

    /// Looks up a pool by kind.
    #[must_use]
    pub fn get(&self, kind: PoolKind) -> Option<&PoolConfig> {
        self.pools
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, pool)| pool)
    }

    /// Looks up a pool by kind, failing with a configuration error when the
    /// pool is not part of the deployment.
    ///
    /// # Errors
    ///
    /// Returns [`IdpError::Configuration`] when the kind is unconfigured.
    pub fn require(&self, kind: PoolKind) -> IdpResult<&PoolConfig> {
        self.get(kind)
            .ok_or_else(|| IdpError::configuration(format!("pool '{kind}' is not configured")))
    }

    /// Pools in resolution priority order.
    pub fn iter(&self) -> impl Iterator<Item = (PoolKind, &PoolConfig)> {
        self.pools.iter().map(|(kind, pool)| (*kind, pool))
    }
}
