//! The authenticated principal.

use serde::{Deserialize, Serialize};

/// A verified identity plus its authorization context.
///
/// Rebuilt per request; never persisted. The session token carries only the
/// projection in [`crate::minter::SessionClaims`] — in particular, permission
/// keys and the organization name come from enrichment, not from the token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable subject id from the identity provider.
    pub subject: String,

    /// Primary email address.
    pub email: String,

    /// Display name.
    pub name: String,

    /// Organization the principal belongs to, if any.
    pub organization_id: Option<String>,

    /// Display name of that organization, when enrichment found one.
    pub organization_name: Option<String>,

    /// Role tag ("individual", "owner", ...).
    pub role: String,

    /// Account type tag ("personal", "team", ...).
    pub account_type: Option<String>,

    /// Permission keys in `resource_type:resource_id:permission` form.
    pub permissions: Vec<String>,

    /// IANA timezone name.
    pub timezone: String,

    /// Phone number in E.164 form.
    pub phone: Option<String>,

    /// Social provider tag, when the session stems from a federated login.
    pub provider: Option<String>,

    /// Identity pool the principal was authenticated against.
    pub pool: String,
}
