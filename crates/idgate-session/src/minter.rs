//! Session token minting and verification.
//!
//! The gateway issues its own short-lived HS256 token once the identity
//! provider has verified a principal. One process-wide secret signs every
//! token; there is no server-side revocation list — tokens are short-lived
//! and trust is re-established at each refresh.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::error::SessionError;
use crate::principal::Principal;

/// The fixed claim set carried by a session token.
///
/// Deliberately a projection of [`Principal`]: permission keys and the
/// organization name are re-derived per session, and the IdP's refresh
/// token is never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject id.
    pub sub: String,

    /// Email address.
    pub email: String,

    /// Display name.
    pub name: String,

    /// Organization id, when the principal has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,

    /// Role tag.
    pub role: String,

    /// Issued-at, seconds since the epoch.
    pub iat: i64,

    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Signs and verifies the gateway's own session tokens.
pub struct SessionMinter {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionMinter {
    /// Creates a minter from the process-wide signing secret.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Configuration`] when the secret is empty;
    /// the process must refuse to start in that case.
    pub fn new(secret: &str) -> Result<Self, SessionError> {
        if secret.trim().is_empty() {
            return Err(SessionError::configuration(
                "session signing secret is not set",
            ));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Mints a token for `principal` that expires after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Encoding`] when signing fails.
    pub fn mint(&self, principal: &Principal, ttl: Duration) -> Result<String, SessionError> {
        let now = OffsetDateTime::now_utc();
        let claims = SessionClaims {
            sub: principal.subject.clone(),
            email: principal.email.clone(),
            name: principal.name.clone(),
            org: principal.organization_id.clone(),
            role: principal.role.clone(),
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| SessionError::encoding(e.to_string()))
    }

    /// Verifies a token and returns its claims.
    ///
    /// Never panics or errors on malformed input: any signature, structure
    /// or expiry problem yields `None`.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        match decode::<SessionClaims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "session token rejected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minter() -> SessionMinter {
        SessionMinter::new("unit-test-secret").unwrap()
    }

    fn principal() -> Principal {
        Principal {
            subject: "sub-1".into(),
            email: "ada@example.com".into(),
            name: "Ada Lovelace".into(),
            organization_id: Some("org-9".into()),
            role: "owner".into(),
            timezone: "UTC".into(),
            pool: "customer".into(),
            ..Principal::default()
        }
    }

    #[test]
    fn mint_verify_round_trip() {
        let m = minter();
        let token = m.mint(&principal(), Duration::hours(1)).unwrap();
        let claims = m.verify(&token).expect("fresh token verifies");
        assert_eq!(claims.sub, "sub-1");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.name, "Ada Lovelace");
        assert_eq!(claims.org.as_deref(), Some("org-9"));
        assert_eq!(claims.role, "owner");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let m = minter();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = SessionClaims {
            sub: "sub-1".into(),
            email: "a@b.c".into(),
            name: "A".into(),
            org: None,
            role: "individual".into(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();
        assert!(m.verify(&token).is_none());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let m = minter();
        let token = m.mint(&principal(), Duration::hours(1)).unwrap();
        let mut tampered = token.clone();
        // Flip a character in the payload segment.
        let mid = token.len() / 2;
        let replacement = if &token[mid..=mid] == "A" { "B" } else { "A" };
        tampered.replace_range(mid..=mid, replacement);
        assert!(m.verify(&tampered).is_none());
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let other = SessionMinter::new("different-secret").unwrap();
        let token = other.mint(&principal(), Duration::hours(1)).unwrap();
        assert!(minter().verify(&token).is_none());
    }

    #[test]
    fn malformed_input_yields_none() {
        let m = minter();
        assert!(m.verify("").is_none());
        assert!(m.verify("not-a-token").is_none());
        assert!(m.verify("a.b").is_none());
        assert!(m.verify("\u{1F512}.\u{1F511}.\u{1F4A5}").is_none());
    }

    #[test]
    fn empty_secret_refuses_to_start() {
        assert!(matches!(
            SessionMinter::new("  "),
            Err(SessionError::Configuration { .. })
        ));
    }
}
