//! Cookie carriers for session and refresh credentials.
//!
//! Three cookies travel together and are always set or cleared as a unit:
//!
//! - `session` — the signed session token. HttpOnly, path `/`.
//! - `session-mirror` — the same token, script-readable so the frontend can
//!   inspect claims without an extra round trip.
//! - `refresh-token` — the IdP's opaque refresh token, HttpOnly and
//!   path-restricted so browsers only present it to the refresh and signout
//!   endpoints' path.
//!
//! Attribute choices differ by deployment: production serves the API and the
//! frontend from different origins, so cookies are `SameSite=None; Secure`
//! on a shared parent domain; local development is same-origin and uses
//! `SameSite=Lax` without `Secure`.

use cookie::{Cookie, SameSite};
use time::Duration;

/// Primary session cookie (HttpOnly).
pub const SESSION_COOKIE: &str = "session";

/// Script-readable duplicate of the session token.
pub const MIRROR_COOKIE: &str = "session-mirror";

/// Refresh credential cookie, restricted to [`REFRESH_PATH`].
pub const REFRESH_COOKIE: &str = "refresh-token";

/// Path the refresh cookie is restricted to: browsers present it to the
/// refresh endpoint only. Signout revokes whatever refresh credential the
/// client chooses to present.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Deployment topology the cookie attributes depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieEnvironment {
    /// Same-origin local development: `SameSite=Lax`, no `Secure`, host-only.
    Development,
    /// Cross-site production: `SameSite=None; Secure` on the parent domain.
    Production,
}

/// Builds the gateway's cookie set with deployment-appropriate attributes.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    environment: CookieEnvironment,
    domain: Option<String>,
    session_ttl: Duration,
    refresh_ttl: Duration,
}

impl CookiePolicy {
    /// Creates a policy.
    ///
    /// `domain` is the shared parent domain for production deployments; it
    /// is ignored in development so cookies stay host-only.
    #[must_use]
    pub fn new(
        environment: CookieEnvironment,
        domain: Option<String>,
        session_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            environment,
            domain,
            session_ttl,
            refresh_ttl,
        }
    }

    /// The configured session token lifetime.
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Builds all three cookies for a freshly minted session.
    ///
    /// `refresh_value` must already be pool-tagged via [`encode_refresh`].
    #[must_use]
    pub fn issue(&self, session_token: &str, refresh_value: &str) -> [Cookie<'static>; 3] {
        [
            self.build(
                SESSION_COOKIE,
                session_token.to_string(),
                "/",
                true,
                self.session_ttl,
            ),
            self.build(
                MIRROR_COOKIE,
                session_token.to_string(),
                "/",
                false,
                self.session_ttl,
            ),
            self.build(
                REFRESH_COOKIE,
                refresh_value.to_string(),
                REFRESH_PATH,
                true,
                self.refresh_ttl,
            ),
        ]
    }

    /// Builds removal cookies for all three carriers.
    ///
    /// Attributes (path, domain) match the issuing cookies so browsers
    /// actually drop them. There is deliberately no way to clear a subset.
    #[must_use]
    pub fn clear(&self) -> [Cookie<'static>; 3] {
        let mut session = self.build(SESSION_COOKIE, String::new(), "/", true, Duration::ZERO);
        let mut mirror = self.build(MIRROR_COOKIE, String::new(), "/", false, Duration::ZERO);
        let mut refresh = self.build(
            REFRESH_COOKIE,
            String::new(),
            REFRESH_PATH,
            true,
            Duration::ZERO,
        );
        session.make_removal();
        mirror.make_removal();
        refresh.make_removal();
        [session, mirror, refresh]
    }

    fn build(
        &self,
        name: &'static str,
        value: String,
        path: &'static str,
        http_only: bool,
        max_age: Duration,
    ) -> Cookie<'static> {
        let mut builder = Cookie::build((name, value))
            .path(path)
            .http_only(http_only)
            .max_age(max_age);
        builder = match self.environment {
            CookieEnvironment::Production => builder.same_site(SameSite::None).secure(true),
            CookieEnvironment::Development => builder.same_site(SameSite::Lax).secure(false),
        };
        if self.environment == CookieEnvironment::Production {
            if let Some(domain) = &self.domain {
                builder = builder.domain(domain.clone());
            }
        }
        builder.build()
    }
}

/// Encodes a refresh cookie value as `{pool}:{token}`.
///
/// The pool tag lets the refresh and signout paths re-enter the owning pool
/// without consulting any session state.
#[must_use]
pub fn encode_refresh(pool_tag: &str, token: &str) -> String {
    format!("{pool_tag}:{token}")
}

/// Splits a refresh cookie value into its pool tag and token.
///
/// Untagged values (from sessions issued before tagging) come back with no
/// tag; the caller chooses the default pool.
#[must_use]
pub fn decode_refresh(value: &str) -> (Option<&str>, &str) {
    match value.split_once(':') {
        Some((tag, token)) if !tag.is_empty() && !token.is_empty() => (Some(tag), token),
        _ => (None, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(environment: CookieEnvironment) -> CookiePolicy {
        CookiePolicy::new(
            environment,
            Some("example.com".into()),
            Duration::hours(1),
            Duration::days(30),
        )
    }

    #[test]
    fn production_cookies_are_cross_site() {
        let cookies = policy(CookieEnvironment::Production).issue("tok", "customer:rt");
        for cookie in &cookies {
            assert_eq!(cookie.same_site(), Some(SameSite::None));
            assert_eq!(cookie.secure(), Some(true));
            assert_eq!(cookie.domain(), Some("example.com"));
        }
    }

    #[test]
    fn development_cookies_are_lax_and_host_only() {
        let cookies = policy(CookieEnvironment::Development).issue("tok", "customer:rt");
        for cookie in &cookies {
            assert_eq!(cookie.same_site(), Some(SameSite::Lax));
            assert_eq!(cookie.secure(), Some(false));
            assert_eq!(cookie.domain(), None);
        }
    }

    #[test]
    fn mirror_is_script_readable_and_session_is_not() {
        let [session, mirror, refresh] =
            policy(CookieEnvironment::Production).issue("tok", "customer:rt");
        assert_eq!(session.http_only(), Some(true));
        assert_eq!(mirror.http_only(), Some(false));
        assert_eq!(refresh.http_only(), Some(true));
        assert_eq!(session.value(), mirror.value());
    }

    #[test]
    fn refresh_cookie_is_path_restricted() {
        let [_, _, refresh] = policy(CookieEnvironment::Production).issue("tok", "customer:rt");
        assert_eq!(refresh.path(), Some(REFRESH_PATH));
        assert_eq!(refresh.max_age(), Some(Duration::days(30)));
    }

    #[test]
    fn clear_removes_all_three_with_matching_attributes() {
        let cleared = policy(CookieEnvironment::Production).clear();
        assert_eq!(cleared.len(), 3);
        for cookie in &cleared {
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));
            assert!(cookie.value().is_empty());
        }
        assert_eq!(cleared[2].path(), Some(REFRESH_PATH));
    }

    #[test]
    fn refresh_value_round_trip_and_legacy_form() {
        let value = encode_refresh("seller", "opaque.token.value");
        assert_eq!(decode_refresh(&value), (Some("seller"), "opaque.token.value"));
        assert_eq!(decode_refresh("bare-token"), (None, "bare-token"));
    }
}
