//! The identity provider seam.
//!
//! Handlers talk to the IdP exclusively through [`IdentityProvider`], so the
//! HTTP bridge can be swapped for an in-memory fake in tests. All operations
//! are pool-scoped: the caller passes the [`PoolConfig`] resolved from the
//! registry, and the implementation derives endpoints, client credentials
//! and secret hashes from it.

use async_trait::async_trait;

use crate::attributes::UserAttributes;
use crate::error::IdpResult;
use crate::pool::PoolConfig;

/// Tokens returned by the IdP for a successful authentication, refresh or
/// code exchange.
#[derive(Debug, Clone)]
pub struct IdpTokens {
    /// OIDC identity token (JWT signed by the pool issuer).
    pub id_token: String,

    /// Access token for the IdP's own user-scoped endpoints.
    pub access_token: String,

    /// Opaque refresh token. Present on initial authentication; on refresh,
    /// present only when the IdP rotated the token.
    pub refresh_token: Option<String>,

    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Pool-scoped operations against the external identity provider.
///
/// Absence is a value, not an error: lookups that may miss return
/// `Option`, and only genuine failures surface as [`crate::IdpError`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticates an email/password pair against a pool.
    ///
    /// Fails with `InvalidCredentials`, `UserNotConfirmed`, or `Upstream`.
    async fn authenticate_password(
        &self,
        pool: &PoolConfig,
        email: &str,
        password: &str,
    ) -> IdpResult<IdpTokens>;

    /// Creates an account and returns the provider-assigned subject id.
    ///
    /// Fails with `DuplicateAccount` when the email is already registered
    /// and `InvalidParameter` when the password or phone is rejected.
    async fn sign_up(
        &self,
        pool: &PoolConfig,
        email: &str,
        password: &str,
        attributes: &UserAttributes,
    ) -> IdpResult<String>;

    /// Admin-confirms an account without email verification.
    async fn force_confirm(&self, pool: &PoolConfig, username: &str) -> IdpResult<()>;

    /// Confirms an account with the emailed verification code.
    ///
    /// Fails with `InvalidGrant` on a wrong or expired code.
    async fn confirm_sign_up(&self, pool: &PoolConfig, email: &str, code: &str) -> IdpResult<()>;

    /// Fetches a user's attributes by subject id or username.
    ///
    /// Returns `None` when the pool has no such user.
    async fn fetch_attributes(
        &self,
        pool: &PoolConfig,
        subject_or_username: &str,
    ) -> IdpResult<Option<UserAttributes>>;

    /// Overwrites the given attributes on an existing user. Writes are
    /// idempotent: repeating the call with the same values succeeds.
    async fn update_attributes(
        &self,
        pool: &PoolConfig,
        username: &str,
        attributes: &[(String, String)],
    ) -> IdpResult<()>;

    /// Adds a user to a provider-side group.
    async fn add_to_group(&self, pool: &PoolConfig, username: &str, group: &str) -> IdpResult<()>;

    /// Exchanges a refresh token for fresh tokens via the pool's token
    /// endpoint.
    ///
    /// Fails with `InvalidGrant` when the token is expired or revoked,
    /// which must force re-login upstream.
    async fn refresh_session(&self, pool: &PoolConfig, refresh_token: &str)
    -> IdpResult<IdpTokens>;

    /// Revokes a refresh token. Best effort: callers log failures and
    /// never surface them.
    async fn revoke_refresh_token(&self, pool: &PoolConfig, refresh_token: &str) -> IdpResult<()>;

    /// Exchanges a social-login authorization code at the hosted
    /// authorization domain.
    ///
    /// Fails with `InvalidGrant` (bad/used code) or `InvalidClient`.
    async fn exchange_authorization_code(
        &self,
        pool: &PoolConfig,
        code: &str,
        redirect_uri: &str,
    ) -> IdpResult<IdpTokens>;

    /// Starts a password reset; the IdP emails a confirmation code.
    async fn initiate_password_reset(&self, pool: &PoolConfig, email: &str) -> IdpResult<()>;

    /// Completes a password reset with the emailed code.
    ///
    /// Fails with `InvalidGrant` on a wrong or expired code and
    /// `InvalidParameter` when the new password is rejected.
    async fn confirm_password_reset(
        &self,
        pool: &PoolConfig,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> IdpResult<()>;
}
