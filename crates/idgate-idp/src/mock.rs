//! In-memory identity provider for tests.
//!
//! Backs unit and integration suites without a network. Identity tokens are
//! plain JSON claim documents; pair with [`MockTokenVerifier`], which parses
//! them instead of checking signatures. Supports failure injection for the
//! best-effort paths (revocation) and toggleable refresh-token rotation.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::attributes::UserAttributes;
use crate::error::{IdpError, IdpResult};
use crate::jwks::{IdTokenClaims, IdentityTokenVerifier};
use crate::pool::PoolConfig;
use crate::provider::{IdentityProvider, IdpTokens};

/// A confirmation / reset code every mock flow accepts.
pub const VALID_CODE: &str = "123456";

#[derive(Debug, Clone)]
struct MockUser {
    password: Option<String>,
    confirmed: bool,
    attributes: UserAttributes,
    groups: Vec<String>,
}

#[derive(Default)]
struct State {
    /// pool id -> username -> user
    pools: HashMap<String, HashMap<String, MockUser>>,
    /// refresh token -> (pool id, username)
    refresh_tokens: HashMap<String, (String, String)>,
    /// authorization code -> identity claims
    auth_codes: HashMap<String, serde_json::Value>,
    revoked: HashSet<String>,
    counter: u64,
    fail_revoke: bool,
    revoke_attempts: usize,
    rotate_refresh: bool,
}

/// In-memory [`IdentityProvider`].
pub struct MockIdentityProvider {
    state: Mutex<State>,
}

impl MockIdentityProvider {
    /// Creates an empty provider with refresh rotation enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                rotate_refresh: true,
                ..State::default()
            }),
        }
    }

    /// Seeds a confirmed password user.
    pub fn seed_user(&self, pool_id: &str, email: &str, password: &str, subject: &str) {
        let attributes = UserAttributes::from_pairs([
            ("sub", subject),
            ("email", email),
            ("email_verified", "true"),
            ("name", email.split('@').next().unwrap_or(email)),
        ]);
        self.insert_user(pool_id, email, Some(password), true, attributes);
    }

    /// Seeds a federated user (no password), as the provider creates them on
    /// first social login. The username is the federated subject id.
    pub fn seed_federated_user(&self, pool_id: &str, subject: &str, email: &str) {
        let attributes = UserAttributes::from_pairs([
            ("sub", subject),
            ("email", email),
            ("email_verified", "true"),
        ]);
        self.insert_user(pool_id, subject, None, true, attributes);
    }

    /// Registers an authorization code exchangeable for tokens carrying the
    /// given federated identity.
    pub fn seed_authorization_code(&self, code: &str, subject: &str, email: &str) {
        let claims = json!({
            "sub": subject,
            "email": email,
            "identities": [{ "providerName": "Google" }],
        });
        self.state
            .lock()
            .unwrap()
            .auth_codes
            .insert(code.to_string(), claims);
    }

    /// Makes every revocation call fail with an upstream error.
    pub fn set_fail_revoke(&self, fail: bool) {
        self.state.lock().unwrap().fail_revoke = fail;
    }

    /// Controls whether refresh issues a rotated refresh token.
    pub fn set_rotate_refresh(&self, rotate: bool) {
        self.state.lock().unwrap().rotate_refresh = rotate;
    }

    /// Number of revocation calls seen, including injected failures.
    #[must_use]
    pub fn revoke_attempts(&self) -> usize {
        self.state.lock().unwrap().revoke_attempts
    }

    /// Whether a refresh token has been revoked.
    #[must_use]
    pub fn is_revoked(&self, token: &str) -> bool {
        self.state.lock().unwrap().revoked.contains(token)
    }

    fn insert_user(
        &self,
        pool_id: &str,
        username: &str,
        password: Option<&str>,
        confirmed: bool,
        attributes: UserAttributes,
    ) {
        let mut state = self.state.lock().unwrap();
        state.pools.entry(pool_id.to_string()).or_default().insert(
            username.to_string(),
            MockUser {
                password: password.map(String::from),
                confirmed,
                attributes,
                groups: Vec::new(),
            },
        );
    }

    fn issue_tokens(state: &mut State, pool_id: &str, username: &str) -> IdpTokens {
        state.counter += 1;
        let n = state.counter;
        let user = &state.pools[pool_id][username];
        let id_token = serde_json::to_string(&json!({
            "sub": user.attributes.subject,
            "email": user.attributes.email,
            "name": user.attributes.name,
        }))
        .expect("claims serialize");
        let refresh_token = format!("mock-refresh-{n}");
        state.refresh_tokens.insert(
            refresh_token.clone(),
            (pool_id.to_string(), username.to_string()),
        );
        IdpTokens {
            id_token,
            access_token: format!("mock-access-{n}"),
            refresh_token: Some(refresh_token),
            expires_in: 3600,
        }
    }

    fn with_user<R>(
        &self,
        pool_id: &str,
        subject_or_username: &str,
        f: impl FnOnce(&mut MockUser) -> R,
    ) -> IdpResult<R> {
        let mut state = self.state.lock().unwrap();
        let users = state.pools.entry(pool_id.to_string()).or_default();
        let username = users
            .iter()
            .find(|(name, user)| {
                name.as_str() == subject_or_username
                    || user.attributes.subject == subject_or_username
            })
            .map(|(name, _)| name.clone());
        match username {
            Some(name) => Ok(f(users.get_mut(&name).expect("user present"))),
            None => Err(IdpError::UserNotFound),
        }
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn authenticate_password(
        &self,
        pool: &PoolConfig,
        email: &str,
        password: &str,
    ) -> IdpResult<IdpTokens> {
        let mut state = self.state.lock().unwrap();
        let user = state
            .pools
            .get(&pool.pool_id)
            .and_then(|users| users.get(email))
            .cloned()
            .ok_or(IdpError::UserNotFound)?;
        if !user.confirmed {
            return Err(IdpError::UserNotConfirmed);
        }
        if user.password.as_deref() != Some(password) {
            return Err(IdpError::InvalidCredentials);
        }
        Ok(Self::issue_tokens(&mut state, &pool.pool_id, email))
    }

    async fn sign_up(
        &self,
        pool: &PoolConfig,
        email: &str,
        password: &str,
        attributes: &UserAttributes,
    ) -> IdpResult<String> {
        let mut state = self.state.lock().unwrap();
        let users = state.pools.entry(pool.pool_id.clone()).or_default();
        if users.contains_key(email) {
            return Err(IdpError::duplicate_account("email already registered"));
        }
        state.counter += 1;
        let subject = format!("sub-{}", state.counter);
        let mut attributes = attributes.clone();
        attributes.subject = subject.clone();
        let users = state.pools.entry(pool.pool_id.clone()).or_default();
        users.insert(
            email.to_string(),
            MockUser {
                password: Some(password.to_string()),
                confirmed: false,
                attributes,
                groups: Vec::new(),
            },
        );
        Ok(subject)
    }

    async fn force_confirm(&self, pool: &PoolConfig, username: &str) -> IdpResult<()> {
        self.with_user(&pool.pool_id, username, |user| user.confirmed = true)
    }

    async fn confirm_sign_up(&self, pool: &PoolConfig, email: &str, code: &str) -> IdpResult<()> {
        if code != VALID_CODE {
            return Err(IdpError::invalid_grant("wrong confirmation code"));
        }
        self.with_user(&pool.pool_id, email, |user| user.confirmed = true)
    }

    async fn fetch_attributes(
        &self,
        pool: &PoolConfig,
        subject_or_username: &str,
    ) -> IdpResult<Option<UserAttributes>> {
        match self.with_user(&pool.pool_id, subject_or_username, |user| {
            user.attributes.clone()
        }) {
            Ok(attributes) => Ok(Some(attributes)),
            Err(IdpError::UserNotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn update_attributes(
        &self,
        pool: &PoolConfig,
        username: &str,
        attributes: &[(String, String)],
    ) -> IdpResult<()> {
        self.with_user(&pool.pool_id, username, |user| {
            let mut pairs = user.attributes.to_pairs();
            for (name, value) in attributes {
                pairs.retain(|(existing, _)| existing != name);
                pairs.push((name.clone(), value.clone()));
            }
            user.attributes = UserAttributes::from_pairs(pairs);
        })
    }

    async fn add_to_group(&self, pool: &PoolConfig, username: &str, group: &str) -> IdpResult<()> {
        self.with_user(&pool.pool_id, username, |user| {
            if !user.groups.iter().any(|g| g == group) {
                user.groups.push(group.to_string());
            }
        })
    }

    async fn refresh_session(
        &self,
        pool: &PoolConfig,
        refresh_token: &str,
    ) -> IdpResult<IdpTokens> {
        let mut state = self.state.lock().unwrap();
        if state.revoked.contains(refresh_token) {
            return Err(IdpError::invalid_grant("refresh token revoked"));
        }
        let Some((pool_id, username)) = state.refresh_tokens.get(refresh_token).cloned() else {
            return Err(IdpError::invalid_grant("unknown refresh token"));
        };
        if pool_id != pool.pool_id {
            return Err(IdpError::invalid_grant("refresh token from another pool"));
        }
        let rotate = state.rotate_refresh;
        let mut tokens = Self::issue_tokens(&mut state, &pool_id, &username);
        if !rotate {
            tokens.refresh_token = None;
        }
        Ok(tokens)
    }

    async fn revoke_refresh_token(&self, _pool: &PoolConfig, refresh_token: &str) -> IdpResult<()> {
        let mut state = self.state.lock().unwrap();
        state.revoke_attempts += 1;
        if state.fail_revoke {
            return Err(IdpError::upstream("revocation endpoint unavailable"));
        }
        state.revoked.insert(refresh_token.to_string());
        Ok(())
    }

    async fn exchange_authorization_code(
        &self,
        _pool: &PoolConfig,
        code: &str,
        _redirect_uri: &str,
    ) -> IdpResult<IdpTokens> {
        let mut state = self.state.lock().unwrap();
        let Some(claims) = state.auth_codes.remove(code) else {
            return Err(IdpError::invalid_grant("unknown or used authorization code"));
        };
        state.counter += 1;
        let n = state.counter;
        Ok(IdpTokens {
            id_token: serde_json::to_string(&claims).expect("claims serialize"),
            access_token: format!("mock-access-{n}"),
            refresh_token: Some(format!("mock-refresh-{n}")),
            expires_in: 3600,
        })
    }

    async fn initiate_password_reset(&self, pool: &PoolConfig, email: &str) -> IdpResult<()> {
        self.with_user(&pool.pool_id, email, |_| ())
    }

    async fn confirm_password_reset(
        &self,
        pool: &PoolConfig,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> IdpResult<()> {
        if code != VALID_CODE {
            return Err(IdpError::invalid_grant("wrong reset code"));
        }
        self.with_user(&pool.pool_id, email, |user| {
            user.password = Some(new_password.to_string());
        })
    }
}

/// Token verifier that parses mock identity tokens (plain JSON claims).
pub struct MockTokenVerifier;

#[async_trait]
impl IdentityTokenVerifier for MockTokenVerifier {
    async fn verify(&self, _pool: &PoolConfig, token: &str) -> IdpResult<IdTokenClaims> {
        serde_json::from_str(token)
            .map_err(|e| IdpError::invalid_grant(format!("identity token rejected: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(pool_id: &str) -> PoolConfig {
        PoolConfig {
            pool_id: pool_id.into(),
            issuer: format!("https://idp.example.com/{pool_id}"),
            client_id: "client".into(),
            client_secret: None,
            confidential: false,
            group: None,
        }
    }

    #[tokio::test]
    async fn password_flow_round_trip() {
        let provider = MockIdentityProvider::new();
        provider.seed_user("p", "a@b.c", "hunter2", "sub-1");

        let tokens = provider
            .authenticate_password(&pool("p"), "a@b.c", "hunter2")
            .await
            .unwrap();
        assert!(tokens.refresh_token.is_some());

        let err = provider
            .authenticate_password(&pool("p"), "a@b.c", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, IdpError::InvalidCredentials));
    }

    #[tokio::test]
    async fn revoked_refresh_token_is_an_invalid_grant() {
        let provider = MockIdentityProvider::new();
        provider.seed_user("p", "a@b.c", "pw", "sub-1");
        let tokens = provider
            .authenticate_password(&pool("p"), "a@b.c", "pw")
            .await
            .unwrap();
        let refresh = tokens.refresh_token.unwrap();

        provider
            .revoke_refresh_token(&pool("p"), &refresh)
            .await
            .unwrap();
        let err = provider
            .refresh_session(&pool("p"), &refresh)
            .await
            .unwrap_err();
        assert!(err.forces_relogin());
    }

    #[tokio::test]
    async fn attribute_updates_are_idempotent() {
        let provider = MockIdentityProvider::new();
        provider.seed_federated_user("p", "sub-5", "f@b.c");
        let update = vec![("phone_number".to_string(), "+15550100".to_string())];

        provider
            .update_attributes(&pool("p"), "sub-5", &update)
            .await
            .unwrap();
        provider
            .update_attributes(&pool("p"), "sub-5", &update)
            .await
            .unwrap();

        let attrs = provider
            .fetch_attributes(&pool("p"), "sub-5")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(attrs.phone.as_deref(), Some("+15550100"));
    }
}
