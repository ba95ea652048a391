//! Multi-pool account resolution for federated logins.
//!
//! A federated identity arrives with only a subject id; which account-type
//! pool it belongs to is unknown. The resolver probes every configured pool
//! with a presence-returning lookup and reduces the matches to one of three
//! outcomes. When more than one pool matches, the registry's priority order
//! (Customer before Seller) decides.

use crate::attributes::UserAttributes;
use crate::error::IdpResult;
use crate::pool::{PoolKind, PoolRegistry};
use crate::provider::IdentityProvider;

/// Result of probing the configured pools for a federated subject.
#[derive(Debug, Clone)]
pub enum ResolveOutcome {
    /// No pool knows the subject; the caller should offer a signup choice.
    NoAccount,

    /// Exactly one pool matched.
    SingleMatch {
        /// The matching pool.
        kind: PoolKind,
        /// The account's attributes in that pool.
        attributes: UserAttributes,
    },

    /// More than one pool matched; resolved to the highest-priority one.
    AmbiguousMatch {
        /// The pool chosen by priority order.
        kind: PoolKind,
        /// The account's attributes in the chosen pool.
        attributes: UserAttributes,
        /// Every pool that matched, in priority order.
        matched: Vec<PoolKind>,
    },
}

/// Probes every configured pool for `subject`, in priority order.
///
/// Absence in a pool is a normal branch; only genuine provider failures
/// propagate, aborting resolution.
///
/// # Errors
///
/// Returns the first upstream error encountered while probing.
pub async fn resolve(
    registry: &PoolRegistry,
    provider: &dyn IdentityProvider,
    subject: &str,
) -> IdpResult<ResolveOutcome> {
    let mut matches = Vec::new();
    for (kind, pool) in registry.iter() {
        if let Some(attributes) = provider.fetch_attributes(pool, subject).await? {
            matches.push((kind, attributes));
        }
    }

    let matched: Vec<PoolKind> = matches.iter().map(|(kind, _)| *kind).collect();
    let mut matches = matches.into_iter();
    Ok(match (matches.next(), matched.len()) {
        (None, _) => ResolveOutcome::NoAccount,
        (Some((kind, attributes)), 1) => ResolveOutcome::SingleMatch { kind, attributes },
        (Some((kind, attributes)), _) => {
            tracing::warn!(
                subject,
                chosen = %kind,
                ?matched,
                "federated identity matches multiple pools; using priority order"
            );
            ResolveOutcome::AmbiguousMatch {
                kind,
                attributes,
                matched,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockIdentityProvider;
    use crate::pool::PoolConfig;

    fn pool(pool_id: &str) -> PoolConfig {
        PoolConfig {
            pool_id: pool_id.into(),
            issuer: format!("https://idp.example.com/{pool_id}"),
            client_id: format!("client-{pool_id}"),
            client_secret: None,
            confidential: false,
            group: None,
        }
    }

    fn registry() -> PoolRegistry {
        PoolRegistry::new(vec![
            (PoolKind::Customer, pool("pool-customer")),
            (PoolKind::Seller, pool("pool-seller")),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn unknown_subject_resolves_to_no_account() {
        let provider = MockIdentityProvider::new();
        let outcome = resolve(&registry(), &provider, "sub-ghost").await.unwrap();
        assert!(matches!(outcome, ResolveOutcome::NoAccount));
    }

    #[tokio::test]
    async fn single_pool_match_is_direct() {
        let provider = MockIdentityProvider::new();
        provider.seed_user("pool-seller", "s@example.com", "pw", "sub-7");
        let outcome = resolve(&registry(), &provider, "sub-7").await.unwrap();
        match outcome {
            ResolveOutcome::SingleMatch { kind, attributes } => {
                assert_eq!(kind, PoolKind::Seller);
                assert_eq!(attributes.subject, "sub-7");
            }
            other => panic!("expected single match, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ambiguous_match_prefers_customer_pool() {
        let provider = MockIdentityProvider::new();
        provider.seed_user("pool-customer", "both@example.com", "pw", "sub-9");
        provider.seed_user("pool-seller", "both@example.com", "pw", "sub-9");
        let outcome = resolve(&registry(), &provider, "sub-9").await.unwrap();
        match outcome {
            ResolveOutcome::AmbiguousMatch { kind, matched, .. } => {
                assert_eq!(kind, PoolKind::Customer);
                assert_eq!(matched, vec![PoolKind::Customer, PoolKind::Seller]);
            }
            other => panic!("expected ambiguous match, got {other:?}"),
        }
    }
}
