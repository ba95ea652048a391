//! Principal enrichment.
//!
//! Enrichment takes a verified identity (attributes fetched from the IdP)
//! and merges in what the relational store knows: permission grants and, when
//! the identity carries an organization id, the organization's display name.
//! The two reads are independent and run concurrently; the principal is only
//! materialized once both resolve. Either failure aborts enrichment — a
//! partially populated principal is never returned.

use async_trait::async_trait;

use idgate_idp::UserAttributes;
use idgate_session::Principal;

use crate::organization::OrganizationStorage;
use crate::permission::{PermissionGrant, PermissionStorage};
use crate::{PgPool, StorageResult};

/// Per-session context that is not part of the directory attributes.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentContext {
    /// Pool tag the identity was authenticated against.
    pub pool: String,
    /// Social provider tag for federated logins.
    pub provider: Option<String>,
}

/// Seam between handlers and the relational store.
#[async_trait]
pub trait PrincipalEnricher: Send + Sync {
    /// Builds a full principal for a verified identity.
    async fn enrich(
        &self,
        attributes: &UserAttributes,
        context: &EnrichmentContext,
    ) -> StorageResult<Principal>;
}

/// Production enricher over a shared PostgreSQL pool.
pub struct PostgresEnricher {
    pool: PgPool,
}

impl PostgresEnricher {
    /// Creates an enricher over the process-wide pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalEnricher for PostgresEnricher {
    async fn enrich(
        &self,
        attributes: &UserAttributes,
        context: &EnrichmentContext,
    ) -> StorageResult<Principal> {
        let permission_storage = PermissionStorage::new(&self.pool);
        let grants = permission_storage.grants_for_subject(&attributes.subject);
        let organization_name = async {
            match attributes.organization_id.as_deref() {
                Some(id) => OrganizationStorage::new(&self.pool).find_name(id).await,
                None => Ok(None),
            }
        };
        let (grants, organization_name) = tokio::try_join!(grants, organization_name)?;
        tracing::debug!(
            subject = %attributes.subject,
            grants = grants.len(),
            "principal enriched"
        );
        Ok(materialize(attributes, &grants, organization_name, context))
    }
}

/// Merges directory attributes and store reads into a principal.
///
/// Pure so the merge rules are testable without a database.
#[must_use]
pub fn materialize(
    attributes: &UserAttributes,
    grants: &[PermissionGrant],
    organization_name: Option<String>,
    context: &EnrichmentContext,
) -> Principal {
    Principal {
        subject: attributes.subject.clone(),
        email: attributes.email.clone().unwrap_or_default(),
        name: attributes.display_name(),
        organization_id: attributes.organization_id.clone(),
        organization_name,
        role: attributes
            .role
            .clone()
            .unwrap_or_else(|| "individual".to_string()),
        account_type: attributes.account_type.clone(),
        permissions: grants.iter().map(PermissionGrant::key).collect(),
        timezone: attributes
            .timezone
            .clone()
            .unwrap_or_else(|| "UTC".to_string()),
        phone: attributes.phone.clone(),
        provider: context.provider.clone(),
        pool: context.pool.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn attributes() -> UserAttributes {
        UserAttributes::from_pairs([
            ("sub", "sub-1"),
            ("email", "ada@example.com"),
            ("given_name", "Ada"),
            ("family_name", "Lovelace"),
            ("custom:account_type", "team"),
            ("custom:organization_id", "org-9"),
            ("custom:role", "owner"),
            ("custom:timezone", "Europe/London"),
        ])
    }

    fn grant(permission: &str) -> PermissionGrant {
        PermissionGrant {
            resource_type: "project".into(),
            resource_id: "p-1".into(),
            permission: permission.into(),
            granted_at: datetime!(2026-02-01 12:00:00 UTC),
            expires_at: None,
        }
    }

    #[test]
    fn materialize_merges_all_sources() {
        let context = EnrichmentContext {
            pool: "customer".into(),
            provider: Some("Google".into()),
        };
        let principal = materialize(
            &attributes(),
            &[grant("edit"), grant("view")],
            Some("Analytical Engines Ltd".into()),
            &context,
        );
        assert_eq!(principal.subject, "sub-1");
        assert_eq!(principal.name, "Ada Lovelace");
        assert_eq!(principal.organization_id.as_deref(), Some("org-9"));
        assert_eq!(
            principal.organization_name.as_deref(),
            Some("Analytical Engines Ltd")
        );
        assert_eq!(principal.role, "owner");
        assert_eq!(
            principal.permissions,
            vec!["project:p-1:edit", "project:p-1:view"]
        );
        assert_eq!(principal.timezone, "Europe/London");
        assert_eq!(principal.provider.as_deref(), Some("Google"));
        assert_eq!(principal.pool, "customer");
    }

    #[test]
    fn materialize_defaults_for_sparse_identities() {
        let sparse = UserAttributes::from_pairs([("sub", "sub-2"), ("email", "g@example.com")]);
        let principal = materialize(
            &sparse,
            &[],
            None,
            &EnrichmentContext {
                pool: "customer".into(),
                provider: None,
            },
        );
        assert_eq!(principal.name, "g");
        assert_eq!(principal.role, "individual");
        assert_eq!(principal.timezone, "UTC");
        assert!(principal.permissions.is_empty());
        assert_eq!(principal.organization_name, None);
    }
}
