//! Permission grant reads.

use sqlx_core::query_as::query_as;
use time::OffsetDateTime;

use crate::{PgPool, StorageResult};

/// One grant row from `user_permissions`.
#[derive(Debug, Clone)]
pub struct PermissionGrant {
    /// Kind of resource the grant applies to ("team", "project", ...).
    pub resource_type: String,
    /// Identifier of that resource.
    pub resource_id: String,
    /// Granted permission ("view", "edit", "admin", ...).
    pub permission: String,
    /// When the grant was issued.
    pub granted_at: OffsetDateTime,
    /// Optional expiry; `None` means the grant does not lapse.
    pub expires_at: Option<OffsetDateTime>,
}

impl PermissionGrant {
    /// The grant as a flat permission key.
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.resource_type, self.resource_id, self.permission
        )
    }
}

/// Read access to the `user_permissions` table.
pub struct PermissionStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> PermissionStorage<'a> {
    /// Creates storage over a pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Loads a subject's live grants, newest first. Expired grants are
    /// filtered in the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn grants_for_subject(&self, subject: &str) -> StorageResult<Vec<PermissionGrant>> {
        let rows: Vec<(
            String,
            String,
            String,
            OffsetDateTime,
            Option<OffsetDateTime>,
        )> = query_as(
            r#"
            SELECT resource_type, resource_id, permission, granted_at, expires_at
            FROM user_permissions
            WHERE user_id = $1
              AND (expires_at IS NULL OR expires_at > NOW())
            ORDER BY granted_at DESC
            "#,
        )
        .bind(subject)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(resource_type, resource_id, permission, granted_at, expires_at)| {
                    PermissionGrant {
                        resource_type,
                        resource_id,
                        permission,
                        granted_at,
                        expires_at,
                    }
                },
            )
            .collect())
    }
}
