//! Organization reads.

use sqlx_core::query_as::query_as;

use crate::{PgPool, StorageResult};

/// Read access to the `organizations` table.
pub struct OrganizationStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> OrganizationStorage<'a> {
    /// Creates storage over a pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Looks up an organization's display name.
    ///
    /// Absence is a value, not an error: unknown ids (including placeholder
    /// ids like `"pending"` seeded before an organization exists) return
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_name(&self, organization_id: &str) -> StorageResult<Option<String>> {
        let row: Option<(String,)> = query_as(
            r#"
            SELECT name
            FROM organizations
            WHERE id::text = $1
            "#,
        )
        .bind(organization_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(name,)| name))
    }
}
