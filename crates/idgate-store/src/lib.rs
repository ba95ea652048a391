//! PostgreSQL authorization enrichment for IdGate.
//!
//! The relational store owns organization records and permission grants;
//! this crate reads them to enrich a verified identity into a full
//! [`idgate_session::Principal`]. Everything here is read-only — grants and
//! organizations are written by the resource endpoints that own them, not by
//! the session core.

pub mod enrich;
pub mod organization;
pub mod permission;

use sqlx_core::pool::Pool;
use sqlx_postgres::Postgres;

pub use enrich::{EnrichmentContext, PostgresEnricher, PrincipalEnricher, materialize};
pub use organization::OrganizationStorage;
pub use permission::{PermissionGrant, PermissionStorage};

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during enrichment reads.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Connects a pool to the configured database.
///
/// Called once at startup; the pool is shared across all requests.
///
/// # Errors
///
/// Returns an error when the connection cannot be established.
pub async fn connect(database_url: &str, max_connections: u32) -> StorageResult<PgPool> {
    use sqlx_core::pool::PoolOptions;
    let pool = PoolOptions::<Postgres>::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}
