//! Tenant-scoped transaction runner
//!
//! Every database operation on tenant-owned tables goes through
//! [`TenantRunner::run`]: one pooled connection, one transaction, with the
//! connection's search path switched to the tenant's schema for the
//! lifetime of that transaction only.

use super::{schema_for_tenant, validate_schema_name};
use crate::errors::Result;
use futures::future::BoxFuture;
use sqlx::{Connection, PgConnection, PgPool};
use uuid::Uuid;

/// Handle to the shared pool that scopes units of work to one tenant.
#[derive(Clone)]
pub struct TenantRunner {
    pool: PgPool,
}

impl TenantRunner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for host-side plumbing (bootstrap, health)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run `unit` inside a transaction scoped to `tenant_id`'s schema.
    ///
    /// Exactly one connection is borrowed for the whole call and released
    /// on every exit path when the `PoolConnection` drops. The directory
    /// lookup happens before `begin`, so an unknown tenant never opens a
    /// transaction. On failure the rollback is attempted best-effort and
    /// the original error is re-raised; rollback failure is swallowed so it
    /// cannot mask the cause.
    pub async fn run<T, F>(&self, tenant_id: Uuid, unit: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T>> + Send,
    {
        let mut conn = self.pool.acquire().await?;

        let schema = schema_for_tenant(&mut conn, tenant_id).await?;
        validate_schema_name(&schema)?;

        let mut tx = conn.begin().await?;

        // `set local` is transaction-scoped: unqualified table names inside
        // the unit of work resolve into the tenant's schema, and the setting
        // dies with the transaction rather than leaking to the next borrower
        // of this connection. The schema name was validated above; this is
        // the one interpolation point in the codebase.
        sqlx::query(&format!(r#"set local search_path to "{schema}", public"#))
            .execute(&mut *tx)
            .await?;

        match unit(&mut *tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(
                        tenant_id = %tenant_id,
                        error = %rollback_err,
                        "Rollback failed after unit-of-work error"
                    );
                }
                Err(err)
            }
        }
    }
}
