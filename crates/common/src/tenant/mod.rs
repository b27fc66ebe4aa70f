//! Tenant isolation layer
//!
//! One shared directory table (`public.sys_tenant`) maps opaque tenant ids
//! to schema names; everything else a tenant owns lives inside its own
//! schema and is only ever reached through [`TenantRunner`].

mod runner;
mod schema;

pub use runner::TenantRunner;
pub use schema::validate_schema_name;

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

/// A row in the shared tenant directory.
///
/// Effectively immutable after provisioning; never deleted by this system.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub domain: Option<String>,
    pub schema_name: String,
}

/// Resolve the schema name for a tenant id.
///
/// A directory miss is `TenantNotFound`; the returned name is not yet
/// validated.
pub async fn schema_for_tenant(conn: &mut PgConnection, tenant_id: Uuid) -> Result<String> {
    let schema: Option<String> =
        sqlx::query_scalar("select schema_name from sys_tenant where id = $1")
            .bind(tenant_id)
            .fetch_optional(conn)
            .await?;

    schema.ok_or_else(|| AppError::TenantNotFound {
        id: tenant_id.to_string(),
    })
}

/// Find a tenant by its short code
pub async fn find_tenant_by_code(pool: &PgPool, code: &str) -> Result<Option<Tenant>> {
    sqlx::query_as::<_, Tenant>(
        "select id, code, name, domain, schema_name from sys_tenant where code = $1",
    )
    .bind(code)
    .fetch_optional(pool)
    .await
    .map_err(Into::into)
}
