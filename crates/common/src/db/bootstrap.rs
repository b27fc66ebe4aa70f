//! Idempotent startup bootstrap
//!
//! Ensures the shared tenant directory, the development tenant row, its
//! schema, the items table and the four RBAC tables all exist. Every
//! statement is safe to re-run.

use crate::config::TenancyConfig;
use crate::errors::Result;
use crate::tenant::validate_schema_name;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Bootstrap the tenant directory and the dev tenant, returning its id.
pub async fn bootstrap(pool: &PgPool, tenancy: &TenancyConfig) -> Result<Uuid> {
    // gen_random_uuid() lives in pgcrypto on older Postgres
    sqlx::query("CREATE EXTENSION IF NOT EXISTS pgcrypto")
        .execute(pool)
        .await?;

    // Shared, cross-tenant directory table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS public.sys_tenant (
            id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
            code        text UNIQUE NOT NULL,
            name        text        NOT NULL,
            domain      text,
            schema_name text        NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    let dev_tenant_id: Uuid = sqlx::query_scalar(
        r#"
        insert into sys_tenant (id, code, name, domain, schema_name)
        values (gen_random_uuid(), $1, $2, $3, $4)
        on conflict (code) do update set
            schema_name = excluded.schema_name,
            name = excluded.name,
            domain = excluded.domain
        returning id
        "#,
    )
    .bind(&tenancy.dev_tenant_code)
    .bind("Development Tenant")
    .bind("localhost")
    .bind(&tenancy.dev_tenant_schema)
    .fetch_one(pool)
    .await?;

    // The schema name comes from config, not a request, but it is about to
    // be interpolated into DDL, so it goes through the same validator as
    // directory rows.
    let schema = tenancy.dev_tenant_schema.as_str();
    validate_schema_name(schema)?;

    sqlx::query(&format!(r#"CREATE SCHEMA IF NOT EXISTS "{schema}""#))
        .execute(pool)
        .await?;

    // Business sample table
    sqlx::query(&format!(
        r#"
        create table if not exists "{schema}".items (
            id uuid primary key default gen_random_uuid(),
            name text not null,
            created_at timestamptz not null default now()
        )
        "#
    ))
    .execute(pool)
    .await?;

    // RBAC tables in the tenant schema
    sqlx::query(&format!(
        r#"
        create table if not exists "{schema}".rbac_permissions (
            permission_code text primary key,
            description text
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        create table if not exists "{schema}".rbac_roles (
            role_code text primary key,
            name text not null
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        create table if not exists "{schema}".rbac_role_permissions (
            role_code text not null references "{schema}".rbac_roles(role_code) on delete cascade,
            permission_code text not null references "{schema}".rbac_permissions(permission_code) on delete cascade,
            primary key (role_code, permission_code)
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        create table if not exists "{schema}".rbac_user_roles (
            user_id text not null,
            role_code text not null references "{schema}".rbac_roles(role_code) on delete cascade,
            primary key (user_id, role_code)
        )
        "#
    ))
    .execute(pool)
    .await?;

    info!(
        tenant_id = %dev_tenant_id,
        schema = schema,
        "Bootstrap complete"
    );

    Ok(dev_tenant_id)
}
