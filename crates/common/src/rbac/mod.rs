//! Role-based access control
//!
//! Grants are a flat three-table join inside a tenant's schema: a user
//! holds roles (`rbac_user_roles`) and roles hold permissions
//! (`rbac_role_permissions`). No hierarchy, no deny rules, no caching.
//!
//! [`Rbac::require`] is the gate factory the host hands to plugins: it
//! produces a tower layer that checks one permission code per route,
//! inside a tenant-scoped transaction.

use crate::auth::AuthContext;
use crate::errors::{AppError, Result};
use crate::tenant::TenantRunner;
use axum::{extract::Request, response::IntoResponse, response::Response};
use futures::future::BoxFuture;
use sqlx::PgConnection;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use uuid::Uuid;

/// Permission-gate factory backed by the tenant-scoped runner.
#[derive(Clone)]
pub struct Rbac {
    runner: TenantRunner,
}

impl Rbac {
    pub fn new(runner: TenantRunner) -> Self {
        Self { runner }
    }

    /// Build a route gate for one permission code.
    pub fn require(&self, perm: impl Into<String>) -> PermissionGate {
        PermissionGate {
            runner: self.runner.clone(),
            perm: Arc::from(perm.into()),
        }
    }
}

/// Tower layer gating a route on one permission code.
#[derive(Clone)]
pub struct PermissionGate {
    runner: TenantRunner,
    perm: Arc<str>,
}

impl<S> Layer<S> for PermissionGate {
    type Service = PermissionGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PermissionGateService {
            inner,
            runner: self.runner.clone(),
            perm: self.perm.clone(),
        }
    }
}

#[derive(Clone)]
pub struct PermissionGateService<S> {
    inner: S,
    runner: TenantRunner,
    perm: Arc<str>,
}

impl<S> Service<Request> for PermissionGateService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, std::result::Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), S::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let runner = self.runner.clone();
        let perm = self.perm.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let auth = req.extensions().get::<AuthContext>().cloned();
            match check_permission(&runner, auth, &perm).await {
                Ok(()) => inner.call(req).await,
                // Denials and check failures become responses here; the
                // inner route never runs.
                Err(err) => Ok(err.into_response()),
            }
        })
    }
}

/// Decide whether the request identity holds `perm` in its tenant.
///
/// Missing identity fails closed with `Unauthenticated` before any database
/// access. An empty join is `Forbidden` naming the permission. A database
/// error propagates unmodified: a check that cannot execute must not look
/// like a denial.
async fn check_permission(
    runner: &TenantRunner,
    auth: Option<AuthContext>,
    perm: &str,
) -> Result<()> {
    let auth = auth.ok_or(AppError::Unauthenticated)?;

    let user_id = auth.user_id.clone();
    let perm_owned = perm.to_string();

    let granted = runner
        .run(auth.tenant_id, move |conn: &mut PgConnection| {
            Box::pin(async move {
                let row: Option<i32> = sqlx::query_scalar(
                    r#"
                    select 1
                    from rbac_user_roles ur
                    join rbac_role_permissions rp on rp.role_code = ur.role_code
                    where ur.user_id = $1 and rp.permission_code = $2
                    limit 1
                    "#,
                )
                .bind(&user_id)
                .bind(&perm_owned)
                .fetch_optional(&mut *conn)
                .await?;

                Ok(row.is_some())
            })
        })
        .await?;

    if granted {
        Ok(())
    } else {
        tracing::warn!(
            tenant_id = %auth.tenant_id,
            user_id = %auth.user_id,
            perm = perm,
            "Permission denied"
        );
        Err(AppError::Forbidden {
            perm: perm.to_string(),
        })
    }
}

/// Seed a permission set for one role and one user, idempotently.
///
/// Runs in a single tenant-scoped transaction; every insert is
/// `on conflict do nothing`, so re-running leaves exactly one row per
/// (role, permission) and (user, role) pair.
pub async fn seed_permissions(
    runner: &TenantRunner,
    tenant_id: Uuid,
    permissions: &[&str],
    role_code: &str,
    user_id: &str,
) -> Result<()> {
    let role_code = role_code.to_string();
    let user_id = user_id.to_string();
    let permissions: Vec<String> = permissions.iter().map(|p| p.to_string()).collect();

    runner
        .run(tenant_id, move |conn: &mut PgConnection| {
            Box::pin(async move {
                sqlx::query(
                    "insert into rbac_roles (role_code, name) values ($1, $1) \
                     on conflict do nothing",
                )
                .bind(&role_code)
                .execute(&mut *conn)
                .await?;

                sqlx::query(
                    "insert into rbac_user_roles (user_id, role_code) values ($1, $2) \
                     on conflict do nothing",
                )
                .bind(&user_id)
                .bind(&role_code)
                .execute(&mut *conn)
                .await?;

                for perm in &permissions {
                    sqlx::query(
                        "insert into rbac_permissions (permission_code, description) \
                         values ($1, $1) on conflict do nothing",
                    )
                    .bind(perm)
                    .execute(&mut *conn)
                    .await?;

                    sqlx::query(
                        "insert into rbac_role_permissions (role_code, permission_code) \
                         values ($1, $2) on conflict do nothing",
                    )
                    .bind(&role_code)
                    .bind(perm)
                    .execute(&mut *conn)
                    .await?;
                }

                Ok(())
            })
        })
        .await
}
