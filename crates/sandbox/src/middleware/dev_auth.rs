//! Development identity injection
//!
//! A real host would derive the request identity from its session or token
//! layer. The sandbox injects a configured development identity on every
//! request, overridable per request through `x-tenant-id` / `x-user-id`
//! headers so tests can act as other tenants and users.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use plugwell_common::auth::AuthContext;
use uuid::Uuid;

/// Default identity injected for every sandbox request
#[derive(Clone)]
pub struct DevIdentity {
    pub tenant_id: Uuid,
    pub user_id: String,
}

pub async fn inject_dev_identity(
    State(identity): State<DevIdentity>,
    mut request: Request,
    next: Next,
) -> Response {
    let tenant_id = request
        .headers()
        .get("x-tenant-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or(identity.tenant_id);

    let user_id = request
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or(identity.user_id);

    request
        .extensions_mut()
        .insert(AuthContext { tenant_id, user_id });

    next.run(request).await
}
