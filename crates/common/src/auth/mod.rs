//! Request identity
//!
//! The host is responsible for putting an [`AuthContext`] on every request
//! it routes into a plugin. Plugins assume nothing about how the host
//! obtained the tenant and user, only that the context is present when
//! their gates and handlers run.

use crate::errors::{AppError, Result};
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Tenant and user identity attached to a request as an extension.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Tenant ID
    pub tenant_id: Uuid,

    /// Opaque external user identity; not a key into any table this
    /// system owns
    pub user_id: String,
}

/// Axum extractor for AuthContext; fails closed when the host did not
/// attach one.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}
