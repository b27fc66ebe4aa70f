//! Items resource handlers

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use plugwell_common::{
    auth::AuthContext,
    errors::{AppError, Result},
    tenant::TenantRunner,
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

/// An item row inside a tenant schema.
///
/// No tenant column: isolation is structural, not row-level.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ItemsState {
    pub runner: TenantRunner,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// List all items for the request's tenant, most recently created first.
pub async fn list_items(
    State(state): State<ItemsState>,
    auth: AuthContext,
) -> Result<Json<Vec<Item>>> {
    let items = state
        .runner
        .run(auth.tenant_id, |conn: &mut PgConnection| {
            Box::pin(async move {
                sqlx::query_as::<_, Item>(
                    "select id, name, created_at from items order by created_at desc",
                )
                .fetch_all(&mut *conn)
                .await
                .map_err(Into::into)
            })
        })
        .await?;

    Ok(Json(items))
}

/// Create one item. The name must be non-empty after trimming; the stored
/// value is the submitted one, untrimmed, and duplicates are permitted.
pub async fn create_item(
    State(state): State<ItemsState>,
    auth: AuthContext,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>)> {
    let name = request
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or(AppError::Validation {
            code: "NAME_REQUIRED",
        })?;

    let item = state
        .runner
        .run(auth.tenant_id, move |conn: &mut PgConnection| {
            Box::pin(async move {
                sqlx::query_as::<_, Item>(
                    "insert into items (name) values ($1) returning id, name, created_at",
                )
                .bind(&name)
                .fetch_one(&mut *conn)
                .await
                .map_err(Into::into)
            })
        })
        .await?;

    tracing::info!(
        item_id = %item.id,
        tenant_id = %auth.tenant_id,
        "Item created"
    );

    Ok((StatusCode::CREATED, Json(item)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_name(name: Option<&str>) -> Result<String> {
        CreateItemRequest {
            name: name.map(String::from),
        }
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or(AppError::Validation {
            code: "NAME_REQUIRED",
        })
    }

    #[test]
    fn test_missing_name_rejected() {
        assert!(matches!(
            validate_name(None),
            Err(AppError::Validation { code: "NAME_REQUIRED" })
        ));
    }

    #[test]
    fn test_whitespace_name_rejected() {
        assert!(validate_name(Some("  ")).is_err());
        assert!(validate_name(Some("\t\n")).is_err());
    }

    #[test]
    fn test_name_stored_untrimmed() {
        assert_eq!(validate_name(Some("Widget")).unwrap(), "Widget");
        assert_eq!(validate_name(Some(" Widget ")).unwrap(), " Widget ");
    }
}
