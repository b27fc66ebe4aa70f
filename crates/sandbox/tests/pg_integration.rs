//! End-to-end tests against a live Postgres.
//!
//! Ignored by default; run with a disposable database:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/plugwell_test \
//!     cargo test -p plugwell-sandbox -- --ignored
//! ```

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use plugwell_common::{
    config::AppConfig,
    db,
    errors::{AppError, Result},
    rbac::seed_permissions,
    tenant::TenantRunner,
};
use plugwell_sandbox::{create_router, AppState};
use plugwell_sample::{SamplePlugin, PERMISSIONS, PERM_ITEMS_READ};
use sqlx::{PgConnection, PgPool};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

async fn setup() -> AppState {
    let mut config = AppConfig::default();
    config.database.url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");

    let pool = db::connect(&config.database).await.unwrap();
    let dev_tenant_id = db::bootstrap(&pool, &config.tenancy).await.unwrap();

    AppState {
        config: Arc::new(config),
        runner: TenantRunner::new(pool),
        dev_tenant_id,
    }
}

/// Directory row + schema + items table for an extra tenant, the way an
/// external provisioning flow would.
async fn provision_tenant(pool: &PgPool, code: &str, schema: &str) -> Uuid {
    let id: Uuid = sqlx::query_scalar(
        "insert into sys_tenant (code, name, schema_name) values ($1, $1, $2) \
         on conflict (code) do update set schema_name = excluded.schema_name \
         returning id",
    )
    .bind(code)
    .bind(schema)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query(&format!(r#"create schema if not exists "{schema}""#))
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(&format!(
        r#"create table if not exists "{schema}".items (
            id uuid primary key default gen_random_uuid(),
            name text not null,
            created_at timestamptz not null default now()
        )"#
    ))
    .execute(pool)
    .await
    .unwrap();

    id
}

async fn insert_item(runner: &TenantRunner, tenant_id: Uuid, name: &str) {
    let name = name.to_string();
    runner
        .run(tenant_id, move |conn: &mut PgConnection| {
            Box::pin(async move {
                sqlx::query("insert into items (name) values ($1)")
                    .bind(&name)
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .await
        .unwrap();
}

async fn item_names(runner: &TenantRunner, tenant_id: Uuid) -> Vec<String> {
    runner
        .run(tenant_id, |conn: &mut PgConnection| {
            Box::pin(async move {
                sqlx::query_scalar::<_, String>(
                    "select name from items order by created_at desc",
                )
                .fetch_all(&mut *conn)
                .await
                .map_err(Into::into)
            })
        })
        .await
        .unwrap()
}

async fn body_json(body: Body) -> serde_json::Value {
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
#[ignore = "requires Postgres (set DATABASE_URL)"]
async fn unknown_tenant_never_runs_unit_of_work() {
    let state = setup().await;
    let called = Arc::new(AtomicBool::new(false));

    let called_in = called.clone();
    let err = state
        .runner
        .run(Uuid::new_v4(), move |_conn: &mut PgConnection| {
            called_in.store(true, Ordering::SeqCst);
            Box::pin(async move { Ok::<(), AppError>(()) })
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::TenantNotFound { .. }));
    assert!(!called.load(Ordering::SeqCst));
}

#[tokio::test]
#[ignore = "requires Postgres (set DATABASE_URL)"]
async fn items_are_invisible_across_tenants() {
    let state = setup().await;
    let pool = state.runner.pool();

    let t1 = provision_tenant(pool, "iso_a", "tenant_iso_a").await;
    let t2 = provision_tenant(pool, "iso_b", "tenant_iso_b").await;

    let marker = format!("marker-{}", Uuid::new_v4());
    insert_item(&state.runner, t1, &marker).await;

    assert!(item_names(&state.runner, t1).await.contains(&marker));
    assert!(!item_names(&state.runner, t2).await.contains(&marker));
}

#[tokio::test]
#[ignore = "requires Postgres (set DATABASE_URL)"]
async fn read_only_user_can_list_but_not_create() {
    let state = setup().await;

    seed_permissions(&state.runner, state.dev_tenant_id, PERMISSIONS, "OWNER", "dev")
        .await
        .unwrap();
    seed_permissions(
        &state.runner,
        state.dev_tenant_id,
        &[PERM_ITEMS_READ],
        "READER",
        "reader",
    )
    .await
    .unwrap();

    let app = create_router(state, &SamplePlugin);

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/plugins/sample/items")
                .header("x-user-id", "reader")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::post("/api/plugins/sample/items")
                .header("x-user-id", "reader")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"name":"Widget"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["error"], "FORBIDDEN");
    assert_eq!(body["perm"], "sample.items.create");
}

#[tokio::test]
#[ignore = "requires Postgres (set DATABASE_URL)"]
async fn create_validates_name_and_returns_created_row() {
    let state = setup().await;
    seed_permissions(&state.runner, state.dev_tenant_id, PERMISSIONS, "OWNER", "dev")
        .await
        .unwrap();
    let app = create_router(state, &SamplePlugin);

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/plugins/sample/items")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"name":"  "}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["error"], "NAME_REQUIRED");

    let response = app
        .oneshot(
            Request::post("/api/plugins/sample/items")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"name":"Widget"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["name"], "Widget");
    assert!(Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
    assert!(body["created_at"].is_string());
}

#[tokio::test]
#[ignore = "requires Postgres (set DATABASE_URL)"]
async fn seeding_twice_is_idempotent() {
    let state = setup().await;

    for _ in 0..2 {
        seed_permissions(&state.runner, state.dev_tenant_id, PERMISSIONS, "OWNER", "dev")
            .await
            .unwrap();
    }

    let (grants, assignments) = state
        .runner
        .run(state.dev_tenant_id, |conn: &mut PgConnection| {
            Box::pin(async move {
                let grants: i64 = sqlx::query_scalar(
                    "select count(*) from rbac_role_permissions where role_code = 'OWNER'",
                )
                .fetch_one(&mut *conn)
                .await?;
                let assignments: i64 = sqlx::query_scalar(
                    "select count(*) from rbac_user_roles \
                     where user_id = 'dev' and role_code = 'OWNER'",
                )
                .fetch_one(&mut *conn)
                .await?;
                Ok((grants, assignments))
            })
        })
        .await
        .unwrap();

    assert_eq!(grants, PERMISSIONS.len() as i64);
    assert_eq!(assignments, 1);
}

#[tokio::test]
#[ignore = "requires Postgres (set DATABASE_URL)"]
async fn list_returns_most_recent_first() {
    let state = setup().await;
    let tenant = provision_tenant(state.runner.pool(), "order_t", "tenant_order_t").await;

    let run = Uuid::new_v4();
    let a = format!("A-{run}");
    let b = format!("B-{run}");
    insert_item(&state.runner, tenant, &a).await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    insert_item(&state.runner, tenant, &b).await;

    let names = item_names(&state.runner, tenant).await;
    let pos_a = names.iter().position(|n| n == &a).unwrap();
    let pos_b = names.iter().position(|n| n == &b).unwrap();
    assert!(pos_b < pos_a, "expected [{b}, {a}] ordering, got {names:?}");
}

#[tokio::test]
#[ignore = "requires Postgres (set DATABASE_URL)"]
async fn failing_unit_of_work_commits_nothing_and_releases_the_connection() {
    let state = setup().await;
    let tenant = provision_tenant(state.runner.pool(), "rb_t", "tenant_rb_t").await;

    let marker = format!("rollback-{}", Uuid::new_v4());
    let marker_in = marker.clone();
    let result: Result<()> = state
        .runner
        .run(tenant, move |conn: &mut PgConnection| {
            Box::pin(async move {
                sqlx::query("insert into items (name) values ($1)")
                    .bind(&marker_in)
                    .execute(&mut *conn)
                    .await?;
                Err(AppError::Internal {
                    message: "induced failure".into(),
                })
            })
        })
        .await;
    assert!(result.is_err());

    // No partial write survived
    assert!(!item_names(&state.runner, tenant).await.contains(&marker));

    // The connection went back to the pool: the next call still works
    insert_item(&state.runner, tenant, "after-rollback").await;
}
