//! Plugwell sandbox host
//!
//! Wires a plugin into a running HTTP service: bootstraps the tenant
//! directory, injects a development identity on every request, mounts the
//! plugin under its namespace with a host health pre-route, and serves the
//! static display layer.

pub mod middleware;

use axum::{routing::get, Json, Router};
use plugwell_common::{
    config::AppConfig,
    plugin::{Plugin, PluginContext, PluginLog},
    rbac::{seed_permissions, Rbac},
    tenant::TenantRunner,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};
use uuid::Uuid;

/// Application state shared across the host
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub runner: TenantRunner,
    pub dev_tenant_id: Uuid,
}

/// Seed the plugin's declared permissions for the dev tenant.
///
/// Bounded by the configured timeout and best-effort: the sandbox starts
/// even when seeding fails, so an empty grant table degrades to 403s
/// rather than a dead process.
pub async fn seed_plugin_permissions(state: &AppState, plugin: &impl Plugin) {
    let tenancy = &state.config.tenancy;
    let perms = plugin.permissions();

    info!(perms = ?perms, "Seeding plugin permissions");

    let seeding = seed_permissions(
        &state.runner,
        state.dev_tenant_id,
        perms,
        &tenancy.owner_role,
        &tenancy.dev_user_id,
    );

    match tokio::time::timeout(Duration::from_secs(tenancy.seed_timeout_secs), seeding).await {
        Ok(Ok(())) => info!("Permissions seeded"),
        Ok(Err(e)) => warn!(error = %e, "Permission seeding failed; continuing without it"),
        Err(_) => warn!(
            timeout_secs = tenancy.seed_timeout_secs,
            "Permission seeding timed out; continuing without it"
        ),
    }
}

/// Create the host router with the plugin mounted under its namespace.
pub fn create_router(state: AppState, plugin: &impl Plugin) -> Router {
    let meta = plugin.meta();

    let ctx = PluginContext {
        runner: state.runner.clone(),
        rbac: Rbac::new(state.runner.clone()),
        log: PluginLog::new(meta.id),
    };
    let plugin_routes = plugin.register(ctx);

    // Host-owned health pre-route, merged ahead of the plugin's routes
    let plugin_id = meta.id;
    let pre = Router::new().route(
        "/health",
        get(move || async move { Json(json!({ "ok": true, "plugin": plugin_id })) }),
    );

    let prefix = format!("/api/plugins/{}", meta.id);
    info!(prefix = %prefix, plugin = meta.id, version = meta.version, "Mounting plugin");

    // CORS configuration (wide open; this is a dev sandbox)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let dev_identity = middleware::DevIdentity {
        tenant_id: state.dev_tenant_id,
        user_id: state.config.tenancy.dev_user_id.clone(),
    };

    Router::new()
        .nest(&prefix, pre.merge(plugin_routes))
        // Display layer: a static page exercising the endpoints
        .fallback_service(ServeDir::new("crates/sandbox/static"))
        .layer(axum::middleware::from_fn_with_state(
            dev_identity,
            middleware::inject_dev_identity,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
}

/// Graceful shutdown signal handler
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
