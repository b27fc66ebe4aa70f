//! Plugwell sandbox entry point
//!
//! Startup order: env → config → tracing → pool → bootstrap → plugin
//! registration → best-effort permission seeding → serve.

use plugwell_common::{config::AppConfig, db, plugin::Plugin, tenant::TenantRunner};
use plugwell_sandbox::{create_router, seed_plugin_permissions, shutdown_signal, AppState};
use plugwell_sample::SamplePlugin;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing; RUST_LOG wins over configured level when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.observability.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(
        service = %config.observability.service_name,
        "Starting plugwell sandbox v{}",
        plugwell_common::VERSION
    );

    // Initialize database connection
    let pool = db::connect(&config.database).await?;

    // Bootstrap the tenant directory and dev tenant
    info!("Running bootstrap...");
    let dev_tenant_id = db::bootstrap(&pool, &config.tenancy).await?;
    info!(dev_tenant_id = %dev_tenant_id, "Bootstrap completed");

    let state = AppState {
        config: Arc::new(config.clone()),
        runner: TenantRunner::new(pool),
        dev_tenant_id,
    };

    let plugin = SamplePlugin;

    // Seed declared permissions from the plugin (best-effort, bounded)
    seed_plugin_permissions(&state, &plugin).await;

    // Build the router
    let app = create_router(state, &plugin);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);
    info!("API at /api/plugins/{}", plugin.meta().id);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
