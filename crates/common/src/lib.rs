//! Plugwell Common Library
//!
//! Shared code for the plugin sandbox:
//! - Tenant directory and tenant-scoped transaction runner
//! - RBAC permission store, gate factory and seeding
//! - Plugin contract (`Plugin` trait and `PluginContext`)
//! - Error types and handling
//! - Configuration management
//! - Database pool and bootstrap

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod plugin;
pub mod rbac;
pub mod tenant;

// Re-export commonly used types
pub use auth::AuthContext;
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use plugin::{Plugin, PluginContext, PluginMeta};
pub use rbac::Rbac;
pub use tenant::TenantRunner;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
