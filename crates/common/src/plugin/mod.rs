//! Plugin contract
//!
//! The integration seam this repository exists to prove out: a plugin's
//! only obligations to the host are to declare its permission codes and
//! register routes against a host-provided [`PluginContext`]. The context
//! carries everything a plugin may touch: the tenant-scoped transaction
//! runner, the permission-gate factory and a structured logger. Plugins
//! never see the pool, the directory or request headers directly.

use crate::rbac::Rbac;
use crate::tenant::TenantRunner;
use axum::Router;

/// Plugin identity
#[derive(Debug, Clone)]
pub struct PluginMeta {
    pub id: &'static str,
    pub version: &'static str,
    pub api: &'static str,
}

/// Structured logger bound to a plugin id.
#[derive(Clone)]
pub struct PluginLog {
    plugin_id: &'static str,
}

impl PluginLog {
    pub fn new(plugin_id: &'static str) -> Self {
        Self { plugin_id }
    }

    pub fn info(&self, msg: &str) {
        tracing::info!(plugin = self.plugin_id, "{msg}");
    }

    pub fn warn(&self, msg: &str) {
        tracing::warn!(plugin = self.plugin_id, "{msg}");
    }
}

/// Capabilities the host supplies to a plugin at registration time.
#[derive(Clone)]
pub struct PluginContext {
    /// Tenant-scoped transaction runner
    pub runner: TenantRunner,

    /// Permission-gate factory (`require(code) -> gate`)
    pub rbac: Rbac,

    /// Structured logger tagged with the plugin id
    pub log: PluginLog,
}

/// A backend plugin.
pub trait Plugin {
    /// Plugin identity; `id` becomes the mount prefix segment
    fn meta(&self) -> PluginMeta;

    /// Permission codes the host seeds for this plugin
    fn permissions(&self) -> &'static [&'static str];

    /// Build the plugin's router against the host context. Routes are
    /// mounted by the host under `/api/plugins/{id}`.
    fn register(&self, ctx: PluginContext) -> Router;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_log_is_cheap_to_clone() {
        let log = PluginLog::new("sample");
        let other = log.clone();
        other.info("registered");
    }
}
