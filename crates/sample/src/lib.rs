//! Sample items plugin
//!
//! Demonstrates the plugin contract: declare permission codes, register
//! routes against the host-provided [`PluginContext`], and reach the
//! database only through the context's tenant-scoped runner.

mod handlers;

pub use handlers::Item;

use axum::{handler::Handler, routing::get, Router};
use plugwell_common::plugin::{Plugin, PluginContext, PluginMeta};

/// Plugin id; the host mounts routes under `/api/plugins/{id}`
pub const MODULE_ID: &str = "sample";

pub const PERM_ITEMS_READ: &str = "sample.items.read";
pub const PERM_ITEMS_CREATE: &str = "sample.items.create";
pub const PERM_ITEMS_UPDATE: &str = "sample.items.update";
pub const PERM_ITEMS_DELETE: &str = "sample.items.delete";

/// All permission codes this plugin declares to the host. Update and
/// delete are declared for seeding even though this demo only routes
/// read and create.
pub const PERMISSIONS: &[&str] = &[
    PERM_ITEMS_READ,
    PERM_ITEMS_CREATE,
    PERM_ITEMS_UPDATE,
    PERM_ITEMS_DELETE,
];

pub struct SamplePlugin;

impl Plugin for SamplePlugin {
    fn meta(&self) -> PluginMeta {
        PluginMeta {
            id: MODULE_ID,
            version: "0.1.0",
            api: "1.x",
        }
    }

    fn permissions(&self) -> &'static [&'static str] {
        PERMISSIONS
    }

    fn register(&self, ctx: PluginContext) -> Router {
        let state = handlers::ItemsState {
            runner: ctx.runner.clone(),
        };

        // Each method carries its own gate, so a read-only user can list
        // items but not create them.
        let router = Router::new()
            .route(
                "/items",
                get(handlers::list_items.layer(ctx.rbac.require(PERM_ITEMS_READ)))
                    .post(handlers::create_item.layer(ctx.rbac.require(PERM_ITEMS_CREATE))),
            )
            .with_state(state);

        ctx.log.info("registered");

        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta() {
        let meta = SamplePlugin.meta();
        assert_eq!(meta.id, "sample");
        assert_eq!(meta.api, "1.x");
    }

    #[test]
    fn test_declared_permissions_are_namespaced() {
        for perm in SamplePlugin.permissions() {
            assert!(perm.starts_with("sample.items."), "unscoped code: {perm}");
        }
        assert_eq!(SamplePlugin.permissions().len(), 4);
    }
}
