//! Host middleware

mod dev_auth;

pub use dev_auth::{inject_dev_identity, DevIdentity};
