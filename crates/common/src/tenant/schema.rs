//! Schema name validation
//!
//! The schema name is interpolated directly into `set local search_path`
//! and bootstrap DDL; the Postgres driver cannot parameterize either. This
//! check is the sole defense against schema-name injection, so it runs on
//! every resolved name immediately before use, even though names originate
//! from the trusted directory table.

use crate::errors::{AppError, Result};

/// Accepts identifiers matching `^[A-Za-z_][A-Za-z0-9_]*$`
pub fn validate_schema_name(name: &str) -> Result<()> {
    let mut chars = name.chars();

    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}
