//! # Tenant Keys
//!
//! This module defines the `TenantKey`, the identifier selecting which
//! isolated ERP context an operation targets. A key is a tenant id,
//! optionally narrowed by a business unit when one tenant runs several
//! independent ERP mandates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the ERP context an actor owns and an operation targets.
///
/// # Architecture Note
/// The key is what the registry maps to actors: one key, one actor, one
/// connection. Two operations with the same key are serialized; operations
/// with different keys run fully in parallel.
///
/// Tenant ids and business units are case-insensitive; keys normalize to
/// lowercase on construction so equality and hashing agree.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantKey {
    tenant_id: String,
    business_unit: Option<String>,
}

impl TenantKey {
    /// Creates a key for a tenant's default business unit.
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: normalize(tenant_id),
            business_unit: None,
        }
    }

    /// Creates a key scoped to a specific business unit.
    pub fn with_business_unit(
        tenant_id: impl Into<String>,
        business_unit: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: normalize(tenant_id),
            business_unit: Some(normalize(business_unit)),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn business_unit(&self) -> Option<&str> {
        self.business_unit.as_deref()
    }
}

fn normalize(value: impl Into<String>) -> String {
    let value: String = value.into();
    value.to_ascii_lowercase()
}

impl fmt::Display for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.business_unit {
            Some(unit) => write!(f, "{}/{}", self.tenant_id, unit),
            None => write!(f, "{}", self.tenant_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_case_insensitive() {
        assert_eq!(TenantKey::new("Acme"), TenantKey::new("acme"));
        assert_eq!(
            TenantKey::with_business_unit("Acme", "10"),
            TenantKey::with_business_unit("acme", "10")
        );
    }

    #[test]
    fn business_unit_distinguishes_keys() {
        assert_ne!(
            TenantKey::new("acme"),
            TenantKey::with_business_unit("acme", "10")
        );
    }

    #[test]
    fn display_includes_business_unit() {
        assert_eq!(TenantKey::new("acme").to_string(), "acme");
        assert_eq!(
            TenantKey::with_business_unit("acme", "10").to_string(),
            "acme/10"
        );
    }
}
