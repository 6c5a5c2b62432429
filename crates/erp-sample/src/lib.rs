//! # ERP Sample
//!
//! A complete wiring of the `erp-actor` crate against a fake ERP backend:
//!
//! - **[backend]**: the fake ERP: fabricated articles/customers, in-memory
//!   orders, one exclusive connection per tenant.
//! - **[service]**: the API callers use; resolves the tenant's actor and
//!   submits work closures, never touching a connection directly.
//! - **[lifecycle]**: tracing setup for the demo binary.
//!
//! See `main.rs` for an end-to-end run across several tenants.

pub mod backend;
pub mod lifecycle;
pub mod service;
