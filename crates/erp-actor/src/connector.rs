//! # Connector Seam
//!
//! The `ErpConnector` trait is the collaborator interface through which an
//! actor obtains its exclusive backend connection. Implementations live
//! outside this crate: a production connector logs into the real ERP, the
//! sample backend fabricates in-memory data, and [`crate::mock`] provides a
//! scripted one for tests.

use crate::error::BoxError;
use crate::tenant::TenantKey;
use async_trait::async_trait;
use std::sync::Arc;

/// Establishes the connection an actor's worker will own exclusively.
///
/// Called at most once per actor under the initialization guard; a failed
/// call leaves the actor un-initialized, and a later lookup retries.
#[async_trait]
pub trait ErpConnector<C>: Send + Sync {
    async fn connect(&self, tenant: &TenantKey) -> Result<C, BoxError>;
}

#[async_trait]
impl<C, T> ErpConnector<C> for Arc<T>
where
    T: ErpConnector<C> + ?Sized,
{
    async fn connect(&self, tenant: &TenantKey) -> Result<C, BoxError> {
        (**self).connect(tenant).await
    }
}
