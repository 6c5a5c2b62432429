//! # ERP Actor
//!
//! This crate provides the serializing actor that guards access to an ERP
//! backend that is **not safe for concurrent use**. For any given tenant, at
//! most one operation touches the backend connection at a time, while many
//! concurrent callers keep an asynchronous, non-blocking API, with bounded
//! memory, per-operation deadlines, cancellation, and observable health
//! counters.
//!
//! ## Architecture Overview
//!
//! Three pieces cooperate:
//!
//! 1. **Operation** ([`ErpOperation`]): a transient, typed unit of work plus
//!    its completion slot. Operations are type-erased onto the actor's queue
//!    so work with different result types shares one queue and one
//!    connection; each operation resolves its own strongly-typed slot, so
//!    the worker never needs runtime type dispatch.
//! 2. **Actor** ([`ErpActor`]): one bounded queue, one dedicated worker
//!    task, one lazily-initialized connection handle. The worker drains
//!    operations strictly in order, one at a time, to completion, timeout or
//!    error.
//! 3. **Pool** ([`ErpActorPool`]): the process-wide map from [`TenantKey`]
//!    to actor, with race-free lazy construction, crash eviction and bulk
//!    teardown.
//!
//! ## Concurrency Model
//!
//! - Each actor's worker runs in its own Tokio task; the connection handle
//!   is moved into it and never shared, so no lock guards the backend.
//! - Pipelines for different tenants run fully in parallel; within one
//!   tenant execution is strictly serial.
//! - The queue is bounded: submitters suspend (no thread is blocked) when it
//!   is full, capping memory under sustained overload.
//! - Every operation carries a deadline (explicit or the configured
//!   default) and an optional caller cancellation token. The two signals
//!   stay distinct, so a timed-out operation reports
//!   [`ActorError::Timeout`] and a cancelled one [`ActorError::Cancelled`];
//!   a timed-out operation never stalls the worker beyond its own deadline.
//!
//! ## Quick Start
//!
//! ```rust
//! use erp_actor::mock::MockConnector;
//! use erp_actor::{ErpActorPool, TenantKey};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), erp_actor::ActorError> {
//!     let pool = ErpActorPool::new(MockConnector::new());
//!     let tenant = TenantKey::new("acme");
//!
//!     // One actor per tenant; lookups construct lazily and initialize the
//!     // connection exactly once.
//!     let actor = pool.actor(&tenant).await?;
//!
//!     let result = actor
//!         .execute(|conn, _signal| {
//!             Box::pin(async move {
//!                 Ok(conn.call("fetch-article", Duration::from_millis(5)).await)
//!             })
//!         })
//!         .await?;
//!     assert_eq!(result, "fetch-article");
//!
//!     pool.shutdown_all().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Model
//!
//! A caller awaiting a submitted operation sees exactly one typed outcome:
//! the result, or one [`ActorError`] variant. Validation errors are raised
//! synchronously at `submit` and never reach the queue; per-operation
//! failures are delivered only to their own completion slot, so one failing
//! operation cannot affect others already queued. No retries happen here;
//! resilience belongs to the caller.
//!
//! ## Testing
//!
//! The [`mock`] module provides a scripted connector and a connection that
//! records calls and latches a flag if two operations ever overlap on it.
//! See the integration tests for usage patterns.

pub mod actor;
pub mod config;
pub mod connector;
pub mod error;
pub mod mock;
pub mod operation;
pub mod pool;
pub mod tenant;

// Re-export core types for convenience
pub use actor::{ActorStats, ErpActor, Lifecycle};
pub use config::ActorConfig;
pub use connector::ErpConnector;
pub use error::{ActorError, BoxError};
pub use operation::{ErpOperation, WorkFuture};
pub use pool::ErpActorPool;
pub use tenant::TenantKey;
