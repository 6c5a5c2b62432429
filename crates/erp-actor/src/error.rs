//! # Actor Errors
//!
//! This module defines the common error type used throughout the crate.
//! A caller awaiting a submitted operation sees exactly one variant of
//! [`ActorError`]; nothing else escapes the actor.

use crate::tenant::TenantKey;
use std::time::Duration;

/// Boxed error type carried by work closures and connectors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by actors and the actor pool.
///
/// `TenantMismatch`, `ShuttingDown` and `Disposed` are raised synchronously
/// at submission and never reach the queue. `Timeout`, `Cancelled` and
/// `Execution` are delivered only to the completion slot of the operation
/// they belong to. `WorkerCrashed` marks an actor instance as unusable; the
/// pool replaces such instances on the next lookup.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    #[error("operation tenant {operation} does not match actor tenant {actor}")]
    TenantMismatch {
        operation: TenantKey,
        actor: TenantKey,
    },

    #[error("actor is shutting down")]
    ShuttingDown,

    #[error("actor is disposed")]
    Disposed,

    #[error("operation timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    #[error("operation cancelled by caller")]
    Cancelled,

    #[error("operation failed: {0}")]
    Execution(#[source] BoxError),

    #[error("connection initialization failed: {0}")]
    InitFailed(#[source] BoxError),

    #[error("actor worker crashed")]
    WorkerCrashed,
}

impl ActorError {
    /// Wraps a closure-originated error.
    pub fn execution(err: impl Into<BoxError>) -> Self {
        Self::Execution(err.into())
    }

    /// True for the variants raised synchronously at `submit`.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::TenantMismatch { .. } | Self::ShuttingDown | Self::Disposed
        )
    }
}
