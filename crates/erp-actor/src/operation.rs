//! # Operations
//!
//! An operation is a transient, typed unit of work plus its completion slot.
//! The actor's queue carries operations type-erased behind the [`Operation`]
//! capability, which exposes execution and completion steps but hides the
//! result type. Each concrete [`ErpOperation`] keeps its strongly-typed
//! oneshot sender private and resolves it itself, so the worker never needs
//! runtime type dispatch.
//!
//! # Timeout vs. cancellation
//! Every operation runs under two independent signals: the caller's
//! [`CancellationToken`] and a fresh deadline timer. They are kept as
//! separate sources rather than merged into one token, because a merged
//! signal cannot tell the worker *which* source fired; the failure must be
//! classified as [`ActorError::Timeout`] or [`ActorError::Cancelled`]
//! depending on that.

use crate::error::{ActorError, BoxError};
use crate::tenant::TenantKey;
use async_trait::async_trait;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Boxed future returned by a work closure; borrows the connection for the
/// duration of the call.
pub type WorkFuture<'c, R> = Pin<Box<dyn Future<Output = Result<R, BoxError>> + Send + 'c>>;

type WorkFn<C, R> =
    Box<dyn for<'c> FnOnce(&'c mut C, CancellationToken) -> WorkFuture<'c, R> + Send>;

/// How a single execution ended. Reported to the worker so counters and log
/// events are settled before the caller is released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExecutionStatus {
    Succeeded,
    TimedOut,
    Cancelled,
    Failed,
}

impl ExecutionStatus {
    pub(crate) fn is_success(self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub(crate) fn cause(self) -> &'static str {
        match self {
            Self::Succeeded => "none",
            Self::TimedOut => "timeout",
            Self::Cancelled => "cancelled",
            Self::Failed => "execution",
        }
    }
}

/// The uniform capability the actor's queue is declared over.
///
/// `execute` runs the work closure and stores the outcome internally without
/// resolving the completion slot; `finish` resolves it afterwards. The split
/// is what lets the worker update its counters strictly between execution
/// and the caller resuming.
#[async_trait]
pub(crate) trait Operation<C: Send>: Send {
    fn id(&self) -> Uuid;

    /// Runs the work closure under the combined caller/deadline signals.
    async fn execute(&mut self, conn: &mut C, default_deadline: Duration) -> ExecutionStatus;

    /// Resolves the completion slot with the stored outcome.
    fn finish(self: Box<Self>);

    /// Resolves the completion slot with `err` without executing.
    fn reject(self: Box<Self>, err: ActorError);
}

/// The queued half of an operation: everything except the receiver the
/// submitting caller awaits.
pub(crate) struct QueuedOperation<C, R> {
    id: Uuid,
    tenant: TenantKey,
    deadline: Option<Duration>,
    cancel: CancellationToken,
    work: Option<WorkFn<C, R>>,
    respond_to: Option<oneshot::Sender<Result<R, ActorError>>>,
    outcome: Option<Result<R, ActorError>>,
}

#[async_trait]
impl<C, R> Operation<C> for QueuedOperation<C, R>
where
    C: Send + 'static,
    R: Send + 'static,
{
    fn id(&self) -> Uuid {
        self.id
    }

    async fn execute(&mut self, conn: &mut C, default_deadline: Duration) -> ExecutionStatus {
        let Some(work) = self.work.take() else {
            self.outcome = Some(Err(ActorError::WorkerCrashed));
            return ExecutionStatus::Failed;
        };

        let deadline = self.deadline.unwrap_or(default_deadline);
        // Handed to the closure so cooperative work (and anything it spawned)
        // can observe both timeout and caller cancellation through one token.
        let signal = CancellationToken::new();
        let started = Instant::now();

        let work_fut = AssertUnwindSafe(work(conn, signal.clone())).catch_unwind();
        tokio::pin!(work_fut);

        let (outcome, status) = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                signal.cancel();
                (Err(ActorError::Cancelled), ExecutionStatus::Cancelled)
            }
            _ = tokio::time::sleep(deadline) => {
                signal.cancel();
                (
                    Err(ActorError::Timeout {
                        elapsed: started.elapsed(),
                    }),
                    ExecutionStatus::TimedOut,
                )
            }
            res = &mut work_fut => match res {
                Ok(Ok(value)) => (Ok(value), ExecutionStatus::Succeeded),
                Ok(Err(err)) => (Err(ActorError::Execution(err)), ExecutionStatus::Failed),
                Err(panic) => (
                    Err(ActorError::execution(panic_message(panic))),
                    ExecutionStatus::Failed,
                ),
            },
        };

        self.outcome = Some(outcome);
        status
    }

    fn finish(mut self: Box<Self>) {
        if let (Some(respond_to), Some(outcome)) = (self.respond_to.take(), self.outcome.take()) {
            // The receiver may have gone away; completion is try-set.
            let _ = respond_to.send(outcome);
        }
    }

    fn reject(mut self: Box<Self>, err: ActorError) {
        if let Some(respond_to) = self.respond_to.take() {
            let _ = respond_to.send(Err(err));
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("work closure panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("work closure panicked: {msg}")
    } else {
        "work closure panicked".to_string()
    }
}

/// A typed unit of work against one tenant's ERP connection.
///
/// Built by callers (usually through [`crate::ErpActor::execute`]) and
/// consumed by [`crate::ErpActor::submit`]. The operation owns both halves
/// of its completion slot until submission; `submit` splits it, enqueues the
/// erased half and awaits the receiver.
pub struct ErpOperation<C, R> {
    inner: QueuedOperation<C, R>,
    completion: oneshot::Receiver<Result<R, ActorError>>,
}

impl<C, R> ErpOperation<C, R>
where
    C: Send + 'static,
    R: Send + 'static,
{
    /// Creates an operation with the actor's default deadline and a fresh,
    /// never-fired cancellation token.
    pub fn new<F>(tenant: TenantKey, work: F) -> Self
    where
        F: for<'c> FnOnce(&'c mut C, CancellationToken) -> WorkFuture<'c, R> + Send + 'static,
    {
        let (respond_to, completion) = oneshot::channel();
        Self {
            inner: QueuedOperation {
                id: Uuid::new_v4(),
                tenant,
                deadline: None,
                cancel: CancellationToken::new(),
                work: Some(Box::new(work)),
                respond_to: Some(respond_to),
                outcome: None,
            },
            completion,
        }
    }

    /// Overrides the actor's default deadline for this operation.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.inner.deadline = Some(deadline);
        self
    }

    /// Attaches a caller-supplied cancellation token.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.inner.cancel = token;
        self
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn tenant(&self) -> &TenantKey {
        &self.inner.tenant
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        QueuedOperation<C, R>,
        oneshot::Receiver<Result<R, ActorError>>,
    ) {
        (self.inner, self.completion)
    }
}
