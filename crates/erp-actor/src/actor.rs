//! # Serializing ERP Actor
//!
//! This module defines the `ErpActor`, the per-tenant guard in front of an
//! ERP backend that is not safe for concurrent use. It implements the
//! "server" side of the actor model: a bounded queue of type-erased
//! operations drained by one dedicated worker task.
//!
//! # Concurrency Model
//! Even with hundreds of `ErpActor` instances running, each one processes
//! its queue *sequentially* in its own task. The connection handle is moved
//! into the worker at initialization and never leaves it, so no `Mutex` is
//! needed around the connection; the actor model gives exclusive access
//! through ownership.
//!
//! Producers suspend only when the bounded queue is full (backpressure);
//! the worker suspends when the queue is empty. An operation that suspends
//! on I/O inside its closure keeps the actor busy; serialization is per
//! operation, not per poll.
//!
//! # Lifecycle
//! `Created` → (first `initialize`) → `Initializing` → `Ready`;
//! `Ready` → (`shutdown`) → `ShuttingDown` → `Disposed`. No transition
//! leaves `Disposed`. Submissions during or after shutdown are rejected.

use crate::config::ActorConfig;
use crate::connector::ErpConnector;
use crate::error::ActorError;
use crate::operation::{ErpOperation, Operation, WorkFuture};
use crate::tenant::TenantKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex, OnceCell};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Lifecycle phase of an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Lifecycle {
    Created = 0,
    Initializing = 1,
    Ready = 2,
    ShuttingDown = 3,
    Disposed = 4,
}

impl Lifecycle {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Created,
            1 => Self::Initializing,
            2 => Self::Ready,
            3 => Self::ShuttingDown,
            _ => Self::Disposed,
        }
    }
}

/// Point-in-time health snapshot of one actor.
#[derive(Clone, Debug, Serialize)]
pub struct ActorStats {
    pub tenant: TenantKey,
    pub state: Lifecycle,
    pub queued: usize,
    pub processed: u64,
    pub failed: u64,
    pub is_ready: bool,
}

impl fmt::Display for ActorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:?}, {} queued, {} processed, {} failed",
            self.tenant, self.state, self.queued, self.processed, self.failed
        )
    }
}

/// Per-tenant actor serializing all access to one ERP connection.
///
/// Created by [`crate::ErpActorPool`], or directly in tests. The worker task
/// is spawned at construction and waits for the connection established by
/// [`ErpActor::initialize`]; operations submitted before that wait in the
/// queue.
pub struct ErpActor<C> {
    tenant: TenantKey,
    config: ActorConfig,
    queue: mpsc::Sender<Box<dyn Operation<C>>>,
    connection_slot: Mutex<Option<oneshot::Sender<C>>>,
    init: OnceCell<()>,
    state: AtomicU8,
    processed: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
    crashed: Arc<AtomicBool>,
    shutdown_signal: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Send + 'static> ErpActor<C> {
    /// Creates the actor and spawns its worker task.
    pub fn new(tenant: TenantKey, config: ActorConfig) -> Self {
        let (queue, receiver) = mpsc::channel(config.queue_capacity);
        let (connection_tx, connection_rx) = oneshot::channel();
        let shutdown_signal = CancellationToken::new();
        let processed = Arc::new(AtomicU64::new(0));
        let failed = Arc::new(AtomicU64::new(0));
        let crashed = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            tenant: tenant.clone(),
            receiver,
            connection: connection_rx,
            shutdown: shutdown_signal.clone(),
            default_deadline: config.default_deadline,
            processed: processed.clone(),
            failed: failed.clone(),
            crashed: crashed.clone(),
        };
        let handle = tokio::spawn(worker.run());

        info!(tenant = %tenant, capacity = config.queue_capacity, "Actor created");

        Self {
            tenant,
            config,
            queue,
            connection_slot: Mutex::new(Some(connection_tx)),
            init: OnceCell::new(),
            state: AtomicU8::new(Lifecycle::Created as u8),
            processed,
            failed,
            crashed,
            shutdown_signal,
            worker: Mutex::new(Some(handle)),
        }
    }

    pub fn tenant(&self) -> &TenantKey {
        &self.tenant
    }

    pub fn state(&self) -> Lifecycle {
        Lifecycle::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Queued-operation estimate.
    pub fn queued_count(&self) -> usize {
        self.queue.max_capacity() - self.queue.capacity()
    }

    pub fn processed_count(&self) -> u64 {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        self.state() == Lifecycle::Ready && !self.has_crashed()
    }

    /// True once the worker has died outside the normal shutdown path.
    pub fn has_crashed(&self) -> bool {
        self.crashed.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> ActorStats {
        ActorStats {
            tenant: self.tenant.clone(),
            state: self.state(),
            queued: self.queued_count(),
            processed: self.processed_count(),
            failed: self.failed_count(),
            is_ready: self.is_ready(),
        }
    }

    /// Establishes the ERP connection, exactly once.
    ///
    /// The first caller's connector runs under the initialization guard;
    /// concurrent and later callers observe the initialized state without
    /// re-running it. A failed attempt leaves the actor un-initialized and
    /// is retryable.
    pub async fn initialize(&self, connector: &dyn ErpConnector<C>) -> Result<(), ActorError> {
        match self.state() {
            Lifecycle::Ready => return Ok(()),
            Lifecycle::ShuttingDown => return Err(ActorError::ShuttingDown),
            Lifecycle::Disposed => return Err(ActorError::Disposed),
            Lifecycle::Created | Lifecycle::Initializing => {}
        }

        self.init
            .get_or_try_init(|| async {
                self.transition(Lifecycle::Created, Lifecycle::Initializing);
                debug!(tenant = %self.tenant, "Initializing connection");

                let conn = match connector.connect(&self.tenant).await {
                    Ok(conn) => conn,
                    Err(err) => {
                        self.transition(Lifecycle::Initializing, Lifecycle::Created);
                        warn!(tenant = %self.tenant, error = %err, "Initialization failed");
                        return Err(ActorError::InitFailed(err));
                    }
                };

                let slot = self.connection_slot.lock().await.take();
                match slot {
                    Some(sender) => {
                        if sender.send(conn).is_err() {
                            return Err(ActorError::WorkerCrashed);
                        }
                        self.transition(Lifecycle::Initializing, Lifecycle::Ready);
                        info!(tenant = %self.tenant, "Connection initialized");
                        Ok(())
                    }
                    None => Err(ActorError::WorkerCrashed),
                }
            })
            .await
            .map(|_| ())
    }

    /// Enqueues an operation and awaits its result.
    ///
    /// Fails immediately with [`ActorError::TenantMismatch`] if the
    /// operation carries a different tenant key, and with
    /// [`ActorError::ShuttingDown`] / [`ActorError::Disposed`] once shutdown
    /// has begun; neither reaches the queue. If the queue is at capacity the
    /// caller suspends until space frees or the actor is disposed.
    ///
    /// Accepted operations are executed strictly in dequeue order, one at a
    /// time, to completion, timeout or error.
    pub async fn submit<R: Send + 'static>(
        &self,
        operation: ErpOperation<C, R>,
    ) -> Result<R, ActorError> {
        match self.state() {
            Lifecycle::ShuttingDown => return Err(ActorError::ShuttingDown),
            Lifecycle::Disposed => return Err(ActorError::Disposed),
            _ => {}
        }
        if operation.tenant() != &self.tenant {
            return Err(ActorError::TenantMismatch {
                operation: operation.tenant().clone(),
                actor: self.tenant.clone(),
            });
        }

        let (queued, completion) = operation.into_parts();
        let id = queued.id();

        self.queue
            .send(Box::new(queued))
            .await
            .map_err(|_| self.rejection())?;
        debug!(tenant = %self.tenant, operation = %id, "Enqueued");

        match completion.await {
            Ok(result) => result,
            // The worker dropped the slot without resolving it: it is either
            // unwinding or already gone.
            Err(_) => Err(self.rejection()),
        }
    }

    /// Builds an operation from a work closure and submits it.
    pub async fn execute<R, F>(&self, work: F) -> Result<R, ActorError>
    where
        R: Send + 'static,
        F: for<'c> FnOnce(&'c mut C, CancellationToken) -> WorkFuture<'c, R> + Send + 'static,
    {
        self.submit(ErpOperation::new(self.tenant.clone(), work))
            .await
    }

    /// [`ErpActor::execute`] with an explicit deadline and cancellation
    /// token.
    pub async fn execute_with<R, F>(
        &self,
        work: F,
        deadline: Option<Duration>,
        cancel: Option<CancellationToken>,
    ) -> Result<R, ActorError>
    where
        R: Send + 'static,
        F: for<'c> FnOnce(&'c mut C, CancellationToken) -> WorkFuture<'c, R> + Send + 'static,
    {
        let mut operation = ErpOperation::new(self.tenant.clone(), work);
        if let Some(deadline) = deadline {
            operation = operation.with_deadline(deadline);
        }
        if let Some(token) = cancel {
            operation = operation.with_cancel_token(token);
        }
        self.submit(operation).await
    }

    /// Stops accepting submissions and signals the worker.
    ///
    /// Idempotent. The in-flight operation runs to its own completion or
    /// deadline; operations still queued are resolved with
    /// [`ActorError::ShuttingDown`]. Waits up to the configured grace period
    /// for the worker, then proceeds regardless.
    pub async fn shutdown(&self) {
        if !self.begin_shutdown() {
            return;
        }

        info!(
            tenant = %self.tenant,
            processed = self.processed_count(),
            failed = self.failed_count(),
            "Disposing actor"
        );

        self.shutdown_signal.cancel();

        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            if tokio::time::timeout(self.config.shutdown_grace, handle)
                .await
                .is_err()
            {
                warn!(tenant = %self.tenant, "Worker did not stop within the grace period");
            }
        }

        self.state.store(Lifecycle::Disposed as u8, Ordering::SeqCst);
        info!(tenant = %self.tenant, "Actor disposed");
    }

    fn begin_shutdown(&self) -> bool {
        loop {
            let current = self.state();
            match current {
                Lifecycle::ShuttingDown | Lifecycle::Disposed => return false,
                _ => {
                    if self.transition(current, Lifecycle::ShuttingDown) {
                        return true;
                    }
                }
            }
        }
    }

    fn transition(&self, from: Lifecycle, to: Lifecycle) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn rejection(&self) -> ActorError {
        if self.has_crashed() {
            ActorError::WorkerCrashed
        } else if self.state() == Lifecycle::Disposed {
            ActorError::Disposed
        } else {
            ActorError::ShuttingDown
        }
    }
}

impl<C: Send + 'static> fmt::Debug for ErpActor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErpActor")
            .field("tenant", &self.tenant)
            .field("state", &self.state())
            .field("queued", &self.queued_count())
            .field("processed", &self.processed_count())
            .field("failed", &self.failed_count())
            .finish()
    }
}

/// The consumer half: owns the queue receiver and, once initialized, the
/// connection handle. Nothing outside `run` ever touches either.
struct Worker<C> {
    tenant: TenantKey,
    receiver: mpsc::Receiver<Box<dyn Operation<C>>>,
    connection: oneshot::Receiver<C>,
    shutdown: CancellationToken,
    default_deadline: Duration,
    processed: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
    crashed: Arc<AtomicBool>,
}

impl<C: Send + 'static> Worker<C> {
    async fn run(mut self) {
        info!(tenant = %self.tenant, "Worker started");
        let guard = CrashGuard {
            tenant: self.tenant.clone(),
            crashed: self.crashed.clone(),
            armed: true,
        };

        if let Some(mut conn) = self.wait_for_connection().await {
            loop {
                let op = tokio::select! {
                    biased;
                    _ = self.shutdown.cancelled() => break,
                    op = self.receiver.recv() => match op {
                        Some(op) => op,
                        None => break,
                    },
                };
                self.process(op, &mut conn).await;
            }
        }

        self.drain();
        guard.disarm();
        info!(tenant = %self.tenant, "Worker stopped");
    }

    async fn wait_for_connection(&mut self) -> Option<C> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => None,
            conn = &mut self.connection => conn.ok(),
        }
    }

    async fn process(&self, mut op: Box<dyn Operation<C>>, conn: &mut C) {
        let id = op.id();
        debug!(tenant = %self.tenant, operation = %id, "Started");
        let started = Instant::now();

        let status = op.execute(conn, self.default_deadline).await;
        let duration = started.elapsed();

        // Counters move before the completion slot resolves: a caller that
        // observes completion must never see stale counters.
        if status.is_success() {
            self.processed.fetch_add(1, Ordering::SeqCst);
            debug!(
                tenant = %self.tenant,
                operation = %id,
                duration_ms = duration.as_millis() as u64,
                "Completed"
            );
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
            warn!(
                tenant = %self.tenant,
                operation = %id,
                cause = status.cause(),
                duration_ms = duration.as_millis() as u64,
                "Failed"
            );
        }

        op.finish();
    }

    /// Fail-fast shutdown: resolve everything still queued instead of
    /// executing it.
    fn drain(&mut self) {
        self.receiver.close();
        while let Ok(op) = self.receiver.try_recv() {
            self.failed.fetch_add(1, Ordering::SeqCst);
            debug!(tenant = %self.tenant, operation = %op.id(), "Rejected on shutdown");
            op.reject(ActorError::ShuttingDown);
        }
    }
}

/// Flags the actor as crashed if the worker unwinds without reaching its
/// normal exit path.
struct CrashGuard {
    tenant: TenantKey,
    crashed: Arc<AtomicBool>,
    armed: bool,
}

impl CrashGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CrashGuard {
    fn drop(&mut self) {
        if self.armed {
            self.crashed.store(true, Ordering::SeqCst);
            error!(tenant = %self.tenant, "Worker crashed");
        }
    }
}
