//! # Mock Backend & Testing Support
//!
//! In-memory stand-ins for the ERP seam, so actor and pool behavior can be
//! tested deterministically without a real backend:
//!
//! - [`MockConnection`]: records every call and watches for overlapping
//!   use, which the actor must make impossible.
//! - [`MockConnector`]: counts connection attempts and can be scripted to
//!   fail the first N of them, for initialization-retry tests.
//!
//! The overlap probe is the interesting part: each connection flips an
//! `in_use` flag for the duration of a call. If two operations ever touch
//! the same connection concurrently, the flag is already set on entry and
//! the probe latches `overlap`. A passing test proves mutual exclusion held
//! across the whole run, not just that results looked right.

use crate::connector::ErpConnector;
use crate::error::BoxError;
use crate::tenant::TenantKey;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct ConnectionProbe {
    in_use: Arc<AtomicBool>,
    overlap: Arc<AtomicBool>,
}

/// Fake exclusive ERP connection handed to work closures in tests.
pub struct MockConnection {
    tenant: TenantKey,
    calls: Arc<Mutex<Vec<String>>>,
    probe: ConnectionProbe,
}

impl MockConnection {
    pub fn tenant(&self) -> &TenantKey {
        &self.tenant
    }

    /// Simulates a backend call that takes `latency` and returns its name.
    ///
    /// The `in_use` flag is released on drop, so a call aborted by timeout
    /// or cancellation does not leave the probe latched.
    pub async fn call(&mut self, name: &str, latency: Duration) -> String {
        struct InUse(Arc<AtomicBool>);
        impl Drop for InUse {
            fn drop(&mut self) {
                self.0.store(false, Ordering::SeqCst);
            }
        }

        if self.probe.in_use.swap(true, Ordering::SeqCst) {
            self.probe.overlap.store(true, Ordering::SeqCst);
        }
        let _in_use = InUse(self.probe.in_use.clone());

        tokio::time::sleep(latency).await;
        lock(&self.calls).push(format!("{}:{}", self.tenant, name));
        name.to_string()
    }
}

/// Scripted connector for tests.
#[derive(Default)]
pub struct MockConnector {
    connects: AtomicUsize,
    fail_remaining: AtomicUsize,
    calls: Arc<Mutex<Vec<String>>>,
    probes: Mutex<HashMap<TenantKey, ConnectionProbe>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector whose first `failures` attempts return an error.
    pub fn failing_first(failures: usize) -> Self {
        let connector = Self::default();
        connector.fail_remaining.store(failures, Ordering::SeqCst);
        connector
    }

    /// Number of connection attempts, including failed ones.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Every backend call made so far, as `tenant:name`, in execution order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// True if any connection was ever used by two operations concurrently.
    pub fn overlap_detected(&self) -> bool {
        lock(&self.probes)
            .values()
            .any(|probe| probe.overlap.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl ErpConnector<MockConnection> for MockConnector {
    async fn connect(&self, tenant: &TenantKey) -> Result<MockConnection, BoxError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err("scripted connection failure".into());
        }

        let probe = ConnectionProbe::default();
        lock(&self.probes).insert(tenant.clone(), probe.clone());
        Ok(MockConnection {
            tenant: tenant.clone(),
            calls: self.calls.clone(),
            probe,
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
