//! Actor tuning knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration shared by every actor a pool creates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Maximum number of queued operations before submitters suspend.
    pub queue_capacity: usize,
    /// Deadline applied to operations that do not carry their own.
    pub default_deadline: Duration,
    /// How long `shutdown` waits for the worker before giving up.
    pub shutdown_grace: Duration,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            default_deadline: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

impl ActorConfig {
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = deadline;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}
