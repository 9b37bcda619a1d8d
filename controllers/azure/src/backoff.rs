//! # Fibonacci Backoff
//!
//! Requeue delays for resources whose reconciliation keeps failing.
//! The sequence grows more slowly than exponential backoff, so a resource
//! blocked on Azure (quota, missing permissions, a dependency still being
//! created) is retried often at first without hammering ARM later on.
//!
//! Sequence in minutes: 1, 1, 2, 3, 5, 8, 10 (max).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

/// Fibonacci backoff calculator, in whole minutes
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_minutes: u64,
    prev_minutes: u64,
    current_minutes: u64,
    max_minutes: u64,
}

impl FibonacciBackoff {
    /// Create a backoff starting at `min_minutes` and capped at `max_minutes`
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            prev_minutes: 0,
            current_minutes: min_minutes,
            max_minutes,
        }
    }

    /// Return the current delay and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let delay = Duration::from_secs(self.current_minutes * 60);

        let next_minutes = self.prev_minutes + self.current_minutes;
        self.prev_minutes = self.current_minutes;
        self.current_minutes = next_minutes.min(self.max_minutes);

        delay
    }

    /// Restart the sequence from the minimum
    pub fn reset(&mut self) {
        self.prev_minutes = 0;
        self.current_minutes = self.min_minutes;
    }
}

/// Per-resource backoff state, keyed by `kind/name`
#[derive(Debug)]
pub struct BackoffTracker {
    states: Mutex<HashMap<String, FibonacciBackoff>>,
    min_minutes: u64,
    max_minutes: u64,
}

impl Default for BackoffTracker {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

impl BackoffTracker {
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            min_minutes,
            max_minutes,
        }
    }

    /// Delay before the next retry of a failing resource
    pub fn next_for(&self, key: &str) -> Duration {
        match self.states.lock() {
            Ok(mut states) => states
                .entry(key.to_string())
                .or_insert_with(|| FibonacciBackoff::new(self.min_minutes, self.max_minutes))
                .next_backoff(),
            Err(e) => {
                warn!("Failed to lock backoff states: {}, using minimum backoff", e);
                Duration::from_secs(self.min_minutes * 60)
            }
        }
    }

    /// Forget the failures of a resource after a successful reconciliation
    pub fn reset(&self, key: &str) {
        if let Ok(mut states) = self.states.lock() {
            states.remove(key);
        }
    }
}
