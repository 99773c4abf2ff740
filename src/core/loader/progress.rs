//! Progress reporting interface.
//!
//! The pipeline only talks to [`ProgressSink`]; renderers (terminal
//! bars, log lines, UI widgets) live on the caller's side. A
//! [`NoopProgress`] sink is always a valid substitute.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Consumer of progress events
///
/// Called from the coordinating thread only, but must be shareable
/// so callers can observe it from elsewhere.
pub trait ProgressSink: Send + Sync {
    /// Reset the expected number of units and the position
    fn set_total(&self, total: u64);

    /// Mark `n` more units as done
    fn advance(&self, n: u64);

    /// Describe the current phase
    fn set_message(&self, message: &str);
}

/// Sink that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn set_total(&self, _total: u64) {}

    fn advance(&self, _n: u64) {}

    fn set_message(&self, _message: &str) {}
}

/// Sink that logs through `tracing` every `every` units
#[derive(Debug)]
pub struct TracingProgress {
    every: u64,
    total: AtomicU64,
    position: AtomicU64,
    message: Mutex<String>,
}

impl Default for TracingProgress {
    fn default() -> Self {
        Self::new(100)
    }
}

impl TracingProgress {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            total: AtomicU64::new(0),
            position: AtomicU64::new(0),
            message: Mutex::new(String::new()),
        }
    }

    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl ProgressSink for TracingProgress {
    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.position.store(0, Ordering::Relaxed);
    }

    fn advance(&self, n: u64) {
        let before = self.position.fetch_add(n, Ordering::Relaxed);
        let after = before + n;
        let total = self.total();

        let crossed_step = after / self.every > before / self.every;
        let finished = total > 0 && before < total && after >= total;
        if crossed_step || finished {
            let message = self.message.lock();
            tracing::info!("Progress: {}/{} {}", after, total, message.as_str());
        }
    }

    fn set_message(&self, message: &str) {
        tracing::info!("{}", message);
        *self.message.lock() = message.to_string();
    }
}
