//! Request and polling counters for a client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics collector shared by clones of one client.
#[derive(Debug, Default)]
pub struct ClientMetrics {
    /// Physical HTTP requests sent
    pub requests_total: AtomicU64,
    /// Requests re-issued after a retryable response
    pub retries_total: AtomicU64,
    /// Responses with a terminal (non-retryable) error status
    pub terminal_errors: AtomicU64,
    /// Refreshes issued by the convergence poller
    pub poll_refreshes: AtomicU64,
}

impl ClientMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_requests(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_retries(&self) {
        self.retries_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_terminal_errors(&self) {
        self.terminal_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_poll_refreshes(&self) {
        self.poll_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            retries_total: self.retries_total.load(Ordering::Relaxed),
            terminal_errors: self.terminal_errors.load(Ordering::Relaxed),
            poll_refreshes: self.poll_refreshes.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub retries_total: u64,
    pub terminal_errors: u64,
    pub poll_refreshes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = ClientMetrics::new();
        metrics.inc_requests();
        metrics.inc_requests();
        metrics.inc_retries();
        metrics.inc_poll_refreshes();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.retries_total, 1);
        assert_eq!(snapshot.terminal_errors, 0);
        assert_eq!(snapshot.poll_refreshes, 1);
    }
}
