//! Per-renderer counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single renderer worker
#[derive(Debug, Default)]
pub struct RendererMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Snapshots rendered successfully
    rendered_count: AtomicU64,
    /// Render failures
    failure_count: AtomicU64,
    /// Snapshots dropped because the queue was full
    dropped_count: AtomicU64,
}

impl RendererMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn rendered_count(&self) -> u64 {
        self.rendered_count.load(Ordering::Relaxed)
    }

    pub fn inc_rendered_count(&self) {
        self.rendered_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RendererMetricsSnapshot {
        RendererMetricsSnapshot {
            queue_len: self.queue_len(),
            rendered_count: self.rendered_count(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
        }
    }
}

/// Point-in-time copy of renderer metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererMetricsSnapshot {
    pub queue_len: usize,
    pub rendered_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
}
