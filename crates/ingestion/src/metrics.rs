//! Ingestion metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics
///
/// Shared by every adapter of a pipeline; updated from sensor callback threads.
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Total packets received from sources
    pub packets_received: AtomicU64,

    /// Frames converted and published
    pub frames_converted: AtomicU64,

    /// Frames rejected by the converter
    pub frames_rejected: AtomicU64,

    /// Points across all converted frames
    pub points_converted: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_converted(&self, points: usize) {
        self.frames_converted.fetch_add(1, Ordering::Relaxed);
        self.points_converted
            .fetch_add(points as u64, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            frames_converted: self.frames_converted.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            points_converted: self.points_converted.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
///
/// Overwritten frames are counted per slot, see `FrameSubscriber::overwritten`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub packets_received: u64,
    pub frames_converted: u64,
    pub frames_rejected: u64,
    pub points_converted: u64,
}
