//! Backpressure configuration and intake metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Backpressure configuration
///
/// The intake channel is bounded and drops the newest packet when full:
/// staleness stays bounded by the channel capacity instead of growing a
/// queue.
#[derive(Debug, Clone)]
pub struct BackpressureConfig {
    /// Intake channel capacity
    pub channel_capacity: usize,
}

impl Default for BackpressureConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 100,
        }
    }
}

impl BackpressureConfig {
    pub fn new(channel_capacity: usize) -> Self {
        Self { channel_capacity }
    }
}

/// Intake metrics, shared across all adapters of a pipeline
#[derive(Debug, Default)]
pub struct IntakeMetrics {
    /// Total packets delivered by sources
    pub packets_received: AtomicU64,

    /// Total packets dropped on a full channel
    pub packets_dropped: AtomicU64,

    /// Current queue length
    pub queue_len: AtomicUsize,
}

impl IntakeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.packets_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> IntakeSnapshot {
        IntakeSnapshot {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            packets_dropped: self.packets_dropped.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the intake metrics
#[derive(Debug, Clone, Default)]
pub struct IntakeSnapshot {
    pub packets_received: u64,
    pub packets_dropped: u64,
    pub queue_len: usize,
}
