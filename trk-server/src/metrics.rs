//! # Server Metrics
//!
//! Lightweight counters and a latency histogram for the command server:
//! request volume, failure envelopes, discarded frames, session counts and
//! dispatch latency.
//!
//! ## Design Principles
//! 1. **Accumulator Pattern**: Atomic counters aggregate events cheaply from
//!    every session task without locks.
//! 2. **Fixed Buckets**: Histogram buckets live in a contiguous array.
//! 3. **Plain Snapshots**: Readers get owned structs, never live atomics.
//!
//! ## Notes
//! - Bucket boundaries are microseconds. Dispatch latency is dominated by
//!   store round trips, so the buckets reach into the seconds range.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default latency bucket boundaries in microseconds.
pub const DEFAULT_LATENCY_BUCKETS_US: [u64; 12] = [
    50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000,
];

/// Snapshot of all server metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Requests dispatched (one per framed message that parsed as JSON).
    pub requests_total: u64,
    /// Responses with `success == false`.
    pub failures_total: u64,
    /// Frames dropped by the accumulator or the JSON parser.
    pub frames_discarded: u64,
    /// Sessions accepted since start.
    pub sessions_total: u64,
    /// Sessions currently open.
    pub sessions_active: u64,
    /// Latency histogram snapshot.
    pub latency: LatencySnapshot,
}

/// Snapshot of the latency histogram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencySnapshot {
    /// Bucket boundaries in microseconds.
    pub bounds_us: Vec<u64>,
    /// Bucket counts, including the overflow bucket at the end.
    pub buckets: Vec<u64>,
    /// Total number of samples.
    pub samples: u64,
    /// Sum of latencies in microseconds.
    pub sum_us: u64,
}

/// Thread-safe metrics aggregator shared by all sessions.
///
/// `Ordering::Relaxed` is enough: no reader relies on cross-field ordering.
pub struct Metrics {
    requests_total: AtomicU64,
    failures_total: AtomicU64,
    frames_discarded: AtomicU64,
    sessions_total: AtomicU64,
    sessions_active: AtomicU64,
    latency: LatencyHistogram,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Creates a new metrics aggregator with the default latency buckets.
    pub fn new() -> Self {
        Self::with_latency_buckets(DEFAULT_LATENCY_BUCKETS_US.to_vec())
    }

    /// Creates a new metrics aggregator with custom latency bucket boundaries.
    ///
    /// The boundaries must be sorted ascending and represent microseconds.
    pub fn with_latency_buckets(bounds_us: Vec<u64>) -> Self {
        Metrics {
            requests_total: AtomicU64::new(0),
            failures_total: AtomicU64::new(0),
            frames_discarded: AtomicU64::new(0),
            sessions_total: AtomicU64::new(0),
            sessions_active: AtomicU64::new(0),
            latency: LatencyHistogram::new(bounds_us),
        }
    }

    /// Records a completed dispatch and whether its envelope was a failure.
    pub fn record_request(&self, latency: Duration, success: bool) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failures_total.fetch_add(1, Ordering::Relaxed);
        }
        self.latency.record(latency);
    }

    /// Records a frame that was dropped without a response.
    pub fn record_discard(&self) {
        self.frames_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a newly accepted session.
    pub fn session_opened(&self) {
        self.sessions_total.fetch_add(1, Ordering::Relaxed);
        self.sessions_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a session ending, however it ended.
    pub fn session_closed(&self) {
        self.sessions_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of all counters and histogram buckets.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            failures_total: self.failures_total.load(Ordering::Relaxed),
            frames_discarded: self.frames_discarded.load(Ordering::Relaxed),
            sessions_total: self.sessions_total.load(Ordering::Relaxed),
            sessions_active: self.sessions_active.load(Ordering::Relaxed),
            latency: self.latency.snapshot(),
        }
    }
}

/// Fixed-bucket latency histogram.
///
/// Uses a linear scan to pick buckets; the list is short.
pub struct LatencyHistogram {
    bounds_us: Vec<u64>,
    buckets: Vec<AtomicU64>,
    sum_us: AtomicU64,
    samples: AtomicU64,
}

impl LatencyHistogram {
    /// Creates a histogram with explicit bucket boundaries (microseconds).
    pub fn new(bounds_us: Vec<u64>) -> Self {
        let buckets = (0..=bounds_us.len()).map(|_| AtomicU64::new(0)).collect();

        LatencyHistogram {
            bounds_us,
            buckets,
            sum_us: AtomicU64::new(0),
            samples: AtomicU64::new(0),
        }
    }

    /// Records a latency measurement into the histogram.
    pub fn record(&self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.samples.fetch_add(1, Ordering::Relaxed);
        self.sum_us.fetch_add(micros, Ordering::Relaxed);

        let bucket_idx = self
            .bounds_us
            .iter()
            .position(|&bound| micros <= bound)
            .unwrap_or(self.bounds_us.len());
        if let Some(bucket) = self.buckets.get(bucket_idx) {
            bucket.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Returns a point-in-time snapshot of the histogram.
    pub fn snapshot(&self) -> LatencySnapshot {
        let buckets: Vec<u64> = self
            .buckets
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect();

        LatencySnapshot {
            bounds_us: self.bounds_us.clone(),
            buckets,
            samples: self.samples.load(Ordering::Relaxed),
            sum_us: self.sum_us.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_requests_and_failures() {
        let metrics = Metrics::new();
        metrics.record_request(Duration::from_micros(10), true);
        metrics.record_request(Duration::from_micros(10), false);
        metrics.record_discard();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.failures_total, 1);
        assert_eq!(snapshot.frames_discarded, 1);
        assert_eq!(snapshot.latency.samples, 2);
    }

    #[test]
    fn tracks_active_sessions() {
        let metrics = Metrics::new();
        metrics.session_opened();
        metrics.session_opened();
        metrics.session_closed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sessions_total, 2);
        assert_eq!(snapshot.sessions_active, 1);
    }

    #[test]
    fn overflow_lands_in_last_bucket() {
        let histogram = LatencyHistogram::new(vec![10, 100]);
        histogram.record(Duration::from_micros(5));
        histogram.record(Duration::from_micros(50));
        histogram.record(Duration::from_secs(1));

        let snapshot = histogram.snapshot();
        assert_eq!(snapshot.buckets, vec![1, 1, 1]);
        assert_eq!(snapshot.sum_us, 1_000_055);
    }
}
