//! Latency statistics for sleep accuracy measurement.
//!
//! A fixed-size ring buffer keeps recent samples for percentiles,
//! so recording never allocates.

use serde::Serialize;
use std::time::Duration;

/// Latency samples with running statistics.
#[derive(Debug)]
pub struct LatencyMetrics {
    /// Ring buffer of latencies in nanoseconds.
    samples: Box<[u64]>,
    write_pos: usize,
    /// Number of valid entries (saturates at buffer size).
    sample_count: usize,
    total: u64,
    min_ns: u64,
    max_ns: u64,
    sum_ns: u64,
    /// Samples above `threshold_ns`.
    exceeded: u64,
    threshold_ns: u64,
}

impl LatencyMetrics {
    /// Create a collector retaining `capacity` samples.
    ///
    /// Samples strictly greater than `threshold` are counted as exceeded.
    #[must_use]
    pub fn new(capacity: usize, threshold: Duration) -> Self {
        Self {
            samples: vec![0u64; capacity.max(1)].into_boxed_slice(),
            write_pos: 0,
            sample_count: 0,
            total: 0,
            min_ns: u64::MAX,
            max_ns: 0,
            sum_ns: 0,
            exceeded: 0,
            threshold_ns: saturating_nanos(threshold),
        }
    }

    /// Record one latency.
    pub fn record(&mut self, latency: Duration) {
        self.record_ns(saturating_nanos(latency));
    }

    /// Record one latency in nanoseconds.
    pub fn record_ns(&mut self, ns: u64) {
        self.samples[self.write_pos] = ns;
        self.write_pos = (self.write_pos + 1) % self.samples.len();
        self.sample_count = (self.sample_count + 1).min(self.samples.len());

        self.total += 1;
        self.min_ns = self.min_ns.min(ns);
        self.max_ns = self.max_ns.max(ns);
        self.sum_ns = self.sum_ns.saturating_add(ns);

        if ns > self.threshold_ns {
            self.exceeded += 1;
        }
    }

    /// Total samples recorded, including those rotated out of the buffer.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Samples above the threshold.
    #[must_use]
    pub fn exceeded(&self) -> u64 {
        self.exceeded
    }

    /// Smallest recorded latency.
    #[must_use]
    pub fn min(&self) -> Option<Duration> {
        (self.total > 0).then(|| Duration::from_nanos(self.min_ns))
    }

    /// Largest recorded latency.
    #[must_use]
    pub fn max(&self) -> Option<Duration> {
        (self.total > 0).then(|| Duration::from_nanos(self.max_ns))
    }

    /// Mean latency.
    #[must_use]
    pub fn mean(&self) -> Option<Duration> {
        (self.total > 0).then(|| Duration::from_nanos(self.sum_ns / self.total))
    }

    /// Compute a percentile (0.0 to 100.0) over the retained samples.
    ///
    /// Returns `None` with no samples or an out-of-range percentile.
    #[must_use]
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        let sorted = self.sorted();
        percentile_of(&sorted, percentile).map(Duration::from_nanos)
    }

    /// Compute several percentiles with one sort. Invalid entries are skipped.
    #[must_use]
    pub fn percentiles(&self, percentiles: &[f64]) -> Vec<(f64, Duration)> {
        let sorted = self.sorted();
        percentiles
            .iter()
            .filter_map(|&p| percentile_of(&sorted, p).map(|ns| (p, Duration::from_nanos(ns))))
            .collect()
    }

    /// Immutable summary for reporting.
    #[must_use]
    pub fn snapshot(&self) -> LatencySnapshot {
        let any = self.total > 0;
        LatencySnapshot {
            total: self.total,
            min_ns: any.then_some(self.min_ns),
            max_ns: any.then_some(self.max_ns),
            mean_ns: any.then(|| self.sum_ns / self.total),
            exceeded: self.exceeded,
            sample_count: self.sample_count,
        }
    }

    /// Clear all samples and statistics.
    pub fn reset(&mut self) {
        self.samples.fill(0);
        self.write_pos = 0;
        self.sample_count = 0;
        self.total = 0;
        self.min_ns = u64::MAX;
        self.max_ns = 0;
        self.sum_ns = 0;
        self.exceeded = 0;
    }

    fn sorted(&self) -> Vec<u64> {
        let mut sorted = self.samples[..self.sample_count].to_vec();
        sorted.sort_unstable();
        sorted
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile_of(sorted: &[u64], percentile: f64) -> Option<u64> {
    if sorted.is_empty() || !(0.0..=100.0).contains(&percentile) {
        return None;
    }
    let idx = ((percentile / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    Some(sorted[idx.min(sorted.len() - 1)])
}

fn saturating_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Point-in-time latency summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatencySnapshot {
    /// Total samples recorded.
    pub total: u64,
    /// Minimum latency in nanoseconds.
    pub min_ns: Option<u64>,
    /// Maximum latency in nanoseconds.
    pub max_ns: Option<u64>,
    /// Mean latency in nanoseconds.
    pub mean_ns: Option<u64>,
    /// Samples above the threshold.
    pub exceeded: u64,
    /// Samples currently retained.
    pub sample_count: usize,
}

impl LatencySnapshot {
    /// Jitter (max - min) in nanoseconds.
    #[must_use]
    pub fn jitter_ns(&self) -> Option<u64> {
        match (self.min_ns, self.max_ns) {
            (Some(min), Some(max)) => Some(max - min),
            _ => None,
        }
    }
}
