//! Inference latency and failure tracking.

use std::time::Duration;
use tracing::info;

/// Latency window kept in memory; the oldest half is dropped when exceeded.
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Metrics collector for forward passes run by a single loader
#[derive(Debug, Default)]
pub struct InferenceMetrics {
    /// Successful inference calls
    successes: u64,
    /// Inference calls rejected before load
    unloaded: u64,
    /// Forward passes that raised a runtime error
    failures: u64,
    /// Forward-pass latencies (in microseconds)
    latencies_us: Vec<u64>,
}

/// Latency percentiles over the recorded window
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl InferenceMetrics {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful forward pass
    pub fn record_success(&mut self, latency: Duration) {
        self.successes += 1;
        self.latencies_us.push(latency.as_micros() as u64);
        if self.latencies_us.len() > MAX_LATENCY_SAMPLES {
            self.latencies_us.drain(0..MAX_LATENCY_SAMPLES / 2);
        }
    }

    /// Record a forward pass that failed inside the runtime
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Record an inference call made before any model was loaded
    pub fn record_unloaded(&mut self) {
        self.unloaded += 1;
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn unloaded(&self) -> u64 {
        self.unloaded
    }

    /// Get latency statistics over the retained window
    pub fn latency_stats(&self) -> LatencyStats {
        if self.latencies_us.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = self.latencies_us.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Log summary statistics
    pub fn log_summary(&self) {
        let stats = self.latency_stats();
        let total = self.successes + self.failures;
        let failure_rate = if total > 0 {
            (self.failures as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        info!(
            successes = self.successes,
            failures = self.failures,
            unloaded = self.unloaded,
            failure_rate = format!("{:.2}%", failure_rate),
            "Inference summary"
        );
        info!(
            samples = stats.count,
            mean_us = stats.mean_us,
            p50_us = stats.p50_us,
            p95_us = stats.p95_us,
            p99_us = stats.p99_us,
            max_us = stats.max_us,
            "Inference latency"
        );
    }
}
