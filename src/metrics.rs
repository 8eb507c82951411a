//! Batch decode metrics.
//!
//! Uses HDR histograms for decode latency percentiles.

use crate::config::MetricsConfig;
use hdrhistogram::Histogram;
use std::time::{Duration, Instant};

/// Per-run decode metrics
#[derive(Debug)]
pub struct BatchMetrics {
    /// Decode latency histogram (milliseconds), launched jobs only
    decode_latency_ms: Option<Histogram<u64>>,

    total_jobs: u64,
    total_success: u64,
    total_failed: u64,
    total_launch_failures: u64,

    started: Instant,
}

/// Summary of key metrics for logging
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    /// P50 decode latency (milliseconds)
    pub decode_p50_ms: u64,

    /// P95 decode latency (milliseconds)
    pub decode_p95_ms: u64,

    /// Slowest decode (milliseconds)
    pub decode_max_ms: u64,

    pub total_jobs: u64,

    /// Success rate (0.0-1.0)
    pub success_rate: f64,

    /// Jobs whose tool exited unsuccessfully
    pub failed: u64,

    pub launch_failures: u64,

    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl Default for BatchMetrics {
    fn default() -> Self {
        Self::new(&MetricsConfig::default())
    }
}

impl BatchMetrics {
    pub fn new(config: &MetricsConfig) -> Self {
        let decode_latency_ms = Histogram::new_with_bounds(
            1,
            config.histogram_max_ms.max(2),
            config.histogram_precision.clamp(1, 5),
        )
        .map_err(|e| tracing::warn!("Latency histogram disabled: {}", e))
        .ok();

        Self {
            decode_latency_ms,
            total_jobs: 0,
            total_success: 0,
            total_failed: 0,
            total_launch_failures: 0,
            started: Instant::now(),
        }
    }

    /// Record a job whose tool ran to completion
    pub fn record_decode(&mut self, duration: Duration, success: bool) {
        if let Some(histogram) = self.decode_latency_ms.as_mut() {
            let ms = (duration.as_millis() as u64).max(1);
            if let Err(e) = histogram.record(ms) {
                tracing::warn!("Failed to record decode latency: {}", e);
            }
        }

        self.total_jobs += 1;
        if success {
            self.total_success += 1;
        } else {
            self.total_failed += 1;
        }
    }

    /// Record a job whose tool could not be started
    pub fn record_launch_failure(&mut self) {
        self.total_jobs += 1;
        self.total_launch_failures += 1;
    }

    pub fn summary(&self) -> MetricsSummary {
        let success_rate = if self.total_jobs > 0 {
            self.total_success as f64 / self.total_jobs as f64
        } else {
            0.0
        };

        let (decode_p50_ms, decode_p95_ms, decode_max_ms) = match &self.decode_latency_ms {
            Some(h) if !h.is_empty() => (
                h.value_at_quantile(0.5),
                h.value_at_quantile(0.95),
                h.max(),
            ),
            _ => (0, 0, 0),
        };

        MetricsSummary {
            decode_p50_ms,
            decode_p95_ms,
            decode_max_ms,
            total_jobs: self.total_jobs,
            success_rate,
            failed: self.total_failed,
            launch_failures: self.total_launch_failures,
            elapsed: self.started.elapsed(),
        }
    }

    /// Log the summary at info level
    pub fn log_summary(&self) {
        let summary = self.summary();
        tracing::info!(
            total_jobs = summary.total_jobs,
            success_rate = summary.success_rate,
            failed = summary.failed,
            launch_failures = summary.launch_failures,
            p50_ms = summary.decode_p50_ms,
            p95_ms = summary.decode_p95_ms,
            max_ms = summary.decode_max_ms,
            "Batch metrics after {}",
            crate::utils::format_elapsed(summary.elapsed)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let summary = BatchMetrics::default().summary();
        assert_eq!(summary.total_jobs, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.decode_max_ms, 0);
    }

    #[test]
    fn test_decode_recording() {
        let mut metrics = BatchMetrics::default();

        metrics.record_decode(Duration::from_millis(1500), true);
        metrics.record_decode(Duration::from_millis(2000), true);
        metrics.record_decode(Duration::from_millis(100), false);
        metrics.record_launch_failure();

        let summary = metrics.summary();
        assert_eq!(summary.total_jobs, 4);
        assert_eq!(summary.launch_failures, 1);
        assert_eq!(summary.failed, 1);
        assert!((summary.success_rate - 0.5).abs() < 0.01);
        assert!(summary.decode_max_ms >= 1990);
        assert!(summary.decode_p50_ms >= 1400 && summary.decode_p50_ms <= 1600);
    }

    #[test]
    fn test_sub_millisecond_decode_is_recorded() {
        let mut metrics = BatchMetrics::default();
        metrics.record_decode(Duration::from_micros(10), true);
        assert_eq!(metrics.summary().decode_max_ms, 1);
    }

    #[test]
    fn test_out_of_range_latency_still_counted() {
        let config = MetricsConfig {
            histogram_max_ms: 10,
            ..MetricsConfig::default()
        };
        let mut metrics = BatchMetrics::new(&config);
        metrics.record_decode(Duration::from_secs(60), true);
        assert_eq!(metrics.summary().total_jobs, 1);
    }
}
