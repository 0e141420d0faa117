use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Why an evaluation request did not produce a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    BadRequest,
    Parse,
    ConfigurationIncomplete,
    Remote,
    Internal,
}

#[derive(Default)]
pub struct Metrics {
    // Counters
    evaluations_total: AtomicUsize,
    evaluations_succeeded: AtomicUsize,
    failed_bad_request: AtomicUsize,
    failed_parse: AtomicUsize,
    failed_configuration: AtomicUsize,
    failed_remote: AtomicUsize,
    failed_internal: AtomicUsize,
    config_updates: AtomicUsize,

    // Timing (in microseconds), successful evaluations only
    total_evaluation_time_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_success(&self, duration: Duration) {
        self.evaluations_total.fetch_add(1, Ordering::Relaxed);
        self.evaluations_succeeded.fetch_add(1, Ordering::Relaxed);
        self.total_evaluation_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self, kind: FailureKind) {
        self.evaluations_total.fetch_add(1, Ordering::Relaxed);
        let counter = match kind {
            FailureKind::BadRequest => &self.failed_bad_request,
            FailureKind::Parse => &self.failed_parse,
            FailureKind::ConfigurationIncomplete => &self.failed_configuration,
            FailureKind::Remote => &self.failed_remote,
            FailureKind::Internal => &self.failed_internal,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_config_update(&self) {
        self.config_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let succeeded = self.evaluations_succeeded.load(Ordering::Relaxed);
        let total_us = self.total_evaluation_time_us.load(Ordering::Relaxed) as f64;

        MetricsSnapshot {
            evaluations_total: self.evaluations_total.load(Ordering::Relaxed),
            evaluations_succeeded: succeeded,
            failures: FailureCounts {
                bad_request: self.failed_bad_request.load(Ordering::Relaxed),
                parse: self.failed_parse.load(Ordering::Relaxed),
                configuration_incomplete: self.failed_configuration.load(Ordering::Relaxed),
                remote: self.failed_remote.load(Ordering::Relaxed),
                internal: self.failed_internal.load(Ordering::Relaxed),
            },
            avg_evaluation_time_ms: if succeeded > 0 {
                total_us / succeeded as f64 / 1000.0
            } else {
                0.0
            },
            config_updates: self.config_updates.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub evaluations_total: usize,
    pub evaluations_succeeded: usize,
    pub failures: FailureCounts,
    pub avg_evaluation_time_ms: f64,
    pub config_updates: usize,
}

#[derive(Debug, Serialize)]
pub struct FailureCounts {
    pub bad_request: usize,
    pub parse: usize,
    pub configuration_incomplete: usize,
    pub remote: usize,
    pub internal: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
