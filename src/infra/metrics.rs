//! Lock-free counters and periodic reporting
//!
//! NOTE: All atomics use Relaxed ordering intentionally; these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

#[derive(Debug)]
pub struct Metrics {
    started_at: Instant,
    polls_total: AtomicU64,
    fetch_errors: AtomicU64,
    parse_errors: AtomicU64,
    alerts_emitted: AtomicU64,
    routines_emitted: AtomicU64,
    sink_failures: AtomicU64,
    max_fetch_latency_us: AtomicU64,
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSummary {
    pub uptime_secs: u64,
    pub polls_total: u64,
    pub fetch_errors: u64,
    pub parse_errors: u64,
    pub alerts_emitted: u64,
    pub routines_emitted: u64,
    pub sink_failures: u64,
    pub max_fetch_latency_us: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            uptime_secs = %self.uptime_secs,
            polls = %self.polls_total,
            fetch_errors = %self.fetch_errors,
            parse_errors = %self.parse_errors,
            alerts = %self.alerts_emitted,
            routines = %self.routines_emitted,
            sink_failures = %self.sink_failures,
            max_fetch_latency_us = %self.max_fetch_latency_us,
            "metrics"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            polls_total: AtomicU64::new(0),
            fetch_errors: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            alerts_emitted: AtomicU64::new(0),
            routines_emitted: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            max_fetch_latency_us: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_poll(&self, fetch_latency_us: u64) {
        self.polls_total.fetch_add(1, Ordering::Relaxed);
        update_atomic_max(&self.max_fetch_latency_us, fetch_latency_us);
    }

    #[inline]
    pub fn record_fetch_error(&self) {
        self.fetch_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_alert(&self) {
        self.alerts_emitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_routine(&self) {
        self.routines_emitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters; the latency max is reset for the next window
    pub fn report(&self) -> MetricsSummary {
        MetricsSummary {
            uptime_secs: self.started_at.elapsed().as_secs(),
            polls_total: self.polls_total.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            alerts_emitted: self.alerts_emitted.load(Ordering::Relaxed),
            routines_emitted: self.routines_emitted.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            max_fetch_latency_us: self.max_fetch_latency_us.swap(0, Ordering::Relaxed),
        }
    }
}
