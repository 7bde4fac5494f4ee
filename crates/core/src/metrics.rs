//! Metrics definitions for the search service.
//!
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "book_searches_total",
        "Total number of book searches, labelled by outcome"
    );
    describe_histogram!(
        "book_search_duration_seconds",
        "Time taken to serve a book search in seconds"
    );
}

/// Record a completed search.
///
/// # Arguments
/// * `outcome` - `"ok"` or the error code of the failure
pub fn record_search(outcome: &'static str) {
    counter!("book_searches_total", "outcome" => outcome).increment(1);
}

/// Record search duration.
pub fn record_search_duration(duration_secs: f64) {
    histogram!("book_search_duration_seconds").record(duration_secs);
}

/// A timer that records search duration when dropped.
pub struct SearchTimer {
    start: Instant,
}

impl SearchTimer {
    /// Start a new search timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SearchTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SearchTimer {
    fn drop(&mut self) {
        record_search_duration(self.start.elapsed().as_secs_f64());
    }
}
