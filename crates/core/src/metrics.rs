//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job intake and completion (counts, durations)
//! - The scheduler queue and worker pool
//! - The rendering engine and store retries

use once_cell::sync::Lazy;
use prometheus::{
    core::Collector, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    Opts,
};

/// Jobs accepted at intake.
pub static JOBS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("slidepress_jobs_submitted_total", "Total jobs submitted").unwrap()
});

/// Jobs reaching a terminal state, by result.
pub static JOBS_COMPLETED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "slidepress_jobs_completed_total",
            "Total jobs reaching a terminal state",
        ),
        &["result"], // "succeeded", "failed"
    )
    .unwrap()
});

/// End-to-end job duration from pickup to terminal state.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "slidepress_job_duration_seconds",
            "Job duration from worker pickup to terminal state",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["result"],
    )
    .unwrap()
});

/// Rendering engine duration.
pub static RENDER_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "slidepress_render_duration_seconds",
            "Duration of the external rendering step",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 180.0]),
    )
    .unwrap()
});

/// Pages produced per successful job.
pub static PAGES_RENDERED: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "slidepress_pages_rendered",
            "Pages produced per successful job",
        )
        .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
    )
    .unwrap()
});

/// Store retries by operation.
pub static STORE_RETRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "slidepress_store_retries_total",
            "Transient store errors that triggered a retry",
        ),
        &["op"], // "head", "get", "put"
    )
    .unwrap()
});

/// Jobs waiting in the intake queue.
pub static QUEUE_DEPTH: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "slidepress_queue_depth",
        "Jobs waiting in the intake queue",
    )
    .unwrap()
});

/// Jobs currently executing.
pub static JOBS_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("slidepress_jobs_running", "Jobs currently executing").unwrap()
});

/// All core metrics, for registration in the server's registry.
pub fn all_metrics() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_COMPLETED.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(RENDER_DURATION.clone()),
        Box::new(PAGES_RENDERED.clone()),
        Box::new(STORE_RETRIES.clone()),
        Box::new(QUEUE_DEPTH.clone()),
        Box::new(JOBS_RUNNING.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_registrable() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
    }
}
