//! Metrics collection using Prometheus
//!
//! Counts committed rating updates, failures by kind and commit conflicts,
//! and times the persistence step.

use crate::config::RatingMethodKind;
use crate::error::RatingError;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Metrics collector for the rating engine
#[derive(Clone)]
pub struct RatingMetrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Committed match updates by method and outcome
    pub updates_total: IntCounterVec,

    /// Failed match updates by error kind
    pub failures_total: IntCounterVec,

    /// Commits rejected because a concurrent update won
    pub commit_conflicts_total: IntCounter,

    /// Time spent in the persistence commit
    pub commit_duration: Histogram,
}

impl RatingMetrics {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let updates_total = IntCounterVec::new(
            Opts::new(
                "rating_updates_total",
                "Total match rating updates committed",
            ),
            &["method", "outcome"],
        )?;
        registry.register(Box::new(updates_total.clone()))?;

        let failures_total = IntCounterVec::new(
            Opts::new(
                "rating_update_failures_total",
                "Total match rating updates that failed",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(failures_total.clone()))?;

        let commit_conflicts_total = IntCounter::new(
            "rating_commit_conflicts_total",
            "Commits rejected by a concurrent update",
        )?;
        registry.register(Box::new(commit_conflicts_total.clone()))?;

        let commit_duration = Histogram::with_opts(
            HistogramOpts::new(
                "rating_commit_duration_seconds",
                "Time spent committing a rating batch",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(commit_duration.clone()))?;

        Ok(Self {
            registry,
            updates_total,
            failures_total,
            commit_conflicts_total,
            commit_duration,
        })
    }

    /// Record a committed update
    pub fn record_update(&self, method: RatingMethodKind, is_draw: bool, commit_time: Duration) {
        let outcome = if is_draw { "draw" } else { "decisive" };
        self.updates_total
            .with_label_values(&[method.as_str(), outcome])
            .inc();
        self.commit_duration.observe(commit_time.as_secs_f64());
    }

    /// Record a failed update
    pub fn record_failure(&self, error: &RatingError) {
        self.failures_total
            .with_label_values(&[error.kind()])
            .inc();
    }

    /// Record a commit that lost a version race
    pub fn record_conflict(&self) {
        self.commit_conflicts_total.inc();
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
