//! Metrics for the rating engine
//!
//! Prometheus counters and histograms describing committed and failed
//! rating updates.

pub mod collector;

pub use collector::RatingMetrics;
