//! Metrics definitions for the indexer.
//!
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`. Without an installed
//! recorder every call here is a no-op.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

use crate::models::EntityKind;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "blocks_indexed_total",
        "Total number of blocks fully linked"
    );
    describe_counter!(
        "entities_linked_total",
        "Total number of entities inserted, by kind"
    );
    describe_counter!(
        "link_errors_total",
        "Total number of fatal linking errors, by kind"
    );
    describe_histogram!(
        "block_processing_duration_seconds",
        "Time taken to link a block in seconds"
    );
}

/// Record a fully linked block.
pub fn record_block_indexed() {
    counter!("blocks_indexed_total").increment(1);
}

/// Record one inserted entity.
pub fn record_entity_linked(kind: EntityKind) {
    counter!("entities_linked_total", "kind" => kind.as_str()).increment(1);
}

/// Record a fatal error while linking an entity of `kind`.
pub fn record_link_error(kind: EntityKind) {
    counter!("link_errors_total", "kind" => kind.as_str()).increment(1);
}

/// Record block processing duration.
pub fn record_block_processing_duration(duration_secs: f64) {
    histogram!("block_processing_duration_seconds").record(duration_secs);
}

/// A timer that automatically records duration when dropped.
pub struct ProcessingTimer {
    start: Instant,
}

impl ProcessingTimer {
    /// Start a new processing timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for ProcessingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProcessingTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_block_processing_duration(duration);
    }
}
