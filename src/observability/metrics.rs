//! Metrics about the engine itself.
//!
//! # Responsibilities
//! - Define engine counters (enqueued, filtered, overflow, dispatched)
//! - Keep metric updates cheap on producer hot paths
//!
//! # Metrics
//! - `telemetry_enqueued_total` (counter): items accepted, by channel
//! - `telemetry_filtered_total` (counter): below-threshold no-ops
//! - `telemetry_overflow_discarded_total` (counter): items lost to overflow
//! - `telemetry_dispatched_total` (counter): items delivered to consumers
//! - `telemetry_subscriber_panics_total` (counter): isolated callback faults
//!
//! Exposition (Prometheus endpoint or otherwise) is the embedder's
//! concern; the engine only records through the `metrics` facade.

pub fn record_enqueued(channel: &'static str) {
    metrics::counter!("telemetry_enqueued_total", "channel" => channel).increment(1);
}

pub fn record_filtered(channel: &'static str) {
    metrics::counter!("telemetry_filtered_total", "channel" => channel).increment(1);
}

pub fn record_overflow(channel: &'static str, discarded: usize) {
    metrics::counter!("telemetry_overflow_discarded_total", "channel" => channel)
        .increment(discarded as u64);
}

pub fn record_dispatched(channel: &'static str, count: usize) {
    metrics::counter!("telemetry_dispatched_total", "channel" => channel)
        .increment(count as u64);
}

pub fn record_subscriber_panic(channel: &'static str) {
    metrics::counter!("telemetry_subscriber_panics_total", "channel" => channel).increment(1);
}
