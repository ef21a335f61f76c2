//! Raw protocol traffic logging.
//!
//! # Data Flow
//! ```text
//! transport (serial link, socket, ...)
//!     → add_traffic_message (no-op unless threshold is dev)
//!     → traffic BoundedChannel (raw bytes, decoder deferred)
//!     → TrafficDrainWorker (10 ms active / 100 ms idle)
//!     → decode → subscribers → sink record
//! ```
//!
//! # Design Decisions
//! - Producers pay no decoding cost; the decoder runs on the worker
//! - Gated on the most verbose threshold so the hot traffic path is free
//!   in production configurations

pub mod types;
pub mod worker;

pub use types::{
    DecodedFrame, TrafficDecoder, TrafficDirection, TrafficRecord, TrafficValidity,
};
pub use worker::TrafficDrainWorker;

/// A drained traffic frame together with its decoded display form, as
/// delivered to traffic subscribers.
#[derive(Debug, Clone)]
pub struct TrafficEvent {
    pub record: TrafficRecord,
    pub decoded: DecodedFrame,
}
