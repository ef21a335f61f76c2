//! Observability for the engine itself.
//!
//! # Design Decisions
//! - The engine reports on its own behavior (overflow, sink failures,
//!   subscriber panics) through `tracing` and the `metrics` facade
//! - Exposition and aggregation stay outside: the embedder installs the
//!   subscriber and the metrics recorder

pub mod logging;
pub mod metrics;
