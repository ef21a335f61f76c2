//! In-process diagnostics and telemetry engine.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌─────────────────────────────────────────────────┐
//!                    │                TELEMETRY ENGINE                  │
//!                    │                                                  │
//!  app threads       │  ┌──────────┐   ┌─────────────┐   ┌──────────┐  │
//!  ──enqueue────────▶│  │  debug   │──▶│ debug drain │──▶│subscribers│ │
//!  (never blocks)    │  │ channel  │   │   worker    │   │  + sink  │  │
//!                    │  └──────────┘   └─────────────┘   └──────────┘  │
//!                    │  ┌──────────┐   ┌─────────────┐                 │
//!  transport frames ─┼─▶│ traffic  │──▶│traffic drain│──▶ decode ───▶  │
//!  (dev level only)  │  │ channel  │   │   worker    │    fan-out      │
//!                    │  └──────────┘   └─────────────┘                 │
//!                    │                                                  │
//!                    │  ┌───────────┐  ┌─────────────┐  ┌───────────┐  │
//!                    │  │ profiling │  │ environment │  │   crash   │  │
//!                    │  │   store   │  │  collector  │  │ reporter  │  │
//!                    │  └───────────┘  └─────────────┘  └───────────┘  │
//!                    └─────────────────────────────────────────────────┘
//! ```
//!
//! Data flows one way: application code enqueues, background workers
//! drain on a fixed cadence and dispatch to subscribers and the
//! persistent sink. The crash reporter is the only component that reads
//! the stores synchronously, bypassing the channels, because the process
//! is about to die.

// Core pipeline
pub mod channel;
pub mod diag;
pub mod traffic;

// Stores and one-shot collection
pub mod environment;
pub mod profiling;

// Fault boundary and seams
pub mod crash;
pub mod sink;

// Cross-cutting concerns
pub mod config;
pub mod engine;
pub mod observability;

pub use config::{load_config, ConfigError, TelemetryConfig};
pub use crash::CRASH_EXIT_CODE;
pub use diag::{DiagnosticMessage, MessageKind, Severity, SourceLocation};
pub use engine::TelemetryEngine;
pub use environment::{InventoryError, InventoryFact, InventorySource, SysinfoInventory};
pub use profiling::ProfilingStore;
pub use sink::{MemorySink, RecordSink, SinkError};
pub use traffic::{
    DecodedFrame, TrafficDecoder, TrafficDirection, TrafficEvent, TrafficRecord, TrafficValidity,
};
