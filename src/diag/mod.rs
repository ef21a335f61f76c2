//! Structured diagnostic messages.
//!
//! # Data Flow
//! ```text
//! add_app_event / add_user_action / add_handled_error
//!     → severity filter (at enqueue, exact)
//!     → debug BoundedChannel
//!     → DebugDrainWorker (10 ms cadence)
//!     → subscribers (FIFO, exactly once) → sink record
//! ```

pub mod types;
pub mod worker;

pub use types::{DiagnosticMessage, MessageKind, Severity, SourceLocation};
pub use worker::DebugDrainWorker;
