//! Host environment snapshot.
//!
//! # Data Flow
//! ```text
//! engine start (enabled)
//!     → one spawn_blocking job queries the InventorySource
//!     → block rendered (identity + facts), or failure text
//!     → published into the EnvironmentCollector (write once)
//!     → watch signal fires; one dev-level app-event recorded
//!
//! Readers: crash reporter, subscribers, any get() caller.
//! ```
//!
//! # Design Decisions
//! - Collection failure is recorded as text in the block, never raised
//! - Before completion, get() returns a fixed placeholder

pub mod collector;
pub mod inventory;

pub use collector::EnvironmentCollector;
pub use inventory::{InventoryError, InventoryFact, InventorySource, SysinfoInventory};
