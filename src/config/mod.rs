//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → TelemetryConfig (validated, immutable)
//!     → owned by the engine context, shared via Arc to all workers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the engine starts; only the severity
//!   threshold is runtime-adjustable (through the engine, not the config)
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::TelemetryConfig;
pub use validation::{validate_config, ValidationError};
