//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files;
//! every field has a default so a minimal config is valid.

use serde::{Deserialize, Serialize};

use crate::channel::DEFAULT_CAPACITY;
use crate::diag::types::Severity;

/// Root configuration for the telemetry engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Minimum severity accepted into the debug channel.
    pub severity: Severity,

    /// Identity string of the embedding application, recorded in the
    /// startup event, the environment block, and crash reports.
    pub app_identity: String,

    /// Gather the host environment inventory on start.
    pub collect_environment: bool,

    /// Install the process-wide crash hook on start.
    pub install_crash_hook: bool,

    /// Capacity watermark of each telemetry channel.
    pub channel_capacity: usize,

    /// Debug drain worker cadence.
    pub debug_poll_interval_ms: u64,

    /// Traffic drain worker cadence while the threshold is `dev`.
    pub traffic_poll_interval_ms: u64,

    /// Traffic drain worker cadence while traffic logging is inactive.
    pub traffic_idle_interval_ms: u64,

    /// Profiling sampler cadence.
    pub profiling_sample_interval_ms: u64,

    /// Grace period allowed for in-flight writes before the crash
    /// reporter terminates the process.
    pub crash_grace_period_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            severity: Severity::Normal,
            app_identity: "unnamed-application".to_string(),
            collect_environment: true,
            install_crash_hook: true,
            channel_capacity: DEFAULT_CAPACITY,
            debug_poll_interval_ms: 10,
            traffic_poll_interval_ms: 10,
            traffic_idle_interval_ms: 100,
            profiling_sample_interval_ms: 1000,
            crash_grace_period_ms: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_surface() {
        let config = TelemetryConfig::default();
        assert_eq!(config.severity, Severity::Normal);
        assert_eq!(config.channel_capacity, 1000);
        assert_eq!(config.debug_poll_interval_ms, 10);
        assert_eq!(config.traffic_poll_interval_ms, 10);
        assert_eq!(config.traffic_idle_interval_ms, 100);
        assert_eq!(config.profiling_sample_interval_ms, 1000);
        assert!(config.collect_environment);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TelemetryConfig =
            toml::from_str("severity = \"dev\"\nchannel_capacity = 50").unwrap();
        assert_eq!(config.severity, Severity::Dev);
        assert_eq!(config.channel_capacity, 50);
        assert_eq!(config.traffic_idle_interval_ms, 100);
    }
}
