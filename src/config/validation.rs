//! Semantic configuration validation.
//!
//! Serde handles the syntactic layer; this module checks cross-field
//! constraints before a config is accepted.

use std::fmt;

use crate::config::schema::TelemetryConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting all failures rather than stopping
/// at the first one.
pub fn validate_config(config: &TelemetryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.channel_capacity == 0 {
        errors.push(ValidationError {
            field: "channel_capacity",
            message: "must be at least 1".to_string(),
        });
    }
    if config.debug_poll_interval_ms == 0 {
        errors.push(ValidationError {
            field: "debug_poll_interval_ms",
            message: "must be at least 1".to_string(),
        });
    }
    if config.traffic_poll_interval_ms == 0 {
        errors.push(ValidationError {
            field: "traffic_poll_interval_ms",
            message: "must be at least 1".to_string(),
        });
    }
    if config.traffic_idle_interval_ms < config.traffic_poll_interval_ms {
        errors.push(ValidationError {
            field: "traffic_idle_interval_ms",
            message: "idle cadence must not be faster than the active cadence".to_string(),
        });
    }
    if config.profiling_sample_interval_ms == 0 {
        errors.push(ValidationError {
            field: "profiling_sample_interval_ms",
            message: "must be at least 1".to_string(),
        });
    }
    if config.app_identity.trim().is_empty() {
        errors.push(ValidationError {
            field: "app_identity",
            message: "must not be blank".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&TelemetryConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = TelemetryConfig::default();
        config.channel_capacity = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "channel_capacity");
    }

    #[test]
    fn test_idle_faster_than_active_rejected() {
        let mut config = TelemetryConfig::default();
        config.traffic_poll_interval_ms = 200;
        config.traffic_idle_interval_ms = 100;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_multiple_errors_collected() {
        let mut config = TelemetryConfig::default();
        config.channel_capacity = 0;
        config.debug_poll_interval_ms = 0;
        config.app_identity = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
