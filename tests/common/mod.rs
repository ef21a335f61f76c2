//! Shared helpers for the integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use telemetry_engine::{
    DiagnosticMessage, InventoryError, InventoryFact, InventorySource, TelemetryConfig,
    TelemetryEngine,
};

/// Collects every dispatched diagnostic message for later assertions.
#[derive(Clone, Default)]
pub struct MessageCollector {
    messages: Arc<Mutex<Vec<DiagnosticMessage>>>,
}

impl MessageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, engine: &TelemetryEngine) {
        let messages = self.messages.clone();
        engine.on_debug_message(move |msg| {
            messages.lock().unwrap().push(msg.clone());
        });
    }

    pub fn messages(&self) -> Vec<DiagnosticMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Wait until at least `count` messages matching `predicate` arrived,
    /// or the timeout elapses.
    pub async fn wait_for(
        &self,
        count: usize,
        predicate: impl Fn(&DiagnosticMessage) -> bool,
        timeout: Duration,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let matched = self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| predicate(m))
                .count();
            if matched >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

/// Inventory source returning a fixed fact set instantly.
pub struct FixedInventory;

impl InventorySource for FixedInventory {
    fn collect(&self) -> Result<Vec<InventoryFact>, InventoryError> {
        Ok(vec![
            InventoryFact::new("os", "name", "test-os"),
            InventoryFact::new("cpu", "logical_cores", "4"),
        ])
    }
}

/// A config suitable for tests: fast polling, no global crash hook.
pub fn test_config(severity: telemetry_engine::Severity) -> TelemetryConfig {
    TelemetryConfig {
        severity,
        app_identity: "integration-test 0.1.0".to_string(),
        install_crash_hook: false,
        collect_environment: false,
        debug_poll_interval_ms: 5,
        traffic_poll_interval_ms: 5,
        traffic_idle_interval_ms: 20,
        ..TelemetryConfig::default()
    }
}
