//! Periodic profiling sampler.
//!
//! When a sink is configured, the sampler persists the current profiling
//! values on a fixed cadence while the engine runs at the most verbose
//! threshold. Without a sink the task exits immediately.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::diag::types::Severity;
use crate::engine::EngineContext;
use crate::sink::{format_timestamp, RecordSink};

pub struct ProfilingSampler {
    ctx: Arc<EngineContext>,
}

impl ProfilingSampler {
    pub(crate) fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    pub async fn run(self) {
        let Some(sink) = self.ctx.sink.clone() else {
            return;
        };
        let interval = Duration::from_millis(self.ctx.config.profiling_sample_interval_ms);
        tracing::debug!(
            interval_ms = interval.as_millis() as u64,
            "profiling sampler starting"
        );

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.sample_once(sink.as_ref());
        }
    }

    /// Write one record per profiling entry. Returns the number written.
    pub(crate) fn sample_once(&self, sink: &dyn RecordSink) -> usize {
        if self.ctx.severity() != Severity::Dev || self.ctx.profiling.is_empty() {
            return 0;
        }
        let timestamp = format_timestamp(&chrono::Local::now());
        let entries = self.ctx.profiling.entries();
        let count = entries.len();
        for (name, value) in entries {
            let fields = [timestamp.clone(), "profiling".to_string(), name, value];
            if let Err(e) = sink.add_record(&fields) {
                tracing::warn!(error = %e, "profiling sample sink write failed");
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelemetryConfig;
    use crate::engine::TelemetryEngine;
    use crate::sink::MemorySink;

    fn engine(severity: Severity, sink: Arc<MemorySink>) -> TelemetryEngine {
        TelemetryEngine::with_sink(
            TelemetryConfig {
                severity,
                install_crash_hook: false,
                collect_environment: false,
                ..TelemetryConfig::default()
            },
            sink,
        )
    }

    #[test]
    fn test_samples_each_entry_at_dev() {
        let sink = Arc::new(MemorySink::new());
        let engine = engine(Severity::Dev, sink.clone());
        engine.add_profiling_value("rpm", 900);
        engine.add_profiling_value("temp_c", 41.5);

        let sampler = ProfilingSampler::new(engine.ctx().clone());
        assert_eq!(sampler.sample_once(sink.as_ref()), 2);

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| r[2] == "rpm" && r[3] == "900"));
        assert!(records.iter().any(|r| r[2] == "temp_c" && r[3] == "41.5"));
    }

    #[test]
    fn test_silent_above_dev_or_when_empty() {
        let sink = Arc::new(MemorySink::new());
        let engine = engine(Severity::Normal, sink.clone());
        engine.add_profiling_value("rpm", 900);

        let sampler = ProfilingSampler::new(engine.ctx().clone());
        assert_eq!(sampler.sample_once(sink.as_ref()), 0);

        engine.set_severity(Severity::Dev);
        assert_eq!(sampler.sample_once(sink.as_ref()), 1);
    }
}
