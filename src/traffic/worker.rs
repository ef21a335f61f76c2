//! Traffic channel drain worker.
//!
//! # Responsibilities
//! - Poll fast while traffic logging is active, slow while idle
//! - Decode each frame at drain time (never at enqueue time)
//! - Fan out to subscribers, then to the sink
//! - Self-report channel overflow through the debug path

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::channel::Drain;
use crate::crash::IsolationGuard;
use crate::diag::types::{MessageKind, Severity};
use crate::engine::EngineContext;
use crate::observability::metrics;
use crate::sink::traffic_record_fields;
use crate::traffic::types::DecodedFrame;
use crate::traffic::TrafficEvent;

pub struct TrafficDrainWorker {
    ctx: Arc<EngineContext>,
}

impl TrafficDrainWorker {
    pub(crate) fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Run for the lifetime of the process. While the threshold is not
    /// `dev` the worker only wakes at the idle cadence to keep wasted CPU
    /// negligible.
    pub async fn run(self) {
        let active = Duration::from_millis(self.ctx.config.traffic_poll_interval_ms);
        let idle = Duration::from_millis(self.ctx.config.traffic_idle_interval_ms);
        tracing::debug!(
            active_ms = active.as_millis() as u64,
            idle_ms = idle.as_millis() as u64,
            "traffic drain worker starting"
        );

        loop {
            if self.ctx.traffic_active() {
                self.drain_once();
                sleep(active).await;
            } else {
                sleep(idle).await;
            }
        }
    }

    /// Empty the channel once and dispatch. Returns the number of frames
    /// delivered.
    pub(crate) fn drain_once(&self) -> usize {
        match self.ctx.traffic_channel.drain_all() {
            Drain::Overflowed { discarded } => {
                metrics::record_overflow("traffic", discarded);
                tracing::warn!(discarded, "traffic channel overflow, contents discarded");
                self.ctx.add_message(
                    MessageKind::AppEvent,
                    Severity::Major,
                    format!("channel overflow: discarded {} items", discarded),
                    format!(
                        "traffic channel reached its watermark of {}",
                        self.ctx.traffic_channel.capacity()
                    ),
                );
                0
            }
            Drain::Batch(records) => {
                let delivered = records.len();
                for record in records {
                    // Decoder is caller-supplied; a panic in it must not
                    // take the worker down.
                    let decoded = catch_unwind(AssertUnwindSafe(|| {
                        let _isolated = IsolationGuard::new();
                        record.decode()
                    }))
                    .unwrap_or_else(|_| {
                        metrics::record_subscriber_panic("traffic-decoder");
                        tracing::warn!(
                            traffic_type = %record.traffic_type,
                            "traffic decoder panicked, using empty decode"
                        );
                        DecodedFrame::default()
                    });
                    let event = TrafficEvent { record, decoded };
                    self.ctx.traffic_subscribers.dispatch(&event);
                    if let Some(sink) = &self.ctx.sink {
                        let fields = traffic_record_fields(&event.record, &event.decoded);
                        if let Err(e) = sink.add_record(&fields) {
                            tracing::warn!(error = %e, "traffic record sink write failed");
                        }
                    }
                }
                if delivered > 0 {
                    metrics::record_dispatched("traffic", delivered);
                }
                delivered
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use crate::config::TelemetryConfig;
    use crate::engine::TelemetryEngine;
    use crate::sink::MemorySink;
    use crate::traffic::types::{TrafficDecoder, TrafficDirection, TrafficRecord, TrafficValidity};

    fn dev_engine(sink: Option<Arc<MemorySink>>) -> TelemetryEngine {
        let config = TelemetryConfig {
            severity: Severity::Dev,
            install_crash_hook: false,
            collect_environment: false,
            ..TelemetryConfig::default()
        };
        match sink {
            Some(sink) => TelemetryEngine::with_sink(config, sink),
            None => TelemetryEngine::new(config),
        }
    }

    fn worker_for(engine: &TelemetryEngine) -> TrafficDrainWorker {
        TrafficDrainWorker::new(engine.ctx().clone())
    }

    #[test]
    fn test_decoding_happens_at_drain_time() {
        let engine = dev_engine(None);
        let strict = Arc::new(AtomicBool::new(false));

        let flag = strict.clone();
        let decoder: TrafficDecoder = Arc::new(move |raw, _| DecodedFrame {
            validity: if flag.load(Ordering::SeqCst) {
                TrafficValidity::Valid
            } else {
                TrafficValidity::Unknown
            },
            target_addr: format!("0x{:02X}", raw[0]),
            ..DecodedFrame::default()
        });

        engine.add_traffic_message(
            TrafficRecord::new("test", vec![0x3c]).decoder(decoder),
        );

        // Mutate the decoder's behavior after enqueue: the drain must see
        // the new behavior, proving decode was deferred.
        strict.store(true, Ordering::SeqCst);

        let seen: Arc<Mutex<Vec<DecodedFrame>>> = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        engine.on_traffic_message(move |event| {
            s.lock().unwrap().push(event.decoded.clone());
        });
        assert_eq!(worker_for(&engine).drain_once(), 1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].validity, TrafficValidity::Valid);
        assert_eq!(seen[0].target_addr, "0x3C");
    }

    #[test]
    fn test_no_decoder_yields_empty_decode() {
        let sink = Arc::new(MemorySink::new());
        let engine = dev_engine(Some(sink.clone()));
        engine.add_traffic_message(
            TrafficRecord::new("raw", vec![0xde, 0xad])
                .interface("uart0")
                .direction(TrafficDirection::Out),
        );
        worker_for(&engine).drain_once();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0][1], "uart0");
        assert_eq!(records[0][2], "out");
        assert_eq!(records[0][3], "DEAD");
        assert_eq!(records[0][4], "unknown");
        assert!(records[0][5..].iter().all(|s| s.is_empty()));
    }

    #[test]
    fn test_panicking_decoder_is_isolated() {
        let engine = dev_engine(None);
        let decoder: TrafficDecoder = Arc::new(|_, _| panic!("decoder bug"));
        engine.add_traffic_message(TrafficRecord::new("bad", vec![1]).decoder(decoder));
        engine.add_traffic_message(TrafficRecord::new("good", vec![2]));

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        engine.on_traffic_message(move |event| {
            s.lock().unwrap().push(event.record.traffic_type.clone());
        });
        assert_eq!(worker_for(&engine).drain_once(), 2);
        assert_eq!(*seen.lock().unwrap(), vec!["bad", "good"]);
    }

    #[test]
    fn test_overflow_reports_through_debug_path() {
        let engine = TelemetryEngine::new(TelemetryConfig {
            severity: Severity::Dev,
            channel_capacity: 10,
            install_crash_hook: false,
            collect_environment: false,
            ..TelemetryConfig::default()
        });
        for i in 0..10 {
            engine.add_traffic_message(TrafficRecord::new("burst", vec![i]));
        }
        assert_eq!(worker_for(&engine).drain_once(), 0);
        assert!(engine.ctx().traffic_channel.is_empty());
        // One Major app-event landed in the debug channel.
        assert_eq!(engine.ctx().debug_channel.len(), 1);
    }
}
