//! Debug channel drain worker.
//!
//! # Responsibilities
//! - Periodically empty the debug channel
//! - Fan each message out to subscribers in FIFO order, then to the sink
//! - Self-report channel overflow as one Major diagnostic

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::channel::Drain;
use crate::diag::types::{MessageKind, Severity};
use crate::engine::EngineContext;
use crate::observability::metrics;
use crate::sink::debug_record_fields;

pub struct DebugDrainWorker {
    ctx: Arc<EngineContext>,
}

impl DebugDrainWorker {
    pub(crate) fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Run for the lifetime of the process. The worker is never stopped
    /// explicitly; it dies with the runtime.
    pub async fn run(self) {
        let interval = Duration::from_millis(self.ctx.config.debug_poll_interval_ms);
        tracing::debug!(interval_ms = interval.as_millis() as u64, "debug drain worker starting");

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.drain_once();
        }
    }

    /// Empty the channel once and dispatch. Returns the number of
    /// messages delivered.
    pub(crate) fn drain_once(&self) -> usize {
        match self.ctx.debug_channel.drain_all() {
            Drain::Overflowed { discarded } => {
                metrics::record_overflow("debug", discarded);
                tracing::warn!(discarded, "debug channel overflow, contents discarded");
                self.ctx.add_message(
                    MessageKind::HandledException,
                    Severity::Major,
                    format!("channel overflow: discarded {} items", discarded),
                    format!(
                        "debug channel reached its watermark of {}",
                        self.ctx.debug_channel.capacity()
                    ),
                );
                0
            }
            Drain::Batch(messages) => {
                for msg in &messages {
                    self.ctx.debug_subscribers.dispatch(msg);
                    if let Some(sink) = &self.ctx.sink {
                        if let Err(e) = sink.add_record(&debug_record_fields(msg)) {
                            tracing::warn!(error = %e, "debug record sink write failed");
                        }
                    }
                }
                if !messages.is_empty() {
                    metrics::record_dispatched("debug", messages.len());
                }
                messages.len()
            }
        }
    }
}
