//! Engine facade and shared context.
//!
//! # Data Flow
//! ```text
//! application code
//!     → TelemetryEngine add-operations (filter at enqueue, never block)
//!     → BoundedChannel (debug / traffic)
//!     → drain workers (background tokio tasks, fixed cadence)
//!     → subscribers + persistent sink
//! ```
//!
//! # Design Decisions
//! - One explicit context object instead of process-wide globals; tests
//!   construct independent engines freely
//! - Sub-components start in a fixed, typed sequence inside `start`
//! - `start` is designed to be called once; a second call is a warned no-op

pub mod subscribers;

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use crate::channel::BoundedChannel;
use crate::config::{validate_config, TelemetryConfig};
use crate::crash::CrashReporter;
use crate::diag::types::{DiagnosticMessage, MessageKind, Severity, SourceLocation};
use crate::diag::worker::DebugDrainWorker;
use crate::environment::collector::collect_block;
use crate::environment::{EnvironmentCollector, InventorySource, SysinfoInventory};
use crate::observability::metrics;
use crate::profiling::sampler::ProfilingSampler;
use crate::profiling::ProfilingStore;
use crate::sink::RecordSink;
use crate::traffic::types::TrafficRecord;
use crate::traffic::worker::TrafficDrainWorker;
use crate::traffic::TrafficEvent;

use subscribers::CallbackSet;

/// Shared state behind every engine handle and worker.
pub(crate) struct EngineContext {
    pub(crate) config: TelemetryConfig,
    severity: AtomicU8,
    pub(crate) debug_channel: BoundedChannel<DiagnosticMessage>,
    pub(crate) traffic_channel: BoundedChannel<TrafficRecord>,
    pub(crate) profiling: ProfilingStore,
    pub(crate) environment: EnvironmentCollector,
    pub(crate) debug_subscribers: CallbackSet<DiagnosticMessage>,
    pub(crate) traffic_subscribers: CallbackSet<TrafficEvent>,
    pub(crate) sink: Option<Arc<dyn RecordSink>>,
    started: AtomicBool,
}

impl EngineContext {
    fn new(config: TelemetryConfig, sink: Option<Arc<dyn RecordSink>>) -> Self {
        // Configs built in code bypass the loader's validation; surface
        // the problems but keep the engine in a usable state.
        if let Err(errors) = validate_config(&config) {
            for error in &errors {
                tracing::warn!(%error, "telemetry config invalid, continuing with adjusted value");
            }
        }
        let capacity = config.channel_capacity.max(1);
        Self {
            severity: AtomicU8::new(config.severity.as_u8()),
            config,
            debug_channel: BoundedChannel::new(capacity),
            traffic_channel: BoundedChannel::new(capacity),
            profiling: ProfilingStore::new(),
            environment: EnvironmentCollector::new(),
            debug_subscribers: CallbackSet::new("debug"),
            traffic_subscribers: CallbackSet::new("traffic"),
            sink,
            started: AtomicBool::new(false),
        }
    }

    pub(crate) fn severity(&self) -> Severity {
        Severity::from_u8(self.severity.load(Ordering::Relaxed))
    }

    pub(crate) fn set_severity(&self, severity: Severity) {
        self.severity.store(severity.as_u8(), Ordering::Relaxed);
    }

    /// Traffic logging runs only at the most verbose threshold.
    pub(crate) fn traffic_active(&self) -> bool {
        self.severity() == Severity::Dev
    }

    /// Filter by severity and enqueue a diagnostic message. Below the
    /// threshold this is a no-op; it never blocks and never fails.
    #[track_caller]
    pub(crate) fn add_message(
        &self,
        kind: MessageKind,
        severity: Severity,
        message: impl Into<String>,
        details: impl Into<String>,
    ) {
        if severity < self.severity() {
            metrics::record_filtered("debug");
            return;
        }
        let msg = DiagnosticMessage::new(
            kind,
            severity,
            message,
            details,
            SourceLocation::caller(),
        );
        self.debug_channel.enqueue(msg);
        metrics::record_enqueued("debug");
    }

    /// Enqueue a traffic record, unless traffic logging is inactive.
    pub(crate) fn add_traffic(&self, record: TrafficRecord) {
        if !self.traffic_active() {
            metrics::record_filtered("traffic");
            return;
        }
        self.traffic_channel.enqueue(record);
        metrics::record_enqueued("traffic");
    }
}

/// The single entry point of the diagnostics engine. Cheap to clone;
/// clones share the same context.
#[derive(Clone)]
pub struct TelemetryEngine {
    ctx: Arc<EngineContext>,
    inventory: Arc<dyn InventorySource>,
}

impl TelemetryEngine {
    /// Engine with no persistent sink and the default host inventory.
    pub fn new(config: TelemetryConfig) -> Self {
        Self::with_parts(config, None, Arc::new(SysinfoInventory))
    }

    /// Engine draining into the given persistent sink.
    pub fn with_sink(config: TelemetryConfig, sink: Arc<dyn RecordSink>) -> Self {
        Self::with_parts(config, Some(sink), Arc::new(SysinfoInventory))
    }

    /// Engine with every collaborator supplied explicitly.
    pub fn with_parts(
        config: TelemetryConfig,
        sink: Option<Arc<dyn RecordSink>>,
        inventory: Arc<dyn InventorySource>,
    ) -> Self {
        Self {
            ctx: Arc::new(EngineContext::new(config, sink)),
            inventory,
        }
    }

    /// Start the background workers, install the crash hook, and record
    /// the startup event. Must be called from within a tokio runtime.
    ///
    /// Designed to be called once, at process start; repeated calls are
    /// warned no-ops.
    pub fn start(&self) {
        if self.ctx.started.swap(true, Ordering::SeqCst) {
            tracing::warn!("telemetry engine already started");
            return;
        }

        let config = &self.ctx.config;
        tracing::info!(
            severity = %config.severity,
            capacity = config.channel_capacity,
            "telemetry engine starting"
        );

        if let Some(sink) = &self.ctx.sink {
            sink.describe(&format!("telemetry records for {}", config.app_identity));
        }

        if config.install_crash_hook {
            CrashReporter::new(self.ctx.clone()).install();
        }

        tokio::spawn(DebugDrainWorker::new(self.ctx.clone()).run());
        tokio::spawn(TrafficDrainWorker::new(self.ctx.clone()).run());
        tokio::spawn(ProfilingSampler::new(self.ctx.clone()).run());

        if config.collect_environment {
            self.spawn_environment_collection();
        } else {
            self.ctx.environment.mark_disabled();
        }

        self.ctx.add_message(
            MessageKind::AppEvent,
            Severity::Major,
            "Application started",
            config.app_identity.clone(),
        );
        self.ctx.add_message(
            MessageKind::AppEvent,
            Severity::Dev,
            "Application started. Details",
            format!(
                "severity threshold: {}; channel capacity: {}; environment collection: {}",
                config.severity, config.channel_capacity, config.collect_environment
            ),
        );
    }

    fn spawn_environment_collection(&self) {
        let ctx = self.ctx.clone();
        let source = self.inventory.clone();
        tokio::spawn(async move {
            let identity = ctx.config.app_identity.clone();
            let block =
                match tokio::task::spawn_blocking(move || collect_block(&identity, source.as_ref()))
                    .await
                {
                    Ok(block) => block,
                    Err(e) => format!("Environment inventory unavailable: {}", e),
                };

            ctx.environment.store_block(block.clone());
            ctx.add_message(
                MessageKind::AppEvent,
                Severity::Dev,
                "Environment inventory gathered",
                block,
            );
            ctx.environment.signal_ready();
            tracing::debug!("environment inventory collected");
        });
    }

    pub fn severity(&self) -> Severity {
        self.ctx.severity()
    }

    pub fn set_severity(&self, severity: Severity) {
        self.ctx.set_severity(severity);
    }

    /// Record an error that was caught and handled. `name` falls back to
    /// the error's display form when empty; conventional severity is
    /// [`Severity::Detail`].
    #[track_caller]
    pub fn add_handled_error<E: std::fmt::Display>(
        &self,
        error: &E,
        name: &str,
        details: &str,
        severity: Severity,
    ) {
        let error_text = error.to_string();
        let name = if name.is_empty() { error_text.as_str() } else { name };
        let details = if details.is_empty() {
            error_text.clone()
        } else {
            format!("{}\n{}", error_text, details)
        };
        self.ctx
            .add_message(MessageKind::HandledException, severity, name, details);
    }

    /// Record an application event; conventional severity is
    /// [`Severity::Dev`].
    #[track_caller]
    pub fn add_app_event(
        &self,
        message: impl Into<String>,
        details: impl Into<String>,
        severity: Severity,
    ) {
        self.ctx
            .add_message(MessageKind::AppEvent, severity, message, details);
    }

    /// Record a user action; conventional severity is [`Severity::Dev`].
    #[track_caller]
    pub fn add_user_action(
        &self,
        message: impl Into<String>,
        details: impl Into<String>,
        severity: Severity,
    ) {
        self.ctx
            .add_message(MessageKind::UserAction, severity, message, details);
    }

    /// Queue a raw traffic frame. Guaranteed no-op unless the severity
    /// threshold is [`Severity::Dev`]; decoding is deferred to drain time.
    pub fn add_traffic_message(&self, record: TrafficRecord) {
        self.ctx.add_traffic(record);
    }

    pub fn profiling(&self) -> &ProfilingStore {
        &self.ctx.profiling
    }

    /// Last-write-wins profiling value, stringified now.
    pub fn add_profiling_value<V: std::fmt::Display>(&self, name: &str, value: V) {
        self.ctx.profiling.add(name, value);
    }

    pub fn environment(&self) -> &EnvironmentCollector {
        &self.ctx.environment
    }

    /// Subscribe to drained diagnostic messages. Fires on the debug
    /// worker's task; do not block inline.
    pub fn on_debug_message(&self, callback: impl Fn(&DiagnosticMessage) + Send + Sync + 'static) {
        self.ctx.debug_subscribers.subscribe(callback);
    }

    /// Subscribe to drained traffic frames with their decoded form.
    /// Fires on the traffic worker's task; do not block inline.
    pub fn on_traffic_message(&self, callback: impl Fn(&TrafficEvent) + Send + Sync + 'static) {
        self.ctx.traffic_subscribers.subscribe(callback);
    }

    #[cfg(test)]
    pub(crate) fn ctx(&self) -> &Arc<EngineContext> {
        &self.ctx
    }
}
