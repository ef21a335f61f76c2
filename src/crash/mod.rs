//! Last-resort crash reporting.
//!
//! # Responsibilities
//! - Register the process-wide unhandled-fault boundary once, at startup
//! - On a fault, capture a full diagnostic snapshot and write it to the
//!   sink synchronously (the drain workers may never run again)
//! - Terminate the process through one auditable call
//!
//! # Design Decisions
//! - The termination call is injectable so the handler is testable; the
//!   default is `std::process::exit`
//! - The handler is terminal: it never returns control to normal
//!   execution

use std::cell::Cell;
use std::panic::PanicHookInfo;
use std::sync::Arc;
use std::time::Duration;

use crate::diag::types::{MessageKind, Severity};
use crate::engine::EngineContext;

/// Exit code reported when the crash reporter terminates the process.
pub const CRASH_EXIT_CODE: i32 = 101;

thread_local! {
    // The drain workers catch panics from caller-supplied callbacks and
    // decoders; those are handled faults, not process-ending ones, and
    // the crash hook must stand down for them.
    static PANIC_ISOLATED: Cell<bool> = const { Cell::new(false) };
}

/// Marks panics on the current thread as isolated (they will be caught
/// by the enclosing `catch_unwind`) for as long as the guard lives.
pub(crate) struct IsolationGuard {
    previous: bool,
}

impl IsolationGuard {
    pub(crate) fn new() -> Self {
        PANIC_ISOLATED.with(|flag| {
            let previous = flag.get();
            flag.set(true);
            Self { previous }
        })
    }
}

impl Drop for IsolationGuard {
    fn drop(&mut self) {
        PANIC_ISOLATED.with(|flag| flag.set(self.previous));
    }
}

fn panic_is_isolated() -> bool {
    PANIC_ISOLATED.with(Cell::get)
}

type Terminator = Box<dyn Fn(i32) + Send + Sync>;

pub struct CrashReporter {
    ctx: Arc<EngineContext>,
    terminate: Terminator,
}

impl CrashReporter {
    pub(crate) fn new(ctx: Arc<EngineContext>) -> Self {
        Self {
            ctx,
            terminate: Box::new(|code| std::process::exit(code)),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_terminator(ctx: Arc<EngineContext>, terminate: Terminator) -> Self {
        Self { ctx, terminate }
    }

    /// Install this reporter as the process-wide panic hook. Panics raised
    /// inside an [`IsolationGuard`] scope are about to be caught by the
    /// worker that raised them; those fall through to the previous hook
    /// instead of being treated as fatal.
    pub(crate) fn install(self) {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if panic_is_isolated() {
                previous(info);
                return;
            }
            let (message, detail) = describe_panic(info);
            self.handle_fault(&message, &detail);
        }));
    }

    /// Handle a fatal unhandled fault. Writes the crash snapshot and then
    /// terminates the process; does not return under the default
    /// terminator.
    pub(crate) fn handle_fault(&self, message: &str, detail: &str) {
        tracing::error!(message, "unhandled fault, writing crash report");

        let profiling = self.ctx.profiling.snapshot();
        self.ctx
            .add_message(MessageKind::FatalUnhandled, Severity::Major, message, detail);
        self.ctx.add_message(
            MessageKind::AppEvent,
            Severity::Major,
            "Application exit with error",
            format!("{}\nCurrent profiling values:\n{}", message, profiling),
        );

        let report = self.build_report(message, detail, &profiling);
        if let Some(sink) = &self.ctx.sink {
            if let Err(e) = sink.write_report("crash report", &report) {
                tracing::error!(error = %e, "crash report sink write failed");
            }
        }

        // Grace period for in-flight background writes, then terminate.
        std::thread::sleep(Duration::from_millis(self.ctx.config.crash_grace_period_ms));
        (self.terminate)(CRASH_EXIT_CODE);
    }

    fn build_report(&self, message: &str, detail: &str, profiling: &str) -> String {
        let mut report = String::new();
        report.push_str("Application terminated with unhandled fault\n");
        report.push_str("Application: ");
        report.push_str(&self.ctx.config.app_identity);
        report.push_str("\n\n");
        report.push_str("Error message: ");
        report.push_str(message);
        report.push('\n');
        report.push_str(detail);
        report.push_str("\n\n");
        report.push_str("Environment inventory gathered at start:\n");
        report.push_str(&self.ctx.environment.get());
        report.push('\n');
        report.push_str("Current profiling values:\n");
        report.push_str(profiling);
        report
    }
}

/// Extract a short message and the full display form from a panic.
fn describe_panic(info: &PanicHookInfo<'_>) -> (String, String) {
    let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    (message, info.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::config::TelemetryConfig;
    use crate::engine::TelemetryEngine;
    use crate::sink::MemorySink;

    fn crash_engine(sink: Arc<MemorySink>) -> TelemetryEngine {
        TelemetryEngine::with_sink(
            TelemetryConfig {
                severity: Severity::Normal,
                app_identity: "pump-control 1.2.0".to_string(),
                install_crash_hook: false,
                collect_environment: false,
                crash_grace_period_ms: 1,
                ..TelemetryConfig::default()
            },
            sink,
        )
    }

    fn recording_terminator() -> (Terminator, Arc<Mutex<Vec<i32>>>) {
        let calls: Arc<Mutex<Vec<i32>>> = Arc::new(Mutex::new(Vec::new()));
        let record = calls.clone();
        let terminate: Terminator = Box::new(move |code| {
            record.lock().unwrap().push(code);
        });
        (terminate, calls)
    }

    #[test]
    fn test_report_contains_all_sections() {
        let sink = Arc::new(MemorySink::new());
        let engine = crash_engine(sink.clone());
        engine.add_profiling_value("rpm", 900);
        engine.ctx().environment.publish("os name: linux\n".to_string());

        let (terminate, calls) = recording_terminator();
        let reporter = CrashReporter::with_terminator(engine.ctx().clone(), terminate);
        reporter.handle_fault("index out of bounds", "thread 'main' panicked at src/pump.rs:10");

        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        let (title, body) = &reports[0];
        assert_eq!(title, "crash report");
        assert!(body.starts_with("Application terminated with unhandled fault"));
        assert!(body.contains("Application: pump-control 1.2.0"));
        assert!(body.contains("Error message: index out of bounds"));
        assert!(body.contains("src/pump.rs:10"));
        assert!(body.contains("os name: linux"));
        assert!(body.contains("rpm: 900"));

        assert_eq!(*calls.lock().unwrap(), vec![CRASH_EXIT_CODE]);
    }

    #[test]
    fn test_fatal_messages_enqueued_before_termination() {
        let sink = Arc::new(MemorySink::new());
        let engine = crash_engine(sink);

        let (terminate, _) = recording_terminator();
        CrashReporter::with_terminator(engine.ctx().clone(), terminate)
            .handle_fault("boom", "detail");

        // Fatal diagnostic plus the exit app-event, both at Major.
        match engine.ctx().debug_channel.drain_all() {
            crate::channel::Drain::Batch(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].kind, MessageKind::FatalUnhandled);
                assert_eq!(items[0].severity, Severity::Major);
                assert_eq!(items[0].message, "boom");
                assert_eq!(items[1].kind, MessageKind::AppEvent);
                assert_eq!(items[1].message, "Application exit with error");
            }
            crate::channel::Drain::Overflowed { .. } => panic!("unexpected overflow"),
        }
    }

    #[test]
    fn test_hook_stands_down_for_caught_subscriber_panics() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        use crate::diag::worker::DebugDrainWorker;

        let sink = Arc::new(MemorySink::new());
        let engine = crash_engine(sink);
        let (terminate, calls) = recording_terminator();
        CrashReporter::with_terminator(engine.ctx().clone(), terminate).install();

        let delivered = Arc::new(AtomicUsize::new(0));
        engine.on_debug_message(|_| panic!("bad subscriber"));
        let hits = delivered.clone();
        engine.on_debug_message(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });

        let worker = DebugDrainWorker::new(engine.ctx().clone());
        engine.add_app_event("first", "", Severity::Major);
        assert_eq!(worker.drain_once(), 1);
        engine.add_app_event("second", "", Severity::Major);
        assert_eq!(worker.drain_once(), 1);

        // The worker kept dispatching and the reporter never fired.
        assert_eq!(delivered.load(Ordering::SeqCst), 2);
        assert!(calls.lock().unwrap().is_empty());

        // A panic nothing catches still reaches the reporter.
        let _ = std::thread::spawn(|| panic!("uncaught worker fault")).join();
        assert_eq!(*calls.lock().unwrap(), vec![CRASH_EXIT_CODE]);
    }

    #[test]
    fn test_placeholder_environment_in_early_crash() {
        let sink = Arc::new(MemorySink::new());
        let engine = crash_engine(sink.clone());

        let (terminate, _) = recording_terminator();
        CrashReporter::with_terminator(engine.ctx().clone(), terminate)
            .handle_fault("early crash", "");

        let reports = sink.reports();
        assert!(reports[0]
            .1
            .contains(crate::environment::collector::PLACEHOLDER));
    }
}
