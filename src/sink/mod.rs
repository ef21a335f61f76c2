//! Persistent sink seam and flat record formatting.
//!
//! # Responsibilities
//! - Define the interface the engine needs from a persistent sink
//! - Render diagnostic and traffic items as flat tab-separated records
//!
//! # Design Decisions
//! - The concrete log-file writer (rotation, retention) lives outside the
//!   engine; the engine only needs `add_record`
//! - Sink failures are swallowed by callers and logged, never propagated
//!   into the application (telemetry must not cause faults)

use std::sync::Mutex;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::diag::types::DiagnosticMessage;
use crate::traffic::types::{DecodedFrame, TrafficRecord};

/// Timestamp layout used in every sink record.
pub const TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M:%S%.3f";

/// Errors a sink implementation may report.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Interface to a persistent record sink.
///
/// Implementations must be safe to call from the drain worker tasks and
/// from the crash reporter's synchronous path.
pub trait RecordSink: Send + Sync {
    /// Describe the record stream, called once before the first record.
    fn describe(&self, header: &str);

    /// Append one flat delimited record.
    fn add_record(&self, fields: &[String]) -> Result<(), SinkError>;

    /// Write a free-form report block. The crash reporter uses this for
    /// the crash snapshot; the default folds into a single record.
    fn write_report(&self, title: &str, body: &str) -> Result<(), SinkError> {
        self.add_record(&[format_timestamp(&Local::now()), title.to_string(), body.to_string()])
    }
}

pub fn format_timestamp(ts: &DateTime<Local>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Tab-separated fields for one diagnostic message.
pub fn debug_record_fields(msg: &DiagnosticMessage) -> Vec<String> {
    vec![
        format_timestamp(&msg.timestamp),
        msg.kind.to_string(),
        msg.severity.to_string(),
        msg.message.clone(),
        msg.details.clone(),
        msg.location.to_string(),
    ]
}

/// Tab-separated fields for one traffic record and its decoded form.
pub fn traffic_record_fields(record: &TrafficRecord, decoded: &DecodedFrame) -> Vec<String> {
    vec![
        format_timestamp(&record.timestamp),
        record.source_interface.clone(),
        record.direction.to_string(),
        hex_encode(&record.payload),
        decoded.validity.to_string(),
        decoded.source_addr.clone(),
        decoded.target_addr.clone(),
        decoded.command.clone(),
        decoded.detail.clone(),
        decoded.checksum.clone(),
    ]
}

/// An in-process sink that retains records in memory.
///
/// Used by the test suites; also usable by embedders that forward records
/// elsewhere on their own schedule.
#[derive(Default)]
pub struct MemorySink {
    header: Mutex<Option<String>>,
    records: Mutex<Vec<Vec<String>>>,
    reports: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Vec<String>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn header(&self) -> Option<String> {
        self.header.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl RecordSink for MemorySink {
    fn describe(&self, header: &str) {
        let mut slot = self.header.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(header.to_string());
    }

    fn add_record(&self, fields: &[String]) -> Result<(), SinkError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.push(fields.to_vec());
        Ok(())
    }

    fn write_report(&self, title: &str, body: &str) -> Result<(), SinkError> {
        let mut reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        reports.push((title.to_string(), body.to_string()));
        Ok(())
    }
}
