//! Diagnostic message taxonomy and record types.

use std::fmt;
use std::panic::Location;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Verbosity level of a diagnostic message, ordered most to least verbose.
///
/// A message is accepted into the debug channel iff its severity is at or
/// above the engine's configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Dev,
    Detail,
    Normal,
    Major,
}

impl Severity {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => Severity::Dev,
            1 => Severity::Detail,
            2 => Severity::Normal,
            _ => Severity::Major,
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Severity::Dev => 0,
            Severity::Detail => 1,
            Severity::Normal => 2,
            Severity::Major => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Dev => "dev",
            Severity::Detail => "detail",
            Severity::Normal => "normal",
            Severity::Major => "major",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Severity::Dev),
            "detail" => Ok(Severity::Detail),
            "normal" => Ok(Severity::Normal),
            "major" => Ok(Severity::Major),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// Classification of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// An unhandled fault that is terminating the process.
    FatalUnhandled,
    /// An error that was caught and recovered from.
    HandledException,
    Warning,
    AppEvent,
    UserAction,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageKind::FatalUnhandled => "fatal-unhandled",
            MessageKind::HandledException => "handled-exception",
            MessageKind::Warning => "warning",
            MessageKind::AppEvent => "app-event",
            MessageKind::UserAction => "user-action",
        };
        write!(f, "{}", s)
    }
}

/// Call site of an add-operation: file basename, line, and optionally the
/// member (function) name when the caller supplies one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub member: String,
}

impl SourceLocation {
    /// Capture the immediate caller's file and line.
    #[track_caller]
    pub fn caller() -> Self {
        let loc = Location::caller();
        let file = loc
            .file()
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(loc.file())
            .to_string();
        Self {
            file,
            line: loc.line(),
            member: String::new(),
        }
    }

    /// Attach a member (function) name to a captured location.
    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = member.into();
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.member.is_empty() {
            write!(f, "{}:{}", self.file, self.line)
        } else {
            write!(f, "{}:{} {}", self.file, self.line, self.member)
        }
    }
}

/// An immutable structured diagnostic record.
///
/// Created by an engine add-operation, consumed exactly once by the debug
/// drain worker, never mutated after creation.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub kind: MessageKind,
    pub severity: Severity,
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub details: String,
    pub location: SourceLocation,
}

impl DiagnosticMessage {
    pub fn new(
        kind: MessageKind,
        severity: Severity,
        message: impl Into<String>,
        details: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            kind,
            severity,
            timestamp: Local::now(),
            message: message.into(),
            details: details.into(),
            location,
        }
    }
}
