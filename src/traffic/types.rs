//! Raw traffic frame records and the deferred decoder contract.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};

/// Direction tag attached to a traffic frame. The decoder may need it to
/// interpret the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrafficDirection {
    In,
    Out,
    Up,
    Down,
    SideA,
    SideB,
    #[default]
    Unknown,
}

impl fmt::Display for TrafficDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrafficDirection::In => "in",
            TrafficDirection::Out => "out",
            TrafficDirection::Up => "up",
            TrafficDirection::Down => "down",
            TrafficDirection::SideA => "side-A",
            TrafficDirection::SideB => "side-B",
            TrafficDirection::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Whether a decoded frame passed its protocol's validity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrafficValidity {
    #[default]
    Unknown,
    Invalid,
    Valid,
}

impl fmt::Display for TrafficValidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrafficValidity::Unknown => "unknown",
            TrafficValidity::Invalid => "invalid",
            TrafficValidity::Valid => "valid",
        };
        write!(f, "{}", s)
    }
}

/// Display-form decode of a raw frame. All fields are empty strings and
/// `Unknown` validity when no decoder was supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedFrame {
    pub validity: TrafficValidity,
    pub source_addr: String,
    pub target_addr: String,
    pub command: String,
    pub detail: String,
    pub checksum: String,
}

/// Synchronous frame decoder. Invoked at drain time on the traffic
/// worker's task; must not block.
pub type TrafficDecoder = Arc<dyn Fn(&[u8], TrafficDirection) -> DecodedFrame + Send + Sync>;

/// An immutable raw traffic frame queued for the traffic drain worker.
///
/// Decoding is deferred to drain time so producers pay no decoding cost
/// on the hot path.
#[derive(Clone)]
pub struct TrafficRecord {
    pub timestamp: DateTime<Local>,
    pub traffic_type: String,
    pub payload: Vec<u8>,
    pub source_interface: String,
    pub direction: TrafficDirection,
    pub decoder: Option<TrafficDecoder>,
}

impl TrafficRecord {
    pub fn new(traffic_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            timestamp: Local::now(),
            traffic_type: traffic_type.into(),
            payload,
            source_interface: String::new(),
            direction: TrafficDirection::Unknown,
            decoder: None,
        }
    }

    pub fn interface(mut self, source_interface: impl Into<String>) -> Self {
        self.source_interface = source_interface.into();
        self
    }

    pub fn direction(mut self, direction: TrafficDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn decoder(mut self, decoder: TrafficDecoder) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Decode the payload with the attached decoder, or produce the empty
    /// decode when none was supplied.
    pub fn decode(&self) -> DecodedFrame {
        match &self.decoder {
            Some(decoder) => decoder(&self.payload, self.direction),
            None => DecodedFrame::default(),
        }
    }
}

impl fmt::Debug for TrafficRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrafficRecord")
            .field("timestamp", &self.timestamp)
            .field("traffic_type", &self.traffic_type)
            .field("payload_len", &self.payload.len())
            .field("source_interface", &self.source_interface)
            .field("direction", &self.direction)
            .field("decoder", &self.decoder.is_some())
            .finish()
    }
}
