//! # Stage Events
//!
//! Observability records emitted by every stage invocation. The sequential
//! pipeline consults only the control signal of a stage's last event; the
//! rest is for logging and the UI event stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Control signal attached to a stage event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlSignal {
    /// Proceed to the next stage.
    #[default]
    Continue,
    /// Stop the enclosing pipeline before the remaining stages.
    Escalate,
}

/// An event emitted by a stage while running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    /// Unique event ID
    pub id: String,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Stage that produced this event
    pub author: String,
    /// Human-readable message
    pub message: String,
    /// Control signal consumed by the sequential pipeline
    #[serde(default)]
    pub control: ControlSignal,
    /// Associated data (JSON)
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl StageEvent {
    /// Create a `Continue` event.
    pub fn new(author: &str, message: impl Into<String>) -> Self {
        Self {
            id: event_id(),
            timestamp: Utc::now(),
            author: author.to_string(),
            message: message.into(),
            control: ControlSignal::Continue,
            data: None,
        }
    }

    /// Create an `Escalate` event.
    pub fn escalate(author: &str, message: impl Into<String>) -> Self {
        Self {
            control: ControlSignal::Escalate,
            ..Self::new(author, message)
        }
    }

    /// Attach data to the event.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_escalate(&self) -> bool {
        self.control == ControlSignal::Escalate
    }
}

/// Generate a lightweight unique event ID.
fn event_id() -> String {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos();
    format!("{:x}-{:x}", nanos, rand_u32())
}

/// Simple random number (not cryptographic)
fn rand_u32() -> u32 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    RandomState::new().build_hasher().finish() as u32
}
