use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{SessionType, TimerState};

/// Every timer state change produces an Event.
/// Front-ends subscribe to them to render, play sounds and notify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        session_type: SessionType,
        /// `None` when the lifecycle was unreachable and the run is local-only.
        session_id: Option<String>,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        session_type: SessionType,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A session ran to zero. This is the completion signal.
    TimerCompleted {
        session_type: SessionType,
        next_session_type: SessionType,
        cycle_count: u32,
        /// The owner should start the next session after the configured delay.
        auto_start: bool,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: SessionType,
        to: SessionType,
        at: DateTime<Utc>,
    },
    TimerReset {
        session_type: SessionType,
        at: DateTime<Utc>,
    },
    SessionTypeChanged {
        from: SessionType,
        to: SessionType,
        cycle_count: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        at: DateTime<Utc>,
    },
}
