//! Timer engine implementation.
//!
//! The engine is a tick-driven state machine. It does not own a clock or a
//! thread: each call to `tick()` is one second of countdown, and the caller
//! (normally [`TimerDriver`](super::TimerDriver)) decides when to call it.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --toggle--> Running                         (new record opened)
//! Running --toggle--> Idle                          (pause, record stays open)
//! Running --tick to 0--> Idle(next type)            (record completed)
//! any --reset--> Idle(same type)                    (ended early if Running)
//! any --skip--> Idle(next type)                     (ended early if Running)
//! ```
//!
//! Session records are opened and closed through a [`SessionLifecycle`].
//! A lifecycle failure never blocks the countdown: the run continues
//! local-only and the failure is logged.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::rotation::{self, SessionType};
use super::settings::{SettingsProvider, TimerSettings};
use crate::events::Event;
use crate::lifecycle::{EndSession, SessionLifecycle, StartSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
}

/// Everything the timer needs to survive a reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub is_active: bool,
    /// Seconds. Never above `total_time`.
    pub time_remaining: u64,
    /// Seconds.
    pub total_time: u64,
    pub session_type: SessionType,
    /// Open record in the session store, if the start call succeeded.
    pub session_id: Option<String>,
    /// Focus sessions the rotation has moved off of.
    pub cycle_count: u32,
}

impl TimerState {
    /// A focus session at full length with no history.
    pub fn initial(settings: &TimerSettings) -> Self {
        let total = settings.duration_secs(SessionType::Focus);
        Self {
            is_active: false,
            time_remaining: total,
            total_time: total,
            session_type: SessionType::Focus,
            session_id: None,
            cycle_count: 0,
        }
    }

    pub fn status(&self) -> TimerStatus {
        if self.is_active {
            TimerStatus::Running
        } else {
            TimerStatus::Idle
        }
    }

    /// Seconds counted down so far in the current session.
    pub fn elapsed(&self) -> u64 {
        self.total_time.saturating_sub(self.time_remaining)
    }
}

/// Core timer engine.
pub struct TimerEngine {
    state: TimerState,
    user_id: String,
    settings: Arc<dyn SettingsProvider>,
    lifecycle: Arc<dyn SessionLifecycle>,
    seen_settings_version: u64,
}

impl TimerEngine {
    /// Create an idle engine at the start of a focus session.
    pub fn new(
        user_id: impl Into<String>,
        settings: Arc<dyn SettingsProvider>,
        lifecycle: Arc<dyn SessionLifecycle>,
    ) -> Self {
        let state = TimerState::initial(&settings.settings());
        Self::restore(state, user_id, settings, lifecycle)
    }

    /// Rebuild an engine from persisted state.
    ///
    /// The countdown is never resumed across a reload: `is_active` is forced
    /// off. An exhausted or inconsistent countdown is rewound to full length.
    pub fn restore(
        mut state: TimerState,
        user_id: impl Into<String>,
        settings: Arc<dyn SettingsProvider>,
        lifecycle: Arc<dyn SessionLifecycle>,
    ) -> Self {
        state.is_active = false;
        if state.time_remaining == 0 || state.time_remaining > state.total_time {
            state.time_remaining = state.total_time;
        }
        let seen_settings_version = settings.version();
        Self {
            state,
            user_id: user_id.into(),
            settings,
            lifecycle,
            seen_settings_version,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn status(&self) -> TimerStatus {
        self.state.status()
    }

    pub fn settings(&self) -> TimerSettings {
        self.settings.settings()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state.clone(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or pause.
    ///
    /// Every start, including a resume, opens a fresh session record.
    /// Pausing leaves the record open. A zero-length countdown never starts.
    pub async fn toggle(&mut self) -> Event {
        if self.state.is_active {
            self.state.is_active = false;
            debug!(remaining = self.state.time_remaining, "timer paused");
            return Event::TimerPaused {
                session_type: self.state.session_type,
                remaining_secs: self.state.time_remaining,
                at: Utc::now(),
            };
        }

        self.refresh_settings();

        if self.state.time_remaining == 0 {
            warn!(
                session_type = %self.state.session_type,
                "refusing to start a zero-length session"
            );
            return self.snapshot();
        }

        let request = StartSession {
            user_id: self.user_id.clone(),
            session_type: self.state.session_type.as_str().to_string(),
            duration_requested: self.state.total_time as i64,
            started_at: Utc::now(),
        };
        match self.lifecycle.start_session(request).await {
            Ok(id) => self.state.session_id = Some(id),
            Err(e) => {
                self.state.session_id = None;
                warn!(
                    error = %e,
                    session_type = %self.state.session_type,
                    "could not open session record, running local-only"
                );
            }
        }

        self.state.is_active = true;
        Event::TimerStarted {
            session_type: self.state.session_type,
            session_id: self.state.session_id.clone(),
            remaining_secs: self.state.time_remaining,
            at: Utc::now(),
        }
    }

    /// Count down one second. Returns `Some(Event::TimerCompleted)` when
    /// the session runs out.
    pub async fn tick(&mut self) -> Option<Event> {
        if !self.state.is_active || self.state.time_remaining == 0 {
            return None;
        }
        self.state.time_remaining -= 1;
        if self.state.time_remaining == 0 {
            return Some(self.on_time_expired().await);
        }
        None
    }

    /// Rewind the current session. A running session's record is ended
    /// early; a paused one is left as it is.
    pub async fn reset(&mut self) -> Event {
        if self.state.is_active {
            self.end_open_session(false).await;
        }
        self.state.is_active = false;
        self.state.time_remaining = self.state.total_time;
        self.state.session_id = None;
        Event::TimerReset {
            session_type: self.state.session_type,
            at: Utc::now(),
        }
    }

    /// Move on to the next session type, ending a running session's
    /// record early.
    pub async fn skip(&mut self) -> Event {
        let from = self.state.session_type;
        if self.state.is_active {
            self.end_open_session(false).await;
        }
        let to = self.next_session_type();
        self.set_session_type(to);
        Event::TimerSkipped {
            from,
            to,
            at: Utc::now(),
        }
    }

    /// Manual selection from a front-end: closes the open record as
    /// incomplete before switching.
    pub async fn select_session_type(&mut self, session_type: SessionType) -> Event {
        self.end_open_session(false).await;
        self.set_session_type(session_type)
    }

    /// Switch to `session_type`, idle and at full length.
    ///
    /// Leaving focus counts a cycle. The open record, if any, is forgotten
    /// without being ended; callers that want it closed end it first.
    pub fn set_session_type(&mut self, session_type: SessionType) -> Event {
        let from = self.state.session_type;
        if from == SessionType::Focus && session_type != SessionType::Focus {
            self.state.cycle_count = self.state.cycle_count.saturating_add(1);
        }

        let total = self.settings.settings().duration_secs(session_type);
        self.seen_settings_version = self.settings.version();
        self.state.session_type = session_type;
        self.state.is_active = false;
        self.state.session_id = None;
        self.state.total_time = total;
        self.state.time_remaining = total;

        Event::SessionTypeChanged {
            from,
            to: session_type,
            cycle_count: self.state.cycle_count,
            at: Utc::now(),
        }
    }

    /// Pick up changed durations.
    ///
    /// Applies only to an untouched idle countdown; a paused or running
    /// session keeps its length and the change lands at the next switch.
    /// Returns true when the countdown was resized.
    pub fn refresh_settings(&mut self) -> bool {
        let version = self.settings.version();
        if version == self.seen_settings_version {
            return false;
        }
        if self.state.is_active || self.state.time_remaining != self.state.total_time {
            return false;
        }
        let total = self.settings.settings().duration_secs(self.state.session_type);
        self.state.total_time = total;
        self.state.time_remaining = total;
        self.seen_settings_version = version;
        debug!(total, "settings changed, countdown resized");
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn on_time_expired(&mut self) -> Event {
        let finished = self.state.session_type;
        self.end_open_session(true).await;
        info!(session_type = %finished, "session completed");

        let next = self.next_session_type();
        self.set_session_type(next);

        Event::TimerCompleted {
            session_type: finished,
            next_session_type: next,
            cycle_count: self.state.cycle_count,
            auto_start: self.settings.settings().auto_start,
            at: Utc::now(),
        }
    }

    /// Decided on the stored count, before leaving focus bumps it.
    fn next_session_type(&self) -> SessionType {
        let interval = self.settings.settings().long_break_interval;
        rotation::next_type(self.state.session_type, self.state.cycle_count, interval)
    }

    /// Best-effort end of the open record, computed from the current state.
    async fn end_open_session(&self, completed: bool) {
        let Some(session_id) = self.state.session_id.clone() else {
            return;
        };
        let request = EndSession {
            session_id: session_id.clone(),
            ended_at: Utc::now(),
            duration_actual: self.state.elapsed() as i64,
            completed,
        };
        if let Err(e) = self.lifecycle.end_session(request).await {
            warn!(error = %e, %session_id, "could not end session record");
        }
    }
}
