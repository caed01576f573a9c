use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::SessionType;

/// A persisted focus or break session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub session_type: SessionType,
    /// Seconds.
    pub duration_requested: u64,
    /// Seconds; set once the session ends.
    pub duration_actual: Option<u64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// A record stays open until its end timestamp is written.
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn apply(&mut self, patch: &SessionPatch) {
        if let Some(ended_at) = patch.ended_at {
            self.ended_at = Some(ended_at);
        }
        if let Some(actual) = patch.duration_actual {
            self.duration_actual = Some(actual);
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }
}

/// Fields of a record that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub user_id: String,
    pub session_type: SessionType,
    pub duration_requested: u64,
    pub started_at: DateTime<Utc>,
}

/// The mutable subset of a record. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_actual: Option<u64>,
    pub completed: Option<bool>,
}
