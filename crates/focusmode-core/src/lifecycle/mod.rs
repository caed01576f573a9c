//! Session lifecycle: the start/end contract between a timer and a store.
//!
//! [`SessionService`] validates requests and writes them to a
//! [`SessionStore`]. [`HttpLifecycle`] speaks the same contract to a remote
//! server. The timer only sees the [`SessionLifecycle`] trait.

mod http;

pub use http::HttpLifecycle;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{SessionError, ValidationError};
use crate::storage::{NewSession, SessionPatch, SessionRecord, SessionStore};
use crate::timer::SessionType;

/// Body of `POST /start`.
///
/// Fields stay loosely typed so that bad values reach validation instead of
/// failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSession {
    pub user_id: String,
    pub session_type: String,
    /// Seconds.
    pub duration_requested: i64,
    pub started_at: DateTime<Utc>,
}

/// Body of `POST /end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSession {
    pub session_id: String,
    pub ended_at: DateTime<Utc>,
    /// Seconds.
    pub duration_actual: i64,
    pub completed: bool,
}

/// Response of `POST /start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStarted {
    pub session_id: String,
}

#[async_trait]
pub trait SessionLifecycle: Send + Sync {
    /// Open a new session record and return its id.
    async fn start_session(&self, request: StartSession) -> Result<String, SessionError>;

    /// Close the record named by `request.session_id`.
    async fn end_session(&self, request: EndSession) -> Result<SessionRecord, SessionError>;
}

/// Validating front of a [`SessionStore`].
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// # Errors
    /// `Validation` for a non-positive duration, an unknown session type or
    /// an empty user id. Store failures propagate as `Storage`.
    pub fn start(&self, request: StartSession) -> Result<String, SessionError> {
        let session_type: SessionType = request.session_type.parse()?;
        if request.duration_requested <= 0 {
            return Err(ValidationError::invalid(
                "durationRequested",
                format!("must be positive, got {}", request.duration_requested),
            )
            .into());
        }
        if request.user_id.trim().is_empty() {
            return Err(ValidationError::invalid("userId", "must not be empty").into());
        }

        let id = self.store.create(NewSession {
            user_id: request.user_id,
            session_type,
            duration_requested: request.duration_requested as u64,
            started_at: request.started_at,
        })?;
        info!(session_id = %id, %session_type, "session started");
        Ok(id)
    }

    /// # Errors
    /// `Validation` for a negative actual duration, `NotFound` for an
    /// unknown id. Repeated calls overwrite the previous end.
    pub fn end(&self, request: EndSession) -> Result<SessionRecord, SessionError> {
        if request.duration_actual < 0 {
            return Err(ValidationError::invalid(
                "durationActual",
                format!("must not be negative, got {}", request.duration_actual),
            )
            .into());
        }

        let patch = SessionPatch {
            ended_at: Some(request.ended_at),
            duration_actual: Some(request.duration_actual as u64),
            completed: Some(request.completed),
        };
        let record = self
            .store
            .update(&request.session_id, patch)?
            .ok_or_else(|| SessionError::not_found(&request.session_id))?;
        info!(
            session_id = %record.id,
            completed = record.completed,
            duration_actual = request.duration_actual,
            "session ended"
        );
        Ok(record)
    }
}

#[async_trait]
impl SessionLifecycle for SessionService {
    async fn start_session(&self, request: StartSession) -> Result<String, SessionError> {
        self.start(request)
    }

    async fn end_session(&self, request: EndSession) -> Result<SessionRecord, SessionError> {
        self.end(request)
    }
}
