mod config;
pub mod database;
pub mod memory;
mod record;

pub use config::{Config, ScheduleConfig, ServerConfig};
pub use database::Database;
pub use memory::MemoryStore;
pub use record::{NewSession, SessionPatch, SessionRecord};

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::{ConfigError, DatabaseError};

/// Storage contract for session records.
///
/// Implementations give no transactional guarantee: concurrent updates of
/// the same id race and the last write wins.
pub trait SessionStore: Send + Sync {
    /// Insert a record, assigning a fresh id and stamping `created_at`.
    fn create(&self, session: NewSession) -> Result<String, DatabaseError>;

    /// Apply `patch` to the record with `id`. `Ok(None)` if there is none.
    fn update(&self, id: &str, patch: SessionPatch) -> Result<Option<SessionRecord>, DatabaseError>;

    fn get(&self, id: &str) -> Result<Option<SessionRecord>, DatabaseError>;

    /// Records owned by `user_id`.
    ///
    /// Without a window the result is sorted by `started_at`, newest first.
    /// With a window (either bound set) the records are filtered on
    /// `started_at` but come back in no particular order.
    fn query_by_user(
        &self,
        user_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<SessionRecord>, DatabaseError>;
}

pub(crate) fn in_window(
    at: DateTime<Utc>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> bool {
    start.map_or(true, |s| at >= s) && end.map_or(true, |e| at <= e)
}

/// Returns `~/.config/focusmode[-dev]/` based on FOCUSMODE_ENV.
///
/// Set FOCUSMODE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSMODE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusmode-dev")
    } else {
        base_dir.join("focusmode")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
