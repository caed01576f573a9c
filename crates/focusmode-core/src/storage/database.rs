//! SQLite-based session storage.
//!
//! Provides persistent storage for:
//! - Session records (same contract as [`MemoryStore`](super::MemoryStore))
//! - Key-value store for client state (the persisted timer)

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{data_dir, NewSession, SessionPatch, SessionRecord, SessionStore};
use crate::error::DatabaseError;
use crate::timer::SessionType;

const SESSION_COLUMNS: &str = "id, user_id, session_type, duration_requested, duration_actual,
     started_at, ended_at, completed, created_at";

/// SQLite database for session storage.
///
/// The connection sits behind a mutex so one `Database` can be shared
/// between request handlers.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/focusmode/focusmode.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("focusmode.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id                 TEXT PRIMARY KEY,
                    user_id            TEXT NOT NULL,
                    session_type       TEXT NOT NULL,
                    duration_requested INTEGER NOT NULL,
                    duration_actual    INTEGER,
                    started_at         TEXT NOT NULL,
                    ended_at           TEXT,
                    completed          INTEGER NOT NULL DEFAULT 0,
                    created_at         TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_user_started ON sessions(user_id, started_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let conn = self.conn();
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    let session_type: String = row.get(2)?;
    let session_type = session_type.parse::<SessionType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let started_at: String = row.get(5)?;
    let ended_at: Option<String> = row.get(6)?;
    let created_at: String = row.get(8)?;

    Ok(SessionRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        session_type,
        duration_requested: row.get(3)?,
        duration_actual: row.get(4)?,
        started_at: parse_ts(5, &started_at)?,
        ended_at: ended_at.as_deref().map(|s| parse_ts(6, s)).transpose()?,
        completed: row.get(7)?,
        created_at: parse_ts(8, &created_at)?,
    })
}

fn corrupt(err: rusqlite::Error) -> DatabaseError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(_, _, source) => DatabaseError::CorruptRow {
            table: "sessions".into(),
            message: source.to_string(),
        },
        other => other.into(),
    }
}

impl SessionStore for Database {
    fn create(&self, session: NewSession) -> Result<String, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        self.conn().execute(
            "INSERT INTO sessions (id, user_id, session_type, duration_requested, started_at, completed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
            params![
                id,
                session.user_id,
                session.session_type.as_str(),
                session.duration_requested,
                ts(session.started_at),
                ts(Utc::now()),
            ],
        )?;
        Ok(id)
    }

    fn update(&self, id: &str, patch: SessionPatch) -> Result<Option<SessionRecord>, DatabaseError> {
        let changed = self.conn().execute(
            "UPDATE sessions SET
                ended_at = COALESCE(?2, ended_at),
                duration_actual = COALESCE(?3, duration_actual),
                completed = COALESCE(?4, completed)
             WHERE id = ?1",
            params![id, patch.ended_at.map(ts), patch.duration_actual, patch.completed],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.get(id)
    }

    fn get(&self, id: &str) -> Result<Option<SessionRecord>, DatabaseError> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
            params![id],
            session_from_row,
        )
        .optional()
        .map_err(corrupt)
    }

    fn query_by_user(
        &self,
        user_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<SessionRecord>, DatabaseError> {
        let conn = self.conn();
        if start.is_none() && end.is_none() {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE user_id = ?1
                 ORDER BY started_at DESC"
            ))?;
            let rows = stmt.query_map(params![user_id], session_from_row)?;
            return rows.collect::<rusqlite::Result<Vec<_>>>().map_err(corrupt);
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE user_id = ?1
               AND (?2 IS NULL OR started_at >= ?2)
               AND (?3 IS NULL OR started_at <= ?3)"
        ))?;
        let rows = stmt.query_map(
            params![user_id, start.map(ts), end.map(ts)],
            session_from_row,
        )?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(corrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn focus(user: &str, started_at: DateTime<Utc>) -> NewSession {
        NewSession {
            user_id: user.into(),
            session_type: SessionType::Focus,
            duration_requested: 1500,
            started_at,
        }
    }

    #[test]
    fn create_and_get_round_trip_timestamps() {
        let db = Database::open_memory().unwrap();
        let started = Utc::now() - Duration::minutes(25);
        let id = db.create(focus("u1", started)).unwrap();

        let record = db.get(&id).unwrap().unwrap();
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.session_type, SessionType::Focus);
        assert_eq!(record.duration_requested, 1500);
        assert!(record.is_open());
        assert_eq!(ts(record.started_at), ts(started));
    }

    #[test]
    fn update_only_touches_patched_fields() {
        let db = Database::open_memory().unwrap();
        let id = db.create(focus("u1", Utc::now())).unwrap();

        let record = db
            .update(
                &id,
                SessionPatch {
                    duration_actual: Some(600),
                    ..SessionPatch::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(record.duration_actual, Some(600));
        assert!(record.is_open());
        assert!(!record.completed);

        let record = db
            .update(
                &id,
                SessionPatch {
                    ended_at: Some(Utc::now()),
                    completed: Some(true),
                    ..SessionPatch::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(record.duration_actual, Some(600));
        assert!(record.completed);
        assert!(!record.is_open());
    }

    #[test]
    fn update_unknown_id_is_none() {
        let db = Database::open_memory().unwrap();
        assert!(db.update("nope", SessionPatch::default()).unwrap().is_none());
    }

    #[test]
    fn query_by_user_orders_and_filters() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        for hours in [2, 9, 1, 30] {
            db.create(focus("u1", now - Duration::hours(hours))).unwrap();
        }
        db.create(focus("u2", now)).unwrap();

        let all = db.query_by_user("u1", None, None).unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].started_at >= w[1].started_at));

        let recent = db
            .query_by_user("u1", Some(now - Duration::hours(10)), None)
            .unwrap();
        assert_eq!(recent.len(), 3);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn file_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.db");
        let id = {
            let db = Database::open_at(&path).unwrap();
            db.create(focus("u1", Utc::now())).unwrap()
        };
        let db = Database::open_at(&path).unwrap();
        assert!(db.get(&id).unwrap().is_some());
    }
}
