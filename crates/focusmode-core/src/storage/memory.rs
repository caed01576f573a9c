//! In-process session store backed by a `HashMap`.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{in_window, NewSession, SessionPatch, SessionRecord, SessionStore};
use crate::error::DatabaseError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, SessionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn create(&self, session: NewSession) -> Result<String, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        let record = SessionRecord {
            id: id.clone(),
            user_id: session.user_id,
            session_type: session.session_type,
            duration_requested: session.duration_requested,
            duration_actual: None,
            started_at: session.started_at,
            ended_at: None,
            completed: false,
            created_at: Utc::now(),
        };
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), record);
        Ok(id)
    }

    fn update(&self, id: &str, patch: SessionPatch) -> Result<Option<SessionRecord>, DatabaseError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        Ok(records.get_mut(id).map(|record| {
            record.apply(&patch);
            record.clone()
        }))
    }

    fn get(&self, id: &str) -> Result<Option<SessionRecord>, DatabaseError> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned())
    }

    fn query_by_user(
        &self,
        user_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<SessionRecord>, DatabaseError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<SessionRecord> = records
            .values()
            .filter(|r| r.user_id == user_id && in_window(r.started_at, start, end))
            .cloned()
            .collect();
        if start.is_none() && end.is_none() {
            out.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        }
        Ok(out)
    }
}
