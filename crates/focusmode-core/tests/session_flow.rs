//! Integration tests for the timer → lifecycle → store → stats path.
//!
//! Every scenario runs against both store implementations to check that
//! they honour the same contract.

use std::sync::Arc;

use chrono::{Duration, Utc};
use focusmode_core::stats::{self, StatsRange};
use focusmode_core::storage::{NewSession, SessionPatch};
use focusmode_core::{
    Database, MemoryStore, SessionService, SessionStore, SessionType, TimerEngine, TimerSettings,
};
use tempfile::TempDir;

fn stores() -> Vec<(&'static str, Arc<dyn SessionStore>)> {
    vec![
        ("memory", Arc::new(MemoryStore::new())),
        ("sqlite", Arc::new(Database::open_memory().unwrap())),
    ]
}

fn short_settings() -> TimerSettings {
    TimerSettings {
        focus_min: 1,
        short_break_min: 1,
        long_break_min: 2,
        ..TimerSettings::default()
    }
}

#[tokio::test]
async fn test_full_focus_session_is_recorded_as_completed() {
    for (name, store) in stores() {
        let service = Arc::new(SessionService::new(store.clone()));
        let mut engine = TimerEngine::new("u1", Arc::new(short_settings()), service);

        engine.toggle().await;
        for _ in 0..60 {
            engine.tick().await;
        }

        let records = store.query_by_user("u1", None, None).unwrap();
        assert_eq!(records.len(), 1, "{name}");
        assert!(records[0].completed, "{name}");
        assert_eq!(records[0].duration_actual, Some(60), "{name}");
        assert_eq!(engine.state().session_type, SessionType::ShortBreak, "{name}");
        assert_eq!(engine.state().cycle_count, 1, "{name}");
        assert!(engine.state().session_id.is_none(), "{name}");
    }
}

#[tokio::test]
async fn test_reset_records_partial_session() {
    for (name, store) in stores() {
        let service = Arc::new(SessionService::new(store.clone()));
        let mut engine = TimerEngine::new("u1", Arc::new(short_settings()), service);

        engine.toggle().await;
        for _ in 0..20 {
            engine.tick().await;
        }
        engine.reset().await;

        let records = store.query_by_user("u1", None, None).unwrap();
        assert_eq!(records.len(), 1, "{name}");
        assert!(!records[0].completed, "{name}");
        assert_eq!(records[0].duration_actual, Some(20), "{name}");
        assert_eq!(engine.state().time_remaining, 60, "{name}");
        assert_eq!(engine.state().session_type, SessionType::Focus, "{name}");
    }
}

#[tokio::test]
async fn test_fifth_focus_reaches_long_break() {
    for (name, store) in stores() {
        let service = Arc::new(SessionService::new(store.clone()));
        let mut engine = TimerEngine::new("u1", Arc::new(short_settings()), service);

        let mut seen = Vec::new();
        for _ in 0..9 {
            engine.toggle().await;
            while engine.state().is_active {
                engine.tick().await;
            }
            seen.push(engine.state().session_type);
        }

        assert_eq!(seen[6], SessionType::ShortBreak, "{name}");
        assert_eq!(seen[8], SessionType::LongBreak, "{name}");
        assert_eq!(engine.state().total_time, 120, "{name}");
        let focus_done = store
            .query_by_user("u1", None, None)
            .unwrap()
            .iter()
            .filter(|r| r.completed && r.session_type == SessionType::Focus)
            .count();
        assert_eq!(focus_done, 5, "{name}");
    }
}

#[test]
fn test_unwindowed_query_is_newest_first() {
    let now = Utc::now();
    for (name, store) in stores() {
        for hours in [5, 1, 3] {
            store
                .create(NewSession {
                    user_id: "u1".into(),
                    session_type: SessionType::Focus,
                    duration_requested: 1500,
                    started_at: now - Duration::hours(hours),
                })
                .unwrap();
        }
        store
            .create(NewSession {
                user_id: "someone-else".into(),
                session_type: SessionType::Focus,
                duration_requested: 1500,
                started_at: now,
            })
            .unwrap();

        let records = store.query_by_user("u1", None, None).unwrap();
        let ages: Vec<i64> = records
            .iter()
            .map(|r| (now - r.started_at).num_hours())
            .collect();
        assert_eq!(ages, vec![1, 3, 5], "{name}");

        let windowed = store
            .query_by_user("u1", Some(now - Duration::hours(4)), None)
            .unwrap();
        assert_eq!(windowed.len(), 2, "{name}");
    }
}

#[test]
fn test_update_unknown_id_is_none() {
    for (name, store) in stores() {
        let patched = store
            .update(
                "missing",
                SessionPatch {
                    completed: Some(true),
                    ..SessionPatch::default()
                },
            )
            .unwrap();
        assert!(patched.is_none(), "{name}");
    }
}

#[tokio::test]
async fn test_stats_from_recorded_sessions() {
    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    let service = Arc::new(SessionService::new(store.clone()));
    let mut engine = TimerEngine::new("u1", Arc::new(short_settings()), service);

    // focus (complete) then short break (complete)
    for _ in 0..2 {
        engine.toggle().await;
        while engine.state().is_active {
            engine.tick().await;
        }
    }

    let now = Utc::now();
    let records = store
        .query_by_user("u1", Some(stats::query_start(StatsRange::Today, &now)), None)
        .unwrap();
    let dashboard = stats::summarize(&records, StatsRange::Today, &now);
    assert_eq!(dashboard.completed_cycles, 1);
    assert_eq!(dashboard.today_minutes, 2);
    assert_eq!(dashboard.avg_session, 1);
    assert_eq!(dashboard.current_streak, 1);
    assert_eq!(dashboard.last_sessions.len(), 2);
}

#[test]
fn test_sqlite_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("focusmode.db");

    let id = {
        let db = Database::open_at(&path).unwrap();
        db.create(NewSession {
            user_id: "u1".into(),
            session_type: SessionType::LongBreak,
            duration_requested: 900,
            started_at: Utc::now(),
        })
        .unwrap()
    };

    let db = Database::open_at(&path).unwrap();
    let record = db.get(&id).unwrap().unwrap();
    assert_eq!(record.session_type, SessionType::LongBreak);
    assert!(record.is_open());
}
