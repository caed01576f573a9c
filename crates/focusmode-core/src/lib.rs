//! # Focus Mode Core Library
//!
//! Business logic for the Focus Mode Pomodoro timer, shared by the REST
//! server and the `focusmode` CLI.
//!
//! ## Architecture
//!
//! - **Timer**: an Idle/Running state machine ([`TimerEngine`]) that rotates
//!   between focus and break sessions, plus a [`TimerDriver`] that ticks it
//!   once per second and fans [`Event`]s out to subscribers
//! - **Lifecycle**: the start/end contract ([`SessionLifecycle`]) that the
//!   timer uses to open and close session records, served locally by
//!   [`SessionService`] or remotely by [`HttpLifecycle`]
//! - **Storage**: session records behind [`SessionStore`] (in memory or
//!   SQLite) and TOML-based configuration
//! - **Stats / Export**: dashboard aggregation and CSV/PDF reports
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: timer state machine
//! - [`SessionService`]: validated session start/end
//! - [`MemoryStore`], [`Database`]: session persistence
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod export;
pub mod lifecycle;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, DatabaseError, SessionError, ValidationError};
pub use events::Event;
pub use export::{ExportFormat, Report};
pub use lifecycle::{
    EndSession, HttpLifecycle, SessionLifecycle, SessionService, SessionStarted, StartSession,
};
pub use stats::{DashboardStats, StatsRange};
pub use storage::{Config, Database, MemoryStore, SessionRecord, SessionStore};
pub use timer::{
    SessionType, SettingsProvider, SharedSettings, TimerDriver, TimerEngine, TimerSettings,
    TimerState, TimerStatus,
};
