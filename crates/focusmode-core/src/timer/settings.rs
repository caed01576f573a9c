//! Timer settings and the provider seam the engine reads them through.
//!
//! The engine never reaches into config files itself. It asks its
//! [`SettingsProvider`] whenever it needs a duration, and compares
//! [`SettingsProvider::version`] to notice changes made by its owner.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::rotation::SessionType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    /// Minutes.
    pub focus_min: u32,
    /// Minutes.
    pub short_break_min: u32,
    /// Minutes.
    pub long_break_min: u32,
    /// Focus sessions per long break.
    pub long_break_interval: u32,
    pub auto_start: bool,
    pub auto_start_delay_secs: u64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_min: 25,
            short_break_min: 5,
            long_break_min: 15,
            long_break_interval: 4,
            auto_start: false,
            auto_start_delay_secs: 3,
        }
    }
}

impl TimerSettings {
    pub fn duration_min(&self, session_type: SessionType) -> u32 {
        match session_type {
            SessionType::Focus => self.focus_min,
            SessionType::ShortBreak => self.short_break_min,
            SessionType::LongBreak => self.long_break_min,
        }
    }

    /// Configured length of a session in seconds.
    pub fn duration_secs(&self, session_type: SessionType) -> u64 {
        u64::from(self.duration_min(session_type)).saturating_mul(60)
    }

    pub fn auto_start_delay(&self) -> Duration {
        Duration::from_secs(self.auto_start_delay_secs)
    }
}

/// Read-only access to timer settings.
pub trait SettingsProvider: Send + Sync {
    fn settings(&self) -> TimerSettings;

    /// Bumped by the owner on every change. Constant for static settings.
    fn version(&self) -> u64 {
        0
    }
}

impl SettingsProvider for TimerSettings {
    fn settings(&self) -> TimerSettings {
        self.clone()
    }
}

/// Settings that the owning component may replace at runtime.
#[derive(Debug, Default)]
pub struct SharedSettings {
    inner: RwLock<TimerSettings>,
    version: AtomicU64,
}

impl SharedSettings {
    pub fn new(settings: TimerSettings) -> Self {
        Self {
            inner: RwLock::new(settings),
            version: AtomicU64::new(0),
        }
    }

    pub fn replace(&self, settings: TimerSettings) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = settings;
        self.version.fetch_add(1, Ordering::AcqRel);
    }
}

impl SettingsProvider for SharedSettings {
    fn settings(&self) -> TimerSettings {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_converted_to_seconds() {
        let s = TimerSettings::default();
        assert_eq!(s.duration_secs(SessionType::Focus), 1500);
        assert_eq!(s.duration_secs(SessionType::ShortBreak), 300);
        assert_eq!(s.duration_secs(SessionType::LongBreak), 900);
    }

    #[test]
    fn replace_bumps_version() {
        let shared = SharedSettings::new(TimerSettings::default());
        assert_eq!(shared.version(), 0);
        shared.replace(TimerSettings {
            focus_min: 50,
            ..TimerSettings::default()
        });
        assert_eq!(shared.version(), 1);
        assert_eq!(shared.settings().focus_min, 50);
    }
}
