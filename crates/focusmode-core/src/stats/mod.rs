//! Statistics for the focus dashboard.
//!
//! The aggregator is a pure function over a user's session records; callers
//! fetch records with [`query_start`] as the lower bound and pass `now`.

mod dashboard;

pub use dashboard::{
    avg_session, completed_cycles, current_streak, query_start, summarize, today_minutes,
    DashboardStats, StatsRange, LAST_SESSIONS_LIMIT, STREAK_LOOKBACK_DAYS,
};
