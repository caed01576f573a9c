//! Dashboard statistics derived from session records.
//!
//! Everything here is a pure function of a record snapshot and a reference
//! "now". Calendar-day questions are answered in the time zone of `now`,
//! so the server passes `Local::now()` and tests can pin a zone.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::storage::SessionRecord;
use crate::timer::SessionType;

/// How far back the streak walk looks.
pub const STREAK_LOOKBACK_DAYS: u32 = 30;

/// Cap on `last_sessions`.
pub const LAST_SESSIONS_LIMIT: usize = 10;

/// Window selected on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsRange {
    #[default]
    Today,
    Week,
    Month,
}

impl StatsRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsRange::Today => "today",
            StatsRange::Week => "week",
            StatsRange::Month => "month",
        }
    }

    /// First instant inside the range: local midnight today, 7 days back
    /// or 30 days back.
    pub fn start<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Utc> {
        let midnight = start_of_day(now);
        match self {
            StatsRange::Today => midnight,
            StatsRange::Week => midnight - Duration::days(7),
            StatsRange::Month => midnight - Duration::days(30),
        }
    }
}

impl fmt::Display for StatsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatsRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(StatsRange::Today),
            "week" => Ok(StatsRange::Week),
            "month" => Ok(StatsRange::Month),
            other => Err(ValidationError::invalid(
                "range",
                format!("expected today, week or month, got '{other}'"),
            )),
        }
    }
}

/// Response body of `GET /stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub today_minutes: u64,
    pub completed_cycles: u64,
    pub current_streak: u32,
    pub avg_session: u64,
    pub last_sessions: Vec<SessionRecord>,
}

fn local_date<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| now.timezone().from_local_datetime(&midnight).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc) - Duration::hours(24))
}

fn secs_to_minutes(secs: f64) -> u64 {
    (secs / 60.0).round() as u64
}

fn completed(records: &[SessionRecord]) -> impl Iterator<Item = &SessionRecord> {
    records.iter().filter(|r| r.completed)
}

/// Minutes of completed sessions started on the current calendar day.
pub fn today_minutes<Tz: TimeZone>(records: &[SessionRecord], now: &DateTime<Tz>) -> u64 {
    let tz = now.timezone();
    let today = now.date_naive();
    let secs: u64 = completed(records)
        .filter(|r| local_date(&r.started_at, &tz) == today)
        .map(|r| r.duration_actual.unwrap_or(0))
        .sum();
    secs_to_minutes(secs as f64)
}

/// Completed focus sessions.
pub fn completed_cycles(records: &[SessionRecord]) -> u64 {
    completed(records)
        .filter(|r| r.session_type == SessionType::Focus)
        .count() as u64
}

/// Consecutive days with at least one completed session, walking back from
/// today. A day without one ends the streak, so no session today means 0.
pub fn current_streak<Tz: TimeZone>(records: &[SessionRecord], now: &DateTime<Tz>) -> u32 {
    let tz = now.timezone();
    let days: BTreeSet<NaiveDate> = completed(records)
        .map(|r| local_date(&r.started_at, &tz))
        .collect();

    let today = now.date_naive();
    let mut streak = 0;
    for offset in 0..STREAK_LOOKBACK_DAYS {
        let Some(day) = today.checked_sub_days(chrono::Days::new(u64::from(offset))) else {
            break;
        };
        if !days.contains(&day) {
            break;
        }
        streak += 1;
    }
    streak
}

/// Mean actual length of completed sessions in minutes, 0 when there are none.
pub fn avg_session(records: &[SessionRecord]) -> u64 {
    let (count, total) = completed(records).fold((0u64, 0u64), |(n, sum), r| {
        (n + 1, sum + r.duration_actual.unwrap_or(0))
    });
    if count == 0 {
        return 0;
    }
    secs_to_minutes(total as f64 / count as f64)
}

/// Build the dashboard for `range`.
///
/// `records` should cover at least the range and the streak lookback; cycle
/// count, average and recent sessions only consider records inside the range.
pub fn summarize<Tz: TimeZone>(
    records: &[SessionRecord],
    range: StatsRange,
    now: &DateTime<Tz>,
) -> DashboardStats {
    let start = range.start(now);
    let mut in_range: Vec<SessionRecord> = records
        .iter()
        .filter(|r| r.started_at >= start)
        .cloned()
        .collect();
    in_range.sort_by(|a, b| b.started_at.cmp(&a.started_at));

    DashboardStats {
        today_minutes: today_minutes(records, now),
        completed_cycles: completed_cycles(&in_range),
        current_streak: current_streak(records, now),
        avg_session: avg_session(&in_range),
        last_sessions: in_range.into_iter().take(LAST_SESSIONS_LIMIT).collect(),
    }
}

/// Earliest `started_at` that [`summarize`] needs for `range`.
pub fn query_start<Tz: TimeZone>(range: StatsRange, now: &DateTime<Tz>) -> DateTime<Utc> {
    let lookback = start_of_day(now) - Duration::days(i64::from(STREAK_LOOKBACK_DAYS));
    range.start(now).min(lookback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn record(
        session_type: SessionType,
        started_at: DateTime<Utc>,
        actual: Option<u64>,
        completed: bool,
    ) -> SessionRecord {
        SessionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: "u1".into(),
            session_type,
            duration_requested: 1500,
            duration_actual: actual,
            started_at,
            ended_at: actual.map(|a| started_at + Duration::seconds(a as i64)),
            completed,
            created_at: started_at,
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn today_minutes_uses_calendar_day_not_rolling_window() {
        let now = noon();
        let records = vec![
            record(SessionType::Focus, now - Duration::hours(2), Some(1500), true),
            record(SessionType::ShortBreak, now - Duration::hours(1), Some(300), true),
            // 13 hours ago is yesterday, though inside 24h.
            record(SessionType::Focus, now - Duration::hours(13), Some(1500), true),
            // Early stops do not count.
            record(SessionType::Focus, now - Duration::minutes(30), Some(600), false),
        ];
        assert_eq!(today_minutes(&records, &now), 30);
    }

    #[test]
    fn today_follows_the_time_zone_of_now() {
        let utc_now = noon();
        // 02:00 UTC is still the previous evening in UTC-5.
        let early = Utc.with_ymd_and_hms(2026, 3, 10, 2, 0, 0).unwrap();
        let records = vec![record(SessionType::Focus, early, Some(1500), true)];

        assert_eq!(today_minutes(&records, &utc_now), 25);
        let eastern = utc_now.with_timezone(&FixedOffset::west_opt(5 * 3600).unwrap());
        assert_eq!(today_minutes(&records, &eastern), 0);
    }

    #[test]
    fn completed_cycles_counts_completed_focus_only() {
        let now = noon();
        let records = vec![
            record(SessionType::Focus, now, Some(1500), true),
            record(SessionType::Focus, now, Some(1500), true),
            record(SessionType::Focus, now, Some(200), false),
            record(SessionType::LongBreak, now, Some(900), true),
        ];
        assert_eq!(completed_cycles(&records), 2);
    }

    #[test]
    fn streak_stops_at_first_gap() {
        let now = noon();
        let records = vec![
            record(SessionType::Focus, now - Duration::hours(1), Some(1500), true),
            record(SessionType::Focus, now - Duration::days(1), Some(1500), true),
            // gap at day-2
            record(SessionType::Focus, now - Duration::days(3), Some(1500), true),
        ];
        assert_eq!(current_streak(&records, &now), 2);
    }

    #[test]
    fn streak_is_zero_without_session_today() {
        let now = noon();
        let records = vec![record(
            SessionType::Focus,
            now - Duration::days(1),
            Some(1500),
            true,
        )];
        assert_eq!(current_streak(&records, &now), 0);
    }

    #[test]
    fn streak_ignores_incomplete_sessions_and_caps_at_lookback() {
        let now = noon();
        let mut records: Vec<_> = (0..40)
            .map(|d| record(SessionType::Focus, now - Duration::days(d), Some(1500), true))
            .collect();
        assert_eq!(current_streak(&records, &now), STREAK_LOOKBACK_DAYS);

        records[1].completed = false;
        assert_eq!(current_streak(&records, &now), 1);
    }

    #[test]
    fn avg_session_of_nothing_is_zero() {
        assert_eq!(avg_session(&[]), 0);
        let now = noon();
        let open = vec![record(SessionType::Focus, now, None, false)];
        assert_eq!(avg_session(&open), 0);
    }

    #[test]
    fn avg_session_rounds_mean_minutes() {
        let now = noon();
        let records = vec![
            record(SessionType::Focus, now, Some(1500), true),
            record(SessionType::ShortBreak, now, Some(300), true),
            record(SessionType::Focus, now, Some(1620), true),
        ];
        // (1500 + 300 + 1620) / 3 = 1140s = 19 min
        assert_eq!(avg_session(&records), 19);
    }

    #[test]
    fn summarize_limits_range_and_recent_list() {
        let now = noon();
        let mut records: Vec<_> = (0..15)
            .map(|i| {
                record(
                    SessionType::Focus,
                    now - Duration::minutes(30 * i),
                    Some(1500),
                    true,
                )
            })
            .collect();
        records.push(record(
            SessionType::Focus,
            now - Duration::days(10),
            Some(1500),
            true,
        ));

        let week = summarize(&records, StatsRange::Week, &now);
        assert_eq!(week.completed_cycles, 15);
        assert_eq!(week.last_sessions.len(), LAST_SESSIONS_LIMIT);
        assert!(week
            .last_sessions
            .windows(2)
            .all(|w| w[0].started_at >= w[1].started_at));

        let month = summarize(&records, StatsRange::Month, &now);
        assert_eq!(month.completed_cycles, 16);
        assert_eq!(month.avg_session, 25);
        assert_eq!(month.current_streak, 1);
    }

    #[test]
    fn week_starts_at_midnight_seven_days_back() {
        let now = noon();
        let boundary = Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap();
        assert_eq!(StatsRange::Week.start(&now), boundary);

        let records = vec![
            // Early morning on the boundary day is inside the week.
            record(SessionType::Focus, boundary + Duration::hours(1), Some(1500), true),
            record(SessionType::Focus, boundary - Duration::hours(1), Some(1500), true),
        ];
        let week = summarize(&records, StatsRange::Week, &now);
        assert_eq!(week.completed_cycles, 1);
        assert_eq!(week.last_sessions.len(), 1);
    }

    #[test]
    fn month_start_follows_the_time_zone_of_now() {
        let tokyo = noon().with_timezone(&FixedOffset::east_opt(9 * 3600).unwrap());
        let expected = Utc.with_ymd_and_hms(2026, 2, 7, 15, 0, 0).unwrap();
        assert_eq!(StatsRange::Month.start(&tokyo), expected);
    }

    #[test]
    fn query_start_covers_streak_lookback() {
        let now = noon();
        let start = query_start(StatsRange::Today, &now);
        assert!(start <= now - Duration::days(30));
        assert!(query_start(StatsRange::Month, &now) <= StatsRange::Month.start(&now));
    }

    #[test]
    fn range_parses_wire_names() {
        assert_eq!("week".parse::<StatsRange>().unwrap(), StatsRange::Week);
        assert!("year".parse::<StatsRange>().is_err());
    }
}
