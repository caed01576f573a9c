//! Session reports for download.

pub mod csv;
pub mod pdf;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::stats::{self, StatsRange};
use crate::storage::SessionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(ValidationError::invalid(
                "format",
                format!("expected csv or pdf, got '{other}'"),
            )),
        }
    }
}

/// A rendered report ready to send or write to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

fn filename_safe(user_id: &str) -> String {
    user_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Render the records of `range` for `user_id`.
///
/// `records` may extend past the range; only records started inside it are
/// listed, newest first.
pub fn render<Tz: TimeZone>(
    format: ExportFormat,
    user_id: &str,
    range: StatsRange,
    records: &[SessionRecord],
    now: &DateTime<Tz>,
) -> Report
where
    Tz::Offset: fmt::Display,
{
    let start = range.start(now);
    let mut rows: Vec<SessionRecord> = records
        .iter()
        .filter(|r| r.started_at >= start)
        .cloned()
        .collect();
    rows.sort_by(|a, b| b.started_at.cmp(&a.started_at));

    let bytes = match format {
        ExportFormat::Csv => csv::render(&rows).into_bytes(),
        ExportFormat::Pdf => {
            let summary = stats::summarize(records, range, now);
            let title = format!(
                "Focus sessions for {user_id} ({range}, {})",
                now.format("%Y-%m-%d")
            );
            pdf::render(&title, &summary, &rows)
        }
    };

    Report {
        filename: format!(
            "focus-sessions-{}-{range}-{}.{}",
            filename_safe(user_id),
            now.format("%Y%m%d"),
            format.extension()
        ),
        content_type: format.content_type(),
        bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::SessionType;
    use chrono::{Duration, Utc};

    fn records(now: DateTime<Utc>) -> Vec<SessionRecord> {
        [1, 2, 40]
            .into_iter()
            .map(|days_ago| {
                let started = now - Duration::days(days_ago);
                SessionRecord {
                    id: format!("s-{days_ago}"),
                    user_id: "u1".into(),
                    session_type: SessionType::Focus,
                    duration_requested: 1500,
                    duration_actual: Some(1500),
                    started_at: started,
                    ended_at: Some(started + Duration::seconds(1500)),
                    completed: true,
                    created_at: started,
                }
            })
            .collect()
    }

    #[test]
    fn csv_report_lists_range_newest_first() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let report = render(ExportFormat::Csv, "u1", StatsRange::Week, &records(now), &now);

        assert_eq!(report.filename, "focus-sessions-u1-week-20260310.csv");
        assert!(report.content_type.starts_with("text/csv"));
        let text = String::from_utf8(report.bytes).unwrap();
        let ids: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(ids, vec!["s-1", "s-2"]);
    }

    #[test]
    fn pdf_report_is_a_pdf() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let report = render(ExportFormat::Pdf, "a b/c", StatsRange::Month, &records(now), &now);
        assert!(report.bytes.starts_with(b"%PDF-"));
        assert_eq!(report.filename, "focus-sessions-a_b_c-month-20260310.pdf");
        assert_eq!(report.content_type, "application/pdf");
    }

    #[test]
    fn format_parses() {
        assert_eq!("pdf".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
