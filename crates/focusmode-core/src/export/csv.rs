use chrono::SecondsFormat;

use crate::storage::SessionRecord;

const HEADER: &str = "id,sessionType,startedAt,endedAt,durationRequested,durationActual,completed";

/// Quote a field when it contains a separator, quote or line break.
pub fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// One row per record, in the given order, with a header line.
pub fn render(records: &[SessionRecord]) -> String {
    let mut out = String::with_capacity(64 * (records.len() + 1));
    out.push_str(HEADER);
    out.push('\n');

    for r in records {
        let ended = r
            .ended_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();
        let actual = r.duration_actual.map(|d| d.to_string()).unwrap_or_default();
        let row = [
            escape(&r.id),
            r.session_type.as_str().to_string(),
            r.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            ended,
            r.duration_requested.to_string(),
            actual,
            r.completed.to_string(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::SessionType;
    use chrono::{TimeZone, Utc};

    #[test]
    fn escape_quotes_special_fields() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn render_writes_header_and_open_records() {
        let started = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let records = vec![SessionRecord {
            id: "s-1".into(),
            user_id: "u1".into(),
            session_type: SessionType::ShortBreak,
            duration_requested: 300,
            duration_actual: None,
            started_at: started,
            ended_at: None,
            completed: false,
            created_at: started,
        }];

        let csv = render(&records);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(HEADER));
        assert_eq!(
            lines.next(),
            Some("s-1,short_break,2026-03-10T09:00:00Z,,300,,false")
        );
        assert_eq!(lines.next(), None);
    }
}
