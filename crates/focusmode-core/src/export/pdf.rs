//! A small text-only PDF 1.4 writer.
//!
//! Lines are laid out top to bottom in Helvetica on A4 pages; overflow
//! starts a new page. Only printable ASCII survives, everything else is
//! replaced with `?`.

use std::fmt::Write as _;

use crate::storage::SessionRecord;
use crate::stats::DashboardStats;

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 50;
const FONT_SIZE: u32 = 10;
const LEADING: u32 = 14;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

fn escape_text(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn content_stream(lines: &[String]) -> String {
    let mut s = String::new();
    let top = PAGE_HEIGHT - MARGIN;
    let _ = writeln!(s, "BT");
    let _ = writeln!(s, "/F1 {FONT_SIZE} Tf");
    let _ = writeln!(s, "{LEADING} TL");
    let _ = writeln!(s, "{MARGIN} {top} Td");
    for line in lines {
        let _ = writeln!(s, "({}) '", escape_text(line));
    }
    let _ = writeln!(s, "ET");
    s
}

/// Render `lines` into a complete PDF document.
pub fn render_lines(lines: &[String]) -> Vec<u8> {
    let pages: Vec<&[String]> = if lines.is_empty() {
        vec![lines]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };

    // 1 catalog, 2 page tree, 3 font, then a (page, content) pair per page.
    let mut objects: Vec<String> = Vec::with_capacity(3 + pages.len() * 2);
    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", 4 + i * 2))
        .collect();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages.len()
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());

    for (i, page) in pages.iter().enumerate() {
        let content_id = 5 + i * 2;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
        ));
        let stream = content_stream(page);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}endstream",
            stream.len()
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{body}\nendobj\n", i + 1);
    }

    let xref_at = out.len();
    let _ = writeln!(out, "xref\n0 {}", objects.len() + 1);
    out.push_str("0000000000 65535 f \n");
    for offset in offsets {
        let _ = writeln!(out, "{offset:010} 00000 n ");
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    );
    out.into_bytes()
}

/// Session report: a summary block followed by one line per record.
pub fn render(
    title: &str,
    stats: &DashboardStats,
    records: &[SessionRecord],
) -> Vec<u8> {
    let mut lines = vec![
        title.to_string(),
        String::new(),
        format!("Focus minutes today: {}", stats.today_minutes),
        format!("Completed cycles: {}", stats.completed_cycles),
        format!("Current streak: {} days", stats.current_streak),
        format!("Average session: {} min", stats.avg_session),
        String::new(),
        "Started              Type          Requested  Actual  Completed".to_string(),
    ];
    for r in records {
        let actual = r
            .duration_actual
            .map(|d| format!("{}m", d / 60))
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "{}  {:<12}  {:>8}m  {:>6}  {}",
            r.started_at.format("%Y-%m-%d %H:%M"),
            r.session_type.as_str(),
            r.duration_requested / 60,
            actual,
            if r.completed { "yes" } else { "no" },
        ));
    }
    render_lines(&lines)
}
