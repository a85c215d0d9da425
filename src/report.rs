//! Text renderings of the roster: the console table, statistics summary and
//! CSV export.

use crate::record::StudentRecord;
use crate::store::{ClassStatistics, SnapshotRow};
use std::fmt::Write as _;

/// Header line of the CSV export
pub const CSV_HEADER: &str = "Roll,Name,Marks,Present,Total,AttendancePercent";

const SEPARATOR: &str = "-----------------------------------------------------------------";

/// CSV with one line per row. Names are written as-is (no quoting).
pub fn render_csv(rows: &[SnapshotRow]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + rows.len() * 32);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for row in rows {
        let _ = writeln!(
            out,
            "{},{},{:.2},{},{},{:.0}",
            row.roll, row.name, row.marks, row.present, row.total, row.attendance_percent
        );
    }
    out
}

fn table_header() -> String {
    format!(
        "{sep}\n| {:<5} | {:<20} | {:<7} | {:<10} |\n{sep}\n",
        "ROLL",
        "NAME",
        "MARKS",
        "ATTENDANCE",
        sep = SEPARATOR
    )
}

/// One table row, e.g. `| 1     | Alice                |   90.00 |      1/2   (50%) |`
pub fn render_row(r: &StudentRecord) -> String {
    format!(
        "| {:<5} | {:<20} | {:>7.2} | {:>6}/{:<3} ({:.0}%) |",
        r.roll,
        r.name,
        r.marks,
        r.present,
        r.total,
        r.attendance_percent()
    )
}

/// Framed table of `records`, or a notice when there are none.
pub fn render_table<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a StudentRecord>,
{
    let mut body = String::new();
    for record in records {
        body.push_str(&render_row(record));
        body.push('\n');
    }
    if body.is_empty() {
        return "No student records found.".to_string();
    }
    format!("{}{}{}", table_header(), body, SEPARATOR)
}

/// Multi-line statistics summary, or a notice for an empty roster.
pub fn render_statistics(stats: Option<&ClassStatistics>) -> String {
    let Some(s) = stats else {
        return "No students.".to_string();
    };
    format!(
        "Total students: {}\nAverage marks: {:.2}\nHighest: Roll {} Name {} Marks {:.2}\nLowest:  Roll {} Name {} Marks {:.2}",
        s.count,
        s.average,
        s.highest.roll,
        s.highest.name,
        s.highest.marks,
        s.lowest.roll,
        s.lowest.name,
        s.lowest.marks
    )
}
