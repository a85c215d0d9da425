//! Student records and their flat-file line format.
//!
//! One record per line: `roll name marks present total`, whitespace
//! separated, marks always written with two fractional digits.

use crate::error::{Result, RollbookError};
use std::fmt::Write as _;

/// Longest accepted student name, in characters
pub const MAX_NAME_LEN: usize = 49;

/// A single student on the roster
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub roll: i32,
    pub name: String,
    pub marks: f64,
    pub present: u32,
    pub total: u32,
}

impl StudentRecord {
    /// New record with no attendance history
    pub fn new(roll: i32, name: impl Into<String>, marks: f64) -> Self {
        Self {
            roll,
            name: name.into(),
            marks,
            present: 0,
            total: 0,
        }
    }

    /// present / total * 100, or 0 before any class was held
    pub fn attendance_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.present) / f64::from(self.total) * 100.0
        }
    }

    /// Serialize to one persisted line (without trailing newline)
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {:.2} {} {}",
            self.roll, self.name, self.marks, self.present, self.total
        )
    }

    /// Parse one persisted line. Returns `None` unless the line holds exactly
    /// five well-formed fields.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let roll = fields.next()?.parse().ok()?;
        let name = fields.next()?;
        let marks: f64 = fields.next()?.parse().ok()?;
        let present: u32 = fields.next()?.parse().ok()?;
        let total: u32 = fields.next()?.parse().ok()?;
        if fields.next().is_some() {
            return None;
        }
        if validate_name(name).is_err() || !marks.is_finite() || present > total {
            return None;
        }
        Some(Self {
            roll,
            name: name.to_string(),
            marks,
            present,
            total,
        })
    }
}

/// Names are single tokens: non-empty, no whitespace, at most 49 characters.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RollbookError::validation("name must not be empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(RollbookError::validation("name must not contain spaces"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(RollbookError::validation(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

/// Marks must be a finite number.
pub fn validate_marks(marks: f64) -> Result<()> {
    if !marks.is_finite() {
        return Err(RollbookError::validation("marks must be a finite number"));
    }
    Ok(())
}

/// Output of `parse_records`: everything read before the first bad line.
#[derive(Debug, Clone, Default)]
pub struct ParsedRecords {
    pub records: Vec<StudentRecord>,
    /// 1-based line number of the first line that failed to parse
    pub truncated_at: Option<usize>,
}

/// Parse a whole student file.
///
/// Blank lines are skipped. Parsing stops at the first malformed line, or at
/// a line repeating a roll already read, so the result always has unique rolls.
pub fn parse_records(text: &str) -> ParsedRecords {
    parse_record_bytes(text.as_bytes())
}

/// Parse raw file contents. A line that is not valid UTF-8 counts as
/// malformed, like any other unparseable line.
pub fn parse_record_bytes(bytes: &[u8]) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();
    for (idx, raw) in bytes.split(|&b| b == b'\n').enumerate() {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let record = match std::str::from_utf8(raw) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => StudentRecord::parse_line(line),
            Err(_) => None,
        };
        match record {
            Some(record) if !parsed.records.iter().any(|r| r.roll == record.roll) => {
                parsed.records.push(record);
            }
            _ => {
                parsed.truncated_at = Some(idx + 1);
                break;
            }
        }
    }
    parsed
}

/// Render records in the persisted line format.
pub fn render_records(records: &[StudentRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let _ = writeln!(out, "{}", record.to_line());
    }
    out
}
