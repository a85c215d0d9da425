//! Record store
//!
//! In-memory roster of `StudentRecord`s backed by the student file. Every
//! mutation is applied in memory, then the whole file is rewritten, then an
//! audit entry is recorded for admin sessions.
//!
//! A failed write never undoes the in-memory change: the mutation reports
//! `Durability::NotSaved` and the next successful save catches the file up.

use crate::audit::AuditLog;
use crate::error::{Result, RollbookError};
use crate::record::{
    parse_record_bytes, render_records, validate_marks, validate_name, StudentRecord,
};
use crate::report::render_csv;
use crate::session::Session;
use crate::types::SortKey;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Whether a mutation reached the student file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Durability {
    Saved,
    /// In-memory state changed but the write failed (reason attached)
    NotSaved(String),
}

impl Durability {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }
}

/// Result of `RecordStore::delete`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(Durability),
    /// Not confirmed; nothing changed
    Cancelled,
}

/// Aggregate marks over the whole roster
#[derive(Debug, Clone, PartialEq)]
pub struct ClassStatistics {
    pub count: usize,
    pub average: f64,
    pub highest: StudentRecord,
    pub lowest: StudentRecord,
}

/// Result of one attendance event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceReport {
    /// False when the roster was empty and nothing was recorded
    pub class_recorded: bool,
    /// Rolls credited as present, in the order given
    pub marked: Vec<i32>,
    /// Rolls that matched no record
    pub unknown_rolls: Vec<i32>,
    pub durability: Option<Durability>,
}

/// One exported row
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub roll: i32,
    pub name: String,
    pub marks: f64,
    pub present: u32,
    pub total: u32,
    pub attendance_percent: f64,
}

impl From<&StudentRecord> for SnapshotRow {
    fn from(r: &StudentRecord) -> Self {
        Self {
            roll: r.roll,
            name: r.name.clone(),
            marks: r.marks,
            present: r.present,
            total: r.total,
            attendance_percent: r.attendance_percent(),
        }
    }
}

/// What `load` found in the student file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// 1-based line where reading stopped early
    pub truncated_at: Option<usize>,
}

/// The student roster
#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Vec<StudentRecord>,
    path: PathBuf,
    audit: AuditLog,
    /// Set when the student file exists but could not be read; saving
    /// would destroy whatever is in it.
    load_failed: bool,
}

impl RecordStore {
    /// Empty store persisting to `path`. Call `load` to read existing data.
    pub fn new<P: AsRef<Path>>(path: P, audit: AuditLog) -> Self {
        Self {
            records: Vec::new(),
            path: path.as_ref().to_path_buf(),
            audit,
            load_failed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace the in-memory roster with the file contents.
    ///
    /// A missing file yields an empty roster. Reading stops at the first
    /// malformed line (including one that is not valid UTF-8); the records
    /// before it are kept. If the file cannot be read at all the store
    /// refuses to save until a later load succeeds.
    pub fn load(&mut self) -> Result<LoadReport> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No student file at {:?}, starting empty", self.path);
                self.records.clear();
                self.load_failed = false;
                return Ok(LoadReport::default());
            }
            Err(e) => {
                self.load_failed = true;
                return Err(e.into());
            }
        };

        let parsed = parse_record_bytes(&content);
        if let Some(line) = parsed.truncated_at {
            tracing::warn!(
                "Student file {:?} truncated at malformed line {}",
                self.path,
                line
            );
        }
        self.records = parsed.records;
        self.load_failed = false;
        tracing::info!("Loaded {} student record(s)", self.records.len());
        Ok(LoadReport {
            loaded: self.records.len(),
            truncated_at: parsed.truncated_at,
        })
    }

    /// Rewrite the whole student file from memory.
    pub fn save(&self) -> Result<()> {
        if self.load_failed {
            return Err(io::Error::other(format!(
                "{} could not be read; refusing to overwrite it",
                self.path.display()
            ))
            .into());
        }
        fs::write(&self.path, render_records(&self.records))?;
        tracing::debug!("Saved {} record(s) to {:?}", self.records.len(), self.path);
        Ok(())
    }

    fn persist(&self) -> Durability {
        match self.save() {
            Ok(()) => Durability::Saved,
            Err(e) => {
                tracing::warn!("Failed to save student file {:?}: {}", self.path, e);
                Durability::NotSaved(e.to_string())
            }
        }
    }

    fn index_of(&self, roll: i32) -> Option<usize> {
        self.records.iter().position(|r| r.roll == roll)
    }

    /// Append a new student with no attendance history.
    pub fn add(
        &mut self,
        session: &Session,
        roll: i32,
        name: &str,
        marks: f64,
    ) -> Result<Durability> {
        if self.index_of(roll).is_some() {
            return Err(RollbookError::DuplicateKey(roll));
        }
        validate_name(name)?;
        validate_marks(marks)?;

        self.records.push(StudentRecord::new(roll, name, marks));
        let durability = self.persist();
        self.audit
            .record(session, &format!("Added student roll {} name {}", roll, name));
        Ok(durability)
    }

    /// Linear lookup by roll.
    pub fn find_by_roll(&self, roll: i32) -> Result<&StudentRecord> {
        self.records
            .iter()
            .find(|r| r.roll == roll)
            .ok_or_else(|| RollbookError::not_found(format!("roll {}", roll)))
    }

    /// Change name and/or marks. Fields left as `None` are untouched.
    pub fn update(
        &mut self,
        session: &Session,
        roll: i32,
        new_name: Option<&str>,
        new_marks: Option<f64>,
    ) -> Result<Durability> {
        let idx = self
            .index_of(roll)
            .ok_or_else(|| RollbookError::not_found(format!("roll {}", roll)))?;
        if let Some(name) = new_name {
            validate_name(name)?;
        }
        if let Some(marks) = new_marks {
            validate_marks(marks)?;
        }

        let record = &mut self.records[idx];
        if let Some(name) = new_name {
            record.name = name.to_string();
        }
        if let Some(marks) = new_marks {
            record.marks = marks;
        }

        let durability = self.persist();
        self.audit
            .record(session, &format!("Updated student roll {}", roll));
        Ok(durability)
    }

    /// Remove a student if `confirmed`. Remaining records keep their order.
    pub fn delete(&mut self, session: &Session, roll: i32, confirmed: bool) -> Result<DeleteOutcome> {
        let idx = self
            .index_of(roll)
            .ok_or_else(|| RollbookError::not_found(format!("roll {}", roll)))?;
        if !confirmed {
            return Ok(DeleteOutcome::Cancelled);
        }

        self.records.remove(idx);
        let durability = self.persist();
        self.audit
            .record(session, &format!("Deleted student roll {}", roll));
        Ok(DeleteOutcome::Deleted(durability))
    }

    /// Exact roll match (read-only).
    pub fn search_by_roll(&self, roll: i32) -> Result<&StudentRecord> {
        self.find_by_roll(roll)
    }

    /// Case-insensitive substring match on name, in roster order.
    pub fn search_by_name(&self, pattern: &str) -> Vec<&StudentRecord> {
        let needle = pattern.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Reorder the roster once by `key`.
    pub fn sort(&mut self, key: SortKey) {
        match key {
            SortKey::RollAscending => self.records.sort_by_key(|r| r.roll),
            SortKey::NameAlphabetical => self.records.sort_by_cached_key(|r| r.name.to_lowercase()),
            SortKey::MarksDescending => self
                .records
                .sort_by(|a, b| b.marks.partial_cmp(&a.marks).unwrap_or(Ordering::Equal)),
        }
        tracing::debug!("Sorted {} record(s) by {}", self.records.len(), key);
    }

    /// Count, average and extremes of marks. `None` for an empty roster.
    ///
    /// On ties the earliest record in roster order is reported.
    pub fn class_statistics(&self) -> Option<ClassStatistics> {
        let first = self.records.first()?;
        let mut highest = first;
        let mut lowest = first;
        let mut sum = 0.0;
        for record in &self.records {
            sum += record.marks;
            if record.marks > highest.marks {
                highest = record;
            }
            if record.marks < lowest.marks {
                lowest = record;
            }
        }
        Some(ClassStatistics {
            count: self.records.len(),
            average: sum / self.records.len() as f64,
            highest: highest.clone(),
            lowest: lowest.clone(),
        })
    }

    /// Record one class: every student's total goes up by one, and each
    /// listed roll that exists is credited present once.
    pub fn mark_attendance(&mut self, session: &Session, present_rolls: &[i32]) -> AttendanceReport {
        let mut report = AttendanceReport::default();
        if self.records.is_empty() {
            return report;
        }

        for record in &mut self.records {
            record.total = record.total.saturating_add(1);
        }

        let mut credited = HashSet::new();
        for &roll in present_rolls {
            match self.records.iter_mut().find(|r| r.roll == roll) {
                Some(record) if credited.insert(roll) => {
                    record.present = record.present.saturating_add(1).min(record.total);
                    report.marked.push(roll);
                }
                Some(_) => tracing::debug!("Roll {} already marked present", roll),
                None => {
                    tracing::warn!("Attendance: roll {} not found", roll);
                    report.unknown_rolls.push(roll);
                }
            }
        }

        report.class_recorded = true;
        report.durability = Some(self.persist());
        self.audit.record(session, "Marked attendance for one class");
        report
    }

    fn snapshot_rows(&self) -> Vec<SnapshotRow> {
        self.records.iter().map(SnapshotRow::from).collect()
    }

    /// Read-only tabular projection of the roster, in roster order.
    pub fn export_snapshot(&self, session: &Session) -> Vec<SnapshotRow> {
        let rows = self.snapshot_rows();
        self.audit.record(session, "Exported data");
        rows
    }

    /// Write the snapshot as CSV to `path`. Returns the number of data rows.
    pub fn export_csv<P: AsRef<Path>>(&self, session: &Session, path: P) -> Result<usize> {
        let path = path.as_ref();
        let rows = self.snapshot_rows();
        fs::write(path, render_csv(&rows))?;
        tracing::info!("Exported {} row(s) to {:?}", rows.len(), path);
        self.audit
            .record(session, &format!("Exported data to {}", path.display()));
        Ok(rows.len())
    }
}
