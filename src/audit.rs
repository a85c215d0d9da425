//! Append-only admin action log.
//!
//! Lines look like `[2025-01-31 14:02:11] alice: Added student roll 4 name Dan`.
//! Only sessions with the ADMIN role produce entries.

use crate::error::Result;
use crate::session::Session;
use chrono::{Local, NaiveDateTime};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One immutable audit line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub timestamp: NaiveDateTime,
    pub user: String,
    pub action: String,
}

impl AuditEntry {
    /// Entry stamped with the current local time
    pub fn new(user: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            user: user.into(),
            action: action.into(),
        }
    }

    pub fn to_line(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.user,
            self.action
        )
    }

    pub fn parse_line(line: &str) -> Option<Self> {
        let rest = line.strip_prefix('[')?;
        let (stamp, rest) = rest.split_once("] ")?;
        let (user, action) = rest.split_once(": ")?;
        let timestamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
        Some(Self {
            timestamp,
            user: user.to_string(),
            action: action.to_string(),
        })
    }
}

/// File-backed audit log. Every write opens, appends one line and closes.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `entry` unconditionally.
    pub fn append(&self, entry: &AuditEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", entry.to_line())?;
        Ok(())
    }

    /// Record `action` for the session user if the session is an admin.
    ///
    /// Returns whether an entry was written. A failed write is logged and
    /// otherwise ignored: auditing never blocks the action it describes.
    pub fn record(&self, session: &Session, action: &str) -> bool {
        if !session.is_admin() {
            return false;
        }
        match self.append(&AuditEntry::new(session.username(), action)) {
            Ok(()) => {
                tracing::debug!("Audit: {}: {}", session.username(), action);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to write audit log {:?}: {}", self.path, e);
                false
            }
        }
    }

    /// Read back all well-formed entries. A missing log reads as empty.
    pub fn entries(&self) -> Result<Vec<AuditEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(content.lines().filter_map(AuditEntry::parse_line).collect())
    }
}
