//! Rollbook Library
//!
//! This library provides the core of the Rollbook student record system:
//! the record store, credential store, audit log and session state machine.

pub mod app;
pub mod audit;
pub mod cli;
pub mod config_file;
pub mod credentials;
pub mod error;
pub mod input;
pub mod password;
pub mod record;
pub mod report;
pub mod session;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use app::{App, RunOutcome};
pub use audit::{AuditEntry, AuditLog};
pub use config_file::AppConfig;
pub use credentials::{Credential, CredentialStore};
pub use error::{Result, RollbookError};
pub use input::{MaskedInput, Prompt, TerminalPrompt};
pub use password::strong_password_check;
pub use record::StudentRecord;
pub use session::{AuthState, Session, SessionAuthenticator, SessionTransitionError};
pub use store::{
    AttendanceReport, ClassStatistics, DeleteOutcome, Durability, LoadReport, RecordStore,
    SnapshotRow,
};
pub use types::{Action, Role, SortKey};
