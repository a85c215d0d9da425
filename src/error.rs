//! Error handling module for Rollbook
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Record store, credential store and session operations all report through
//! `RollbookError` so the menu layer can decide how to recover.

use thiserror::Error;

/// Main error type for Rollbook
#[derive(Error, Debug)]
pub enum RollbookError {
    /// Malformed numeric or text input (recovered by re-prompting)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Roll number or username does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Add attempted with a roll number that already exists
    #[error("Roll {0} already exists")]
    DuplicateKey(i32),

    /// Bad credentials
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// New password rejected by the strength policy
    #[error("Weak password: {0}")]
    WeakPassword(String),

    /// IO errors (student file, credential file, audit log, terminal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Session state machine transition errors
    #[error("Session error: {0}")]
    Session(#[from] crate::session::SessionTransitionError),
}

/// Result type alias for Rollbook operations
pub type Result<T> = std::result::Result<T, RollbookError>;

// Convenient error constructors
impl RollbookError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an authentication error
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed(msg.into())
    }

    /// Create a weak password error
    pub fn weak_password(msg: impl Into<String>) -> Self {
        Self::WeakPassword(msg.into())
    }

    /// True for errors the menu loop reports and carries on from.
    /// A session transition error means the state machine is out of step.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Session(_))
    }
}
