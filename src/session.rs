//! Session state machine
//!
//! Login happens once per process and fixes the active user and role.
//!
//! # State Flow
//!
//! ```text
//! AwaitingCredentials ──(verify ok)──> Authenticated ──(logout)──> LoggedOut
//!         │
//!         └──(attempts exhausted / credentials unreadable)──> Denied
//! ```
//!
//! `Denied` and `LoggedOut` are terminal. The resolved `Session` is handed to
//! record store mutations by reference; there is no global session state.

use crate::audit::AuditLog;
use crate::credentials::{CredentialStore, validate_password_token};
use crate::error::{Result, RollbookError};
use crate::input::Prompt;
use crate::password::{check_strength, describe_unmet};
use crate::types::Role;
use std::fmt;
use thiserror::Error;

/// Default number of login attempts before the session is denied
pub const DEFAULT_LOGIN_ATTEMPTS: u32 = 3;

/// The authenticated user and role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
    role: Role,
}

impl Session {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authentication states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthState {
    AwaitingCredentials,
    Authenticated,
    /// Attempts exhausted (terminal)
    Denied,
    /// Explicit logout (terminal)
    LoggedOut,
}

impl AuthState {
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Denied | Self::LoggedOut)
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::AwaitingCredentials => "awaiting credentials",
            Self::Authenticated => "authenticated",
            Self::Denied => "access denied",
            Self::LoggedOut => "logged out",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors for operations attempted in the wrong state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionTransitionError {
    /// Login attempted after the session was decided
    #[error("Cannot log in while {from}")]
    NotAwaitingCredentials { from: AuthState },

    /// Operation requires an authenticated session
    #[error("Operation requires an authenticated session (currently {state})")]
    NotAuthenticated { state: AuthState },
}

/// Drives login and password changes against a `CredentialStore`.
#[derive(Debug, Clone)]
pub struct SessionAuthenticator {
    credentials: CredentialStore,
    audit: AuditLog,
    state: AuthState,
    remaining_attempts: u32,
    session: Option<Session>,
    /// Why the credential file could not be read, once that has denied us
    read_error: Option<String>,
}

impl SessionAuthenticator {
    pub fn new(credentials: CredentialStore, audit: AuditLog) -> Self {
        Self::with_attempts(credentials, audit, DEFAULT_LOGIN_ATTEMPTS)
    }

    pub fn with_attempts(credentials: CredentialStore, audit: AuditLog, attempts: u32) -> Self {
        Self {
            credentials,
            audit,
            state: AuthState::AwaitingCredentials,
            remaining_attempts: attempts,
            session: None,
            read_error: None,
        }
    }

    #[inline]
    pub fn state(&self) -> AuthState {
        self.state
    }

    #[inline]
    pub fn remaining_attempts(&self) -> u32 {
        self.remaining_attempts
    }

    /// The active session, only while `Authenticated`
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Make one login attempt and return the resulting state.
    pub fn attempt(
        &mut self,
        username: &str,
        password: &str,
    ) -> std::result::Result<AuthState, SessionTransitionError> {
        if self.state != AuthState::AwaitingCredentials {
            return Err(SessionTransitionError::NotAwaitingCredentials { from: self.state });
        }

        match self.credentials.verify(username, password) {
            Ok(role) => {
                tracing::info!("User {} logged in with role {}", username, role);
                self.session = Some(Session::new(username, role));
                self.state = AuthState::Authenticated;
            }
            Err(RollbookError::AuthenticationFailed(_)) => {
                self.remaining_attempts = self.remaining_attempts.saturating_sub(1);
                tracing::warn!(
                    "Failed login for {}, {} attempt(s) left",
                    username,
                    self.remaining_attempts
                );
                if self.remaining_attempts == 0 {
                    self.deny();
                }
            }
            Err(e) => {
                tracing::error!(
                    "Cannot read credentials {:?}: {}",
                    self.credentials.path(),
                    e
                );
                self.read_error = Some(match &e {
                    RollbookError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                        "Credentials file not found.".to_string()
                    }
                    _ => format!("Cannot read credentials file: {}", e),
                });
                self.deny();
            }
        }
        Ok(self.state)
    }

    fn deny(&mut self) {
        self.state = AuthState::Denied;
        self.remaining_attempts = 0;
        self.session = None;
    }

    /// Interactive login: prompt until authenticated or denied.
    pub fn login(&mut self, prompt: &mut dyn Prompt) -> Result<AuthState> {
        while self.state == AuthState::AwaitingCredentials {
            let Some(username) = prompt.read_line("Username: ")? else {
                self.deny();
                break;
            };
            let Some(password) = prompt.read_secret("Password: ")? else {
                self.deny();
                break;
            };

            if self.attempt(username.trim(), &password)? == AuthState::Authenticated {
                break;
            }
            match &self.read_error {
                Some(reason) => prompt.say(reason),
                None => prompt.say(&format!(
                    "Invalid credentials. Attempts left: {}",
                    self.remaining_attempts
                )),
            }
        }
        Ok(self.state)
    }

    /// End the authenticated session.
    pub fn logout(&mut self) -> std::result::Result<(), SessionTransitionError> {
        if self.state != AuthState::Authenticated {
            return Err(SessionTransitionError::NotAuthenticated { state: self.state });
        }
        if let Some(session) = self.session.take() {
            tracing::info!("User {} logged out", session.username());
        }
        self.state = AuthState::LoggedOut;
        Ok(())
    }

    /// Interactive password change for the session user.
    ///
    /// The old password is verified first. Weak or mismatched new passwords
    /// re-prompt; the credential file is only touched once both agree.
    pub fn change_password(&self, prompt: &mut dyn Prompt) -> Result<()> {
        let session = self.session.as_ref().ok_or(SessionTransitionError::NotAuthenticated {
            state: self.state,
        })?;
        prompt.say(&format!("Change password for {}", session.username()));

        let old = read_secret_or_abort(prompt, "Enter old password: ")?;
        match self.credentials.verify(session.username(), &old) {
            Ok(_) => {}
            Err(RollbookError::AuthenticationFailed(_)) => {
                return Err(RollbookError::auth_failed("old password not correct"));
            }
            Err(e) => return Err(e),
        }

        let new_password = loop {
            let candidate = read_secret_or_abort(
                prompt,
                "Enter new password (min 6, upper+lower+digit+special): ",
            )?;
            let unmet = check_strength(&candidate);
            if !unmet.is_empty() {
                let err = RollbookError::weak_password(describe_unmet(&unmet));
                prompt.say(&format!("{}. Try again.", err));
                continue;
            }
            if let Err(e) = validate_password_token(&candidate) {
                prompt.say(&format!("{}. Try again.", e));
                continue;
            }
            let confirm = read_secret_or_abort(prompt, "Confirm new password: ")?;
            if confirm != candidate {
                prompt.say("Mismatch. Try again.");
                continue;
            }
            break candidate;
        };

        self.credentials
            .change_password(session.username(), &new_password)?;
        self.audit.record(session, "Changed own password");
        Ok(())
    }
}

fn read_secret_or_abort(prompt: &mut dyn Prompt, text: &str) -> Result<String> {
    prompt
        .read_secret(text)?
        .ok_or_else(|| RollbookError::validation("input ended before password was entered"))
}
