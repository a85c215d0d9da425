//! Flat-file credential store.
//!
//! Each line holds `username password role`. Passwords are stored in
//! cleartext. The store is re-read on every call, so it always reflects the
//! file on disk.

use crate::error::{Result, RollbookError};
use crate::types::Role;
use std::fs;
use std::path::{Path, PathBuf};

pub const MAX_USERNAME_LEN: usize = 63;
pub const MAX_PASSWORD_LEN: usize = 127;
pub const MAX_ROLE_LEN: usize = 31;

/// One credential triple.
///
/// `role_token` keeps the raw text so rewriting a password never changes
/// how the role is spelled on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub role_token: String,
}

impl Credential {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        role_token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role_token: role_token.into(),
        }
    }

    pub fn role(&self) -> Role {
        Role::from_token(&self.role_token)
    }

    pub fn to_line(&self) -> String {
        format!("{} {} {}", self.username, self.password, self.role_token)
    }

    fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let username = fields.next()?;
        let password = fields.next()?;
        let role = fields.next()?;
        if fields.next().is_some()
            || username.chars().count() > MAX_USERNAME_LEN
            || password.chars().count() > MAX_PASSWORD_LEN
            || role.chars().count() > MAX_ROLE_LEN
        {
            return None;
        }
        Some(Self::new(username, password, role))
    }
}

/// Parse a credential file, stopping at the first malformed non-blank line.
pub fn parse_credentials(text: &str) -> Vec<Credential> {
    let mut creds = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        match Credential::parse_line(line) {
            Some(cred) => creds.push(cred),
            None => {
                tracing::warn!("Stopped reading credentials at malformed line");
                break;
            }
        }
    }
    creds
}

/// Rewrite `content` with `username`'s password replaced.
///
/// Only entries `parse_credentials` would read can match, so the entry that
/// changes is the one login verified against. Returns `None` if no such
/// entry exists.
fn replace_password_line(content: &str, username: &str, new_password: &str) -> Option<String> {
    let mut out = String::with_capacity(content.len() + new_password.len());
    let mut replaced = false;
    let mut readable = true;
    for line in content.lines() {
        if readable && !replaced && !line.trim().is_empty() {
            match Credential::parse_line(line) {
                Some(mut cred) if cred.username == username => {
                    cred.password = new_password.to_string();
                    out.push_str(&cred.to_line());
                    out.push('\n');
                    replaced = true;
                    continue;
                }
                Some(_) => {}
                None => readable = false,
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    replaced.then_some(out)
}

/// A new password must be a single token that fits the file format.
pub fn validate_password_token(password: &str) -> Result<()> {
    if password.is_empty() || password.chars().any(char::is_whitespace) {
        return Err(RollbookError::validation(
            "password must be non-empty and contain no spaces",
        ));
    }
    if password.chars().count() > MAX_PASSWORD_LEN {
        return Err(RollbookError::validation(format!(
            "password must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Credential store backed by one file
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every credential. A missing file is an IO error.
    pub fn load(&self) -> Result<Vec<Credential>> {
        let content = fs::read_to_string(&self.path)?;
        Ok(parse_credentials(&content))
    }

    /// Role of the first entry matching both username and password exactly.
    pub fn verify(&self, username: &str, password: &str) -> Result<Role> {
        self.load()?
            .into_iter()
            .find(|c| c.username == username && c.password == password)
            .map(|c| c.role())
            .ok_or_else(|| RollbookError::auth_failed(format!("invalid credentials for {}", username)))
    }

    /// Replace the password of the first entry for `username`.
    ///
    /// The caller must have verified the old password. Only the matching
    /// entry's password field changes; every other line, including ones that
    /// do not parse, is copied verbatim. The result goes to a sibling temp
    /// file which is then renamed over the store, so the original file is
    /// either fully old or fully new.
    pub fn change_password(&self, username: &str, new_password: &str) -> Result<()> {
        validate_password_token(new_password)?;

        let content = fs::read_to_string(&self.path)?;
        let rewritten = replace_password_line(&content, username, new_password)
            .ok_or_else(|| RollbookError::not_found(format!("user {}", username)))?;

        let tmp_path = self.temp_path();
        if let Err(e) = fs::write(&tmp_path, rewritten) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        tracing::info!("Password changed for {}", username);
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
