//! Configuration file handling.
//!
//! All settings have defaults matching the classic file layout
//! (`students.txt`, `credentials.txt`, `admin_log.txt`, `students.csv` in
//! the working directory), so a config file is optional. File names are
//! resolved against `data_dir` unless absolute.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

use crate::credentials::MAX_PASSWORD_LEN;
use crate::password::MIN_PASSWORD_LEN;

/// Application configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    // Storage locations
    pub data_dir: PathBuf,
    pub students_file: PathBuf,
    pub credentials_file: PathBuf,
    pub audit_log_file: PathBuf,
    pub csv_file: PathBuf,

    // Authentication
    pub max_login_attempts: u32,
    pub mask_char: char,
    pub max_password_len: usize,

    // Logging (RUST_LOG overrides)
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            students_file: PathBuf::from("students.txt"),
            credentials_file: PathBuf::from("credentials.txt"),
            audit_log_file: PathBuf::from("admin_log.txt"),
            csv_file: PathBuf::from("students.csv"),
            max_login_attempts: crate::session::DEFAULT_LOGIN_ATTEMPTS,
            mask_char: crate::input::DEFAULT_MASK_CHAR,
            max_password_len: MAX_PASSWORD_LEN,
            log_level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (label, file) in [
            ("students_file", &self.students_file),
            ("credentials_file", &self.credentials_file),
            ("audit_log_file", &self.audit_log_file),
            ("csv_file", &self.csv_file),
        ] {
            if file.as_os_str().is_empty() {
                anyhow::bail!("{} must be specified", label);
            }
        }

        if self.max_login_attempts == 0 {
            anyhow::bail!("max_login_attempts must be at least 1");
        }

        if self.mask_char.is_control() || self.mask_char.is_whitespace() {
            anyhow::bail!("mask_char must be a visible character");
        }

        if self.max_password_len < MIN_PASSWORD_LEN || self.max_password_len > MAX_PASSWORD_LEN {
            anyhow::bail!(
                "max_password_len must be between {} and {}",
                MIN_PASSWORD_LEN,
                MAX_PASSWORD_LEN
            );
        }

        self.level_filter()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse::<LevelFilter>()
            .with_context(|| format!("Invalid log_level {:?}", self.log_level))
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir.join(file)
        }
    }

    pub fn students_path(&self) -> PathBuf {
        self.resolve(&self.students_file)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.resolve(&self.credentials_file)
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.resolve(&self.audit_log_file)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.resolve(&self.csv_file)
    }
}
