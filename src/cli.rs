use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config_file::AppConfig;

/// Rollbook - student records with role-gated access
#[derive(Parser, Debug)]
#[command(name = "rollbook")]
#[command(about = "A console student record system with attendance tracking and an admin audit log")]
#[command(version)]
pub struct Cli {
    /// Path to a JSON configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding students.txt, credentials.txt and the logs.
    ///
    /// Overrides `data_dir` from the configuration file.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Log in and open the interactive menu (default)
    Run,
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Effective configuration: file (or defaults) with CLI overrides applied.
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load_from_file(path)?,
            None => AppConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        config.validate()?;
        Ok(config)
    }
}
