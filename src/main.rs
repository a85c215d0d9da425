//! Rollbook - Main entry point
//!
//! Parses arguments, loads configuration, installs logging and runs one
//! interactive session on the terminal.

use rollbook::app::{App, RunOutcome};
use rollbook::cli::{Cli, Commands};
use rollbook::config_file::AppConfig;
use rollbook::input::TerminalPrompt;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Initialize the logger. `RUST_LOG` overrides the configured level.
fn init_logger(level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application entry point
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();

    match &cli.command {
        Some(Commands::Validate { config }) => {
            init_logger(LevelFilter::INFO);
            info!("Validating configuration file: {:?}", config);
            match AppConfig::load_from_file(config).and_then(|c| c.validate()) {
                Ok(()) => println!("✓ Configuration file is valid: {:?}", config),
                Err(e) => {
                    error!("Configuration validation failed: {:#}", e);
                    eprintln!("✗ Configuration validation failed: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::InitConfig { path, force }) => {
            init_logger(LevelFilter::INFO);
            if path.exists() && !force {
                eprintln!("✗ {:?} already exists (use --force to overwrite)", path);
                std::process::exit(1);
            }
            AppConfig::default().save_to_file(path)?;
            println!("✓ Wrote default configuration to {:?}", path);
        }
        Some(Commands::Run) | None => {
            let config = match cli.load_config() {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("✗ Failed to load configuration: {:#}", e);
                    std::process::exit(1);
                }
            };
            init_logger(config.level_filter()?);
            info!("Rollbook starting, data dir {:?}", config.data_dir);
            debug!("Effective configuration: {:?}", config);

            let prompt = TerminalPrompt::new(config.mask_char, config.max_password_len);
            let mut app = App::new(config, prompt);
            // A denied login has already been reported and exits cleanly
            match app.run()? {
                RunOutcome::Finished => info!("Session finished"),
                RunOutcome::Denied => info!("Login denied, exiting"),
            }
        }
    }

    Ok(())
}
