//! Configuration management CLI commands.
//!
//! Provides `config path`, `config init` and `config show`.

use clap::Subcommand;
use jagalari::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Init { force } => run_init(force),
        ConfigCommands::Show => run_show(),
    }
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

fn run_init(force: bool) -> Result<(), CliError> {
    let path = config_file_path();
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        )));
    }

    ConfigFile::default().save_to(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn run_show() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    for line in describe(&config) {
        println!("{line}");
    }
    Ok(())
}

/// Human-readable listing of the effective configuration.
///
/// The telemetry password is masked.
fn describe(config: &ConfigFile) -> Vec<String> {
    let optional = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_else(|| "(not set)".into());

    vec![
        "[telemetry]".to_string(),
        format!("url = {}", config.telemetry.url),
        format!("email = {}", config.telemetry.email),
        format!("password = {}", mask(&config.telemetry.password)),
        format!("timeout = {}", config.telemetry.timeout),
        String::new(),
        "[map]".to_string(),
        format!("default_latitude = {}", config.map.default_latitude),
        format!("default_longitude = {}", config.map.default_longitude),
        format!("default_zoom = {}", config.map.default_zoom),
        String::new(),
        "[storage]".to_string(),
        format!("path = {}", config.storage.path.display()),
        String::new(),
        "[logging]".to_string(),
        format!("file = {}", config.logging.file.display()),
        String::new(),
        "[location]".to_string(),
        format!("latitude = {}", optional(config.location.latitude)),
        format!("longitude = {}", optional(config.location.longitude)),
        format!("accuracy = {}", config.location.accuracy),
    ]
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        "(not set)".to_string()
    } else {
        "*".repeat(secret.chars().count().min(8))
    }
}
