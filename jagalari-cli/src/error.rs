//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use jagalari::config::ConfigFileError;
use jagalari::storage::StorageError;
use jagalari::telemetry::TelemetryError;
use jagalari::track::TrackError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Invalid or unreadable config file
    ConfigFile(ConfigFileError),
    /// Failed to set up the telemetry client
    Telemetry(TelemetryError),
    /// Failed to open session storage
    Storage(StorageError),
    /// Track file could not be read or parsed
    Track(TrackError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::ConfigFile(_) => {
                eprintln!();
                eprintln!("Check the file shown by: jagalari config path");
                eprintln!("Or write a fresh one with: jagalari config init --force");
            }
            CliError::Storage(StorageError::Corrupt { path, .. }) => {
                eprintln!();
                eprintln!(
                    "The saved session state is unreadable. Remove {} to start fresh.",
                    path.display()
                );
            }
            CliError::Track(TrackError::NotGpxFile(_)) => {
                eprintln!();
                eprintln!("Only .gpx files can be loaded as tracks.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Telemetry(e) => write!(f, "Failed to create telemetry client: {}", e),
            CliError::Storage(e) => write!(f, "Failed to open storage: {}", e),
            CliError::Track(e) => write!(f, "{}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Telemetry(e) => Some(e),
            CliError::Storage(e) => Some(e),
            CliError::Track(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<TelemetryError> for CliError {
    fn from(e: TelemetryError) -> Self {
        CliError::Telemetry(e)
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        CliError::Storage(e)
    }
}

impl From<TrackError> for CliError {
    fn from(e: TrackError) -> Self {
        CliError::Track(e)
    }
}
