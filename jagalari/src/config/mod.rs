//! Configuration loaded from `~/.jagalari/config.ini`.
//!
//! # Example
//!
//! ```no_run
//! use jagalari::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! println!("Polling {}", config.telemetry.url);
//! # Ok::<(), jagalari::config::ConfigFileError>(())
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, LocationSettings, LoggingSettings, MapSettings, StorageSettings,
    TelemetrySettings,
};
