//! Shared setup for commands that run the engine: config, logging, storage.

use tracing::info;

use jagalari::config::{ConfigFile, DEFAULT_LOG_FILE};
use jagalari::logging::{init_logging, LoggingGuard};
use jagalari::storage::FileStorage;

use crate::error::CliError;

/// Holds the loaded config and keeps the log writer alive.
pub struct CliRunner {
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load config.ini and start logging to the configured file and stdout.
    ///
    /// `debug_mode` raises the default level to debug; RUST_LOG still wins.
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| ".".into());
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

        let logging_guard = init_logging(&log_dir, &log_file, true, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(command, version = jagalari::VERSION, "Starting jagalari");
    }

    /// Open the session storage file named in the config.
    pub fn open_storage(&self) -> Result<FileStorage, CliError> {
        let storage = FileStorage::open(&self.config.storage.path)?;
        info!(path = %storage.path().display(), "Session storage opened");
        Ok(storage)
    }
}
