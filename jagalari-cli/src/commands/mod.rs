//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (path, init, show)
//! - [`run`] - Main command (poll the fleet and keep the map in step)
//! - [`track`] - GPX track utilities

pub mod config;
pub mod run;
pub mod track;
