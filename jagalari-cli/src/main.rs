//! Jagalari CLI - Command-line interface
//!
//! This binary runs the Jagalari fleet map engine headless and provides
//! track and configuration utilities.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::run::RunArgs;
use commands::track::TrackCommands;

#[derive(Parser)]
#[command(name = "jagalari")]
#[command(version = jagalari::VERSION)]
#[command(about = "Live fleet map engine for Traccar", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the fleet and keep the map in step until Ctrl-C
    Run {
        /// Enable debug-level logging
        #[arg(long)]
        debug: bool,

        /// Draw a trail disc at each device's last position
        #[arg(long)]
        trails: bool,

        /// Load a GPX track at startup
        #[arg(long, value_name = "FILE")]
        track: Option<PathBuf>,

        /// Report the operator position from [location] in config.ini
        #[arg(long)]
        here: bool,
    },

    /// GPX track utilities
    Track {
        #[command(subcommand)]
        command: TrackCommands,
    },

    /// View and initialize configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            debug,
            trails,
            track,
            here,
        } => commands::run::run(RunArgs {
            debug,
            trails,
            track,
            here,
        }),
        Commands::Track { command } => commands::track::run(command),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
