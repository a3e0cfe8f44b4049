//! Run command - poll the fleet and keep a headless map in step until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use jagalari::location::StaticGeolocation;
use jagalari::map::HeadlessMapSurface;
use jagalari::session::{DashboardSession, SessionConfig, SessionStatus};
use jagalari::telemetry::TraccarClient;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the run command.
#[derive(Debug, Default)]
pub struct RunArgs {
    pub debug: bool,
    pub trails: bool,
    pub track: Option<PathBuf>,
    pub here: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(args.debug)?;
    runner.log_startup("run");
    let config = runner.config();

    let storage = runner.open_storage()?;
    let source = Arc::new(TraccarClient::new(config.traccar_config())?);
    let geolocation = Arc::new(StaticGeolocation::new(config.static_fix()));
    let session_config = SessionConfig {
        default_viewport: config.default_viewport(),
        ..Default::default()
    };

    if args.here && config.static_fix().is_none() {
        warn!("--here given but [location] latitude/longitude are not set");
    }

    info!(url = %config.telemetry.url, "Connecting to telemetry server");
    println!("Polling {} (Ctrl-C to stop)", config.telemetry.url);

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let status = runtime.block_on(async move {
        let mut session = DashboardSession::new(
            HeadlessMapSurface::new(),
            storage,
            geolocation,
            session_config,
        );

        let cancel = session.cancel_token();
        ctrlc::set_handler(move || {
            info!("Shutdown requested");
            cancel.cancel();
        })
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

        session.init();

        if args.trails {
            session.set_trails_enabled(true);
        }
        if let Some(path) = args.track {
            session.load_track_file(path);
        }
        if args.here {
            session.request_location();
        }
        session.start_polling(source);

        session.run().await;

        let status = session.status();
        session.dispose();
        Ok::<_, CliError>(status)
    })?;

    for line in summarize(&status) {
        println!("{line}");
    }
    Ok(())
}

/// Final report printed after shutdown.
fn summarize(status: &SessionStatus) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(banner) = status.auth_banner() {
        lines.push(format!("Warning: {banner}"));
    }
    if let Some(error) = &status.last_error {
        lines.push(format!("Last poll failed: {error}"));
    }

    let last_update = status
        .last_update
        .map(|t| t.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    lines.push(format!("Last update: {last_update}"));

    let stats = &status.stats;
    lines.push(format!(
        "Fleet: {} total, {} ambulance, {} motorbike, {} online, {} offline",
        stats.total, stats.ambulance, stats.motorbike, stats.online, stats.offline
    ));
    for device in &status.devices {
        let state = if device.online { "online" } else { "offline" };
        lines.push(format!("  {} {} ({})", device.glyph(), device.name, state));
    }

    let track = match &status.track_file {
        Some(name) => format!("{} [{}]", name, status.track.display_status()),
        None => status.track.display_status().to_string(),
    };
    lines.push(format!("Track: {track}"));
    lines.push(format!(
        "Trails: {}",
        if status.trails_enabled { "on" } else { "off" }
    ));

    match (&status.location, &status.location_error) {
        (_, Some(error)) => lines.push(format!("Location: {error}")),
        (Some(location), None) => lines.push(format!("Location: {location}")),
        (None, None) => {}
    }

    lines
}
