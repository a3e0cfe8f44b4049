//! Track CLI commands.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use jagalari::track::{self, is_track_file, TrackError, TrackGeometry};

use crate::error::CliError;

/// Track subcommands.
#[derive(Debug, Subcommand)]
pub enum TrackCommands {
    /// Validate and parse a GPX file without rendering it
    Check {
        /// Path to a .gpx file
        file: PathBuf,
    },
}

/// Run a track subcommand.
pub fn run(command: TrackCommands) -> Result<(), CliError> {
    match command {
        TrackCommands::Check { file } => run_check(&file),
    }
}

fn run_check(path: &Path) -> Result<(), CliError> {
    let geometry = check_file(path)?;
    for line in summarize(path, &geometry) {
        println!("{line}");
    }
    Ok(())
}

fn check_file(path: &Path) -> Result<TrackGeometry, TrackError> {
    if !is_track_file(path) {
        return Err(TrackError::NotGpxFile(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| TrackError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    track::validate(&content)?;
    track::parse(&content)
}

fn summarize(path: &Path, geometry: &TrackGeometry) -> Vec<String> {
    let bounds = geometry.bounds;
    vec![
        format!("File:      {}", path.display()),
        format!("Name:      {}", geometry.name.as_deref().unwrap_or("(unnamed)")),
        format!("Paths:     {}", geometry.paths.len()),
        format!("Waypoints: {}", geometry.waypoints.len()),
        format!("Points:    {}", geometry.point_count()),
        format!(
            "Bounds:    {:.5}..{:.5} lat, {:.5}..{:.5} lon",
            bounds.min_lat, bounds.max_lat, bounds.min_lon, bounds.max_lon
        ),
        format!("Center:    {}", bounds.center()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_rejects_other_extensions() {
        let result = check_file(Path::new("route.kml"));
        assert!(matches!(result, Err(TrackError::NotGpxFile(_))));
    }

    #[test]
    fn test_check_missing_file() {
        let result = check_file(Path::new("/nonexistent/jagalari/route.gpx"));
        assert!(matches!(result, Err(TrackError::Io { .. })));
    }
}
